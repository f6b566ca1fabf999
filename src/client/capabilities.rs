// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        config::StationConfig,
        mac::{EdcaParameterSet, McsSet, MgmtBody, ERP_OFDM_RATES},
    },
    std::time::Duration,
};

pub const SHORT_SLOT_TIME: Duration = Duration::from_micros(9);
pub const LONG_SLOT_TIME: Duration = Duration::from_micros(20);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentionWindow {
    pub min: u32,
    pub max: u32,
}

impl ContentionWindow {
    /// ERP-OFDM.
    pub const OFDM: Self = ContentionWindow { min: 15, max: 1023 };
    /// DSSS/HR-DSSS only BSS.
    pub const DSSS: Self = ContentionWindow { min: 31, max: 1023 };
}

/// Operating parameters negotiated with the current BSS.
#[derive(Clone, Debug, PartialEq)]
pub struct BssCapabilities {
    /// Rates supported by both sides, in units of 500 kb/s.
    pub rates: Vec<u8>,
    pub basic_rates: Vec<u8>,
    pub short_preamble: bool,
    pub short_slot_time: bool,
    pub slot_time: Duration,
    pub contention_window: ContentionWindow,
    pub non_erp_protection: bool,
    pub qos: bool,
    pub edca: Option<EdcaParameterSet>,
    pub ht_mcs: McsSet,
    pub greenfield_protection: bool,
    pub rifs_permitted: bool,
    pub vht_mcs: McsSet,
    pub he_mcs: McsSet,
}

impl Default for BssCapabilities {
    fn default() -> Self {
        BssCapabilities {
            rates: vec![],
            basic_rates: vec![],
            short_preamble: false,
            short_slot_time: false,
            slot_time: LONG_SLOT_TIME,
            contention_window: ContentionWindow::OFDM,
            non_erp_protection: false,
            qos: false,
            edca: None,
            ht_mcs: McsSet::default(),
            greenfield_protection: false,
            rifs_permitted: false,
            vht_mcs: McsSet::default(),
            he_mcs: McsSet::default(),
        }
    }
}

impl BssCapabilities {
    /// Takes the BSS's operating parameters from a beacon.
    pub fn adopt_beacon(&mut self, body: &MgmtBody, config: &StationConfig) {
        self.rates = common_rates(body, config);
        let mut short_preamble = body.capabilities.short_preamble();
        if config.erp_supported {
            let erp = body.erp.unwrap_or_default();
            short_preamble &= !erp.barker_preamble_mode();
            self.non_erp_protection = erp.use_protection();
            self.slot_time =
                if body.capabilities.short_slot_time() { SHORT_SLOT_TIME } else { LONG_SLOT_TIME };
        }
        self.adopt_qos(body, config);
        self.adopt_ht_vht_he(body, config);
        self.short_preamble = short_preamble && config.short_preamble_supported;
        self.short_slot_time =
            body.capabilities.short_slot_time() && config.short_slot_time_supported;
    }

    /// Takes the parameters of the BSS answering our probe request. Unlike a beacon, the slot
    /// time and contention window follow the rates the BSS offers.
    pub fn adopt_probe_response(&mut self, body: &MgmtBody, config: &StationConfig) {
        self.adopt_rates_and_timing(body, config);
        self.adopt_qos(body, config);
        self.adopt_ht_vht_he(body, config);
    }

    /// Takes the parameters granted in a successful (re)association response.
    pub fn adopt_assoc_response(&mut self, body: &MgmtBody, config: &StationConfig) {
        self.adopt_rates_and_timing(body, config);
        self.adopt_qos(body, config);
        self.adopt_ht_vht_he(body, config);
    }

    fn adopt_rates_and_timing(&mut self, body: &MgmtBody, config: &StationConfig) {
        let mut short_preamble = body.capabilities.short_preamble();
        if config.erp_supported {
            let erp_allowed = ERP_OFDM_RATES.iter().any(|r| body.rates.is_supported_rate(*r));
            if !erp_allowed {
                self.slot_time = LONG_SLOT_TIME;
                self.contention_window = ContentionWindow::DSSS;
            } else {
                let erp = body.erp.unwrap_or_default();
                short_preamble &= !erp.barker_preamble_mode();
                // Slot time follows the short slot setting in force before this frame.
                self.slot_time = if self.short_slot_time { SHORT_SLOT_TIME } else { LONG_SLOT_TIME };
                self.contention_window = ContentionWindow::OFDM;
            }
        }
        self.short_preamble = short_preamble && config.short_preamble_supported;
        self.short_slot_time =
            body.capabilities.short_slot_time() && config.short_slot_time_supported;
        self.rates = common_rates(body, config);
        self.basic_rates =
            self.rates.iter().copied().filter(|r| body.rates.is_basic_rate(*r)).collect();
    }

    fn adopt_qos(&mut self, body: &MgmtBody, config: &StationConfig) {
        if !config.qos_supported {
            return;
        }
        self.qos = body.edca.is_some();
        self.edca = body.edca;
    }

    fn adopt_ht_vht_he(&mut self, body: &MgmtBody, config: &StationConfig) {
        if config.ht_supported {
            let ht_cap = body.ht_cap.unwrap_or_default();
            if !ht_cap.rx_mcs.contains(0) {
                self.ht_mcs = McsSet::default();
            } else {
                let ours = McsSet::from_indices(config.ht_mcs.iter().copied());
                self.ht_mcs = ours.intersection(&ht_cap.rx_mcs);
                let ht_op = body.ht_op.unwrap_or_default();
                self.greenfield_protection = ht_op.non_gf_ht_stas_present;
                self.rifs_permitted = !config.vht_supported && ht_op.rifs_mode;
            }
        }
        if config.vht_supported {
            let vht_cap = body.vht_cap.unwrap_or_default();
            // The highest long-GI rate is always filled in by VHT peers.
            if vht_cap.rx_highest_lgi_data_rate > 0 {
                let ours = McsSet::from_indices(config.vht_mcs.iter().copied());
                self.vht_mcs = ours.intersection(&vht_cap.rx_mcs);
            }
        }
        if config.he_supported {
            let he_cap = body.he_cap.unwrap_or_default();
            let ours = McsSet::from_indices(config.he_mcs.iter().copied());
            self.he_mcs = ours.intersection(&he_cap.rx_mcs);
        }
    }
}

fn common_rates(body: &MgmtBody, config: &StationConfig) -> Vec<u8> {
    config.supported_rates.iter().copied().filter(|r| body.rates.is_supported_rate(*r)).collect()
}
