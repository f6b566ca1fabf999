// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {bitfield::bitfield, std::time::Duration};

macro_rules! pub_const {
    ($name:ident, $val:expr) => {
        pub const $name: Self = Self($val);
    };
}

// IEEE Std 802.11-2016, 9.4.1.4
bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct CapabilityInfo(u16);
    impl Debug;
    bool;
    pub ess, set_ess: 0;
    pub ibss, set_ibss: 1;
    pub cf_pollable, set_cf_pollable: 2;
    pub cf_poll_req, set_cf_poll_req: 3;
    pub privacy, set_privacy: 4;
    pub short_preamble, set_short_preamble: 5;
    // 6-7 reserved
    pub spectrum_mgmt, set_spectrum_mgmt: 8;
    pub qos, set_qos: 9;
    pub short_slot_time, set_short_slot_time: 10;
    pub apsd, set_apsd: 11;
    pub radio_measurement, set_radio_measurement: 12;
    // 13 reserved
    pub delayed_block_ack, set_delayed_block_ack: 14;
    pub immediate_block_ack, set_immediate_block_ack: 15;
}

impl CapabilityInfo {
    pub fn raw(&self) -> u16 {
        self.0
    }
}

// IEEE Std 802.11-2016, 9.4.2.3
bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SupportedRate(u8);
    impl Debug;
    bool;
    pub u8, rate, set_rate: 6, 0;
    pub basic, set_basic: 7;
}

impl SupportedRate {
    /// `rate` is in units of 500 kb/s.
    pub fn new(rate: u8, basic: bool) -> Self {
        let mut r = SupportedRate(0);
        r.set_rate(rate);
        r.set_basic(basic);
        r
    }
}

// IEEE Std 802.11-2016, Table 9-78. Selectors share the encoding of basic rates.
pub const HT_PHY_SELECTOR: u8 = 127;
pub const VHT_PHY_SELECTOR: u8 = 126;
// IEEE Std 802.11ax-2021, 9.4.2.3
pub const HE_PHY_SELECTOR: u8 = 122;

/// The ERP-OFDM rates, in units of 500 kb/s.
pub const ERP_OFDM_RATES: [u8; 8] = [12, 18, 24, 36, 48, 72, 96, 108];

/// A Supported Rates (plus Extended Supported Rates) element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SupportedRates(pub Vec<SupportedRate>);

impl SupportedRates {
    /// Builds a rate set from plain rates, marking the ones listed in `basic`.
    pub fn from_rates(rates: &[u8], basic: &[u8]) -> Self {
        SupportedRates(rates.iter().map(|r| SupportedRate::new(*r, basic.contains(r))).collect())
    }

    /// Appends a BSS membership selector. Selectors always carry the basic bit.
    pub fn add_membership_selector(&mut self, selector: u8) {
        self.0.push(SupportedRate::new(selector, true));
    }

    pub fn is_supported_rate(&self, rate: u8) -> bool {
        self.0.iter().any(|r| r.rate() == rate)
    }

    pub fn is_basic_rate(&self, rate: u8) -> bool {
        self.0.iter().any(|r| r.rate() == rate && r.basic())
    }

    pub fn is_membership_selector(&self, selector: u8) -> bool {
        self.is_basic_rate(selector)
    }

    /// Rates in units of 500 kb/s, BSS membership selectors excluded.
    pub fn rates<'a>(&'a self) -> impl Iterator<Item = u8> + 'a {
        self.0.iter().map(|r| r.rate()).filter(|r| !is_membership_selector_value(*r))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_membership_selector_value(rate: u8) -> bool {
    match rate {
        HT_PHY_SELECTOR | VHT_PHY_SELECTOR | HE_PHY_SELECTOR => true,
        _ => false,
    }
}

// IEEE Std 802.11-2016, 9.4.2.11
bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct ErpInformation(u8);
    impl Debug;
    bool;
    pub non_erp_present, set_non_erp_present: 0;
    pub use_protection, set_use_protection: 1;
    pub barker_preamble_mode, set_barker_preamble_mode: 2;
    // 3-7 reserved
}

// IEEE Std 802.11-2016, 9.4.2.27
bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExtCapabilities(u64);
    impl Debug;
    bool;
    pub bss_coexistence_mgmt, set_bss_coexistence_mgmt: 0;
    pub bss_transition, set_bss_transition: 19;
    pub interworking, set_interworking: 31;
}

/// Set of MCS indices, bit `n` meaning MCS `n` is supported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct McsSet(pub u128);

impl McsSet {
    pub fn from_indices<I: IntoIterator<Item = u8>>(indices: I) -> Self {
        let mut set = McsSet(0);
        for i in indices {
            set.insert(i);
        }
        set
    }

    pub fn insert(&mut self, mcs: u8) {
        if mcs < 128 {
            self.0 |= 1u128 << mcs;
        }
    }

    pub fn contains(&self, mcs: u8) -> bool {
        mcs < 128 && self.0 & (1u128 << mcs) != 0
    }

    pub fn intersection(&self, other: &McsSet) -> McsSet {
        McsSet(self.0 & other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> {
        let bits = self.0;
        (0..128u8).filter(move |i| bits & (1u128 << *i) != 0)
    }
}

// IEEE Std 802.11-2016, 9.4.2.56
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HtCapabilities {
    pub greenfield: bool,
    pub short_gi_20: bool,
    pub short_gi_40: bool,
    pub rx_mcs: McsSet,
}

// IEEE Std 802.11-2016, 9.4.2.57
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HtOperation {
    pub primary_channel: u8,
    pub rifs_mode: bool,
    pub non_gf_ht_stas_present: bool,
}

// IEEE Std 802.11-2016, 9.4.2.158
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VhtCapabilities {
    /// In Mb/s. Zero means the peer did not advertise a usable VHT rate.
    pub rx_highest_lgi_data_rate: u16,
    pub rx_mcs: McsSet,
}

// IEEE Std 802.11ax-2021, 9.4.2.248
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeCapabilities {
    pub rx_mcs: McsSet,
}

// IEEE Std 802.11-2016, 9.4.2.29
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdcaAcParameters {
    pub aifsn: u8,
    pub ecw_min: u8,
    pub ecw_max: u8,
    /// In units of 32 microseconds.
    pub txop_limit: u16,
}

impl EdcaAcParameters {
    pub fn cw_min(&self) -> u32 {
        (1u32 << (self.ecw_min & 0x0f)) - 1
    }

    pub fn cw_max(&self) -> u32 {
        (1u32 << (self.ecw_max & 0x0f)) - 1
    }

    pub fn txop_duration(&self) -> Duration {
        Duration::from_micros(self.txop_limit as u64 * 32)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdcaParameterSet {
    pub ac_be: EdcaAcParameters,
    pub ac_bk: EdcaAcParameters,
    pub ac_vi: EdcaAcParameters,
    pub ac_vo: EdcaAcParameters,
}

/// IEEE Std 802.11-2016, 9.4.1.9, Table 9-46
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub_const!(SUCCESS, 0);
    pub_const!(REFUSED, 1);
    pub_const!(REFUSED_CAPABILITIES_MISMATCH, 10);
    pub_const!(DENIED_NO_MORE_STAS, 17);
    pub_const!(REFUSED_BASIC_RATES_MISMATCH, 18);

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

/// IEEE Std 802.11-2016, 9.4.1.7, Table 9-45
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ReasonCode(pub u16);

impl ReasonCode {
    pub_const!(UNSPECIFIED_REASON, 1);
    pub_const!(LEAVING_NETWORK_DEAUTH, 3);
    pub_const!(REASON_INACTIVITY, 4);
    pub_const!(LEAVING_NETWORK_DISASSOC, 8);
}

/// A beacon interval unit: 1024 microseconds.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct TimeUnit(pub u16);

impl TimeUnit {
    pub const DEFAULT_BEACON_INTERVAL: Self = TimeUnit(100);
}

impl From<TimeUnit> for Duration {
    fn from(tu: TimeUnit) -> Duration {
        Duration::from_micros(tu.0 as u64 * 1024)
    }
}
