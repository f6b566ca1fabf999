// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{error::Error, mac::SupportedRates, Ssid},
    anyhow::Context as _,
    serde::{Deserialize, Serialize},
    std::{fs, io, path::Path, time::Duration},
};

/// Static configuration of a client station. Loaded once, validated, then handed to
/// `Station::new`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationConfig {
    /// SSID to join. Empty joins any network.
    pub ssid: String,
    pub active_probing: bool,
    pub probe_request_timeout_ms: u64,
    pub assoc_request_timeout_ms: u64,
    /// Number of beacon intervals without a beacon after which the BSS is considered lost.
    pub max_missed_beacons: u32,
    /// In units of 500 kb/s.
    pub supported_rates: Vec<u8>,
    pub basic_rates: Vec<u8>,
    /// BSS membership selectors the AP has to advertise for the station to join it.
    pub bss_membership_selectors: Vec<u8>,
    pub erp_supported: bool,
    pub qos_supported: bool,
    pub ht_supported: bool,
    pub vht_supported: bool,
    pub he_supported: bool,
    pub short_preamble_supported: bool,
    pub short_slot_time_supported: bool,
    pub ht_mcs: Vec<u8>,
    pub vht_mcs: Vec<u8>,
    pub he_mcs: Vec<u8>,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            ssid: String::new(),
            active_probing: false,
            probe_request_timeout_ms: 50,
            assoc_request_timeout_ms: 500,
            max_missed_beacons: 10,
            supported_rates: vec![12, 18, 24, 36, 48, 72, 96, 108],
            basic_rates: vec![12, 24, 48],
            bss_membership_selectors: vec![],
            erp_supported: false,
            qos_supported: false,
            ht_supported: false,
            vht_supported: false,
            he_supported: false,
            short_preamble_supported: false,
            short_slot_time_supported: false,
            ht_mcs: (0..=7).collect(),
            vht_mcs: (0..=9).collect(),
            he_mcs: (0..=11).collect(),
        }
    }
}

impl StationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let config: StationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let file = fs::File::open(path)
            .with_context(|| format!("could not open the config file {}", path.display()))?;
        let config: StationConfig = serde_json::from_reader(io::BufReader::new(file))
            .with_context(|| format!("could not deserialize the config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.probe_request_timeout_ms == 0 || self.assoc_request_timeout_ms == 0 {
            return Err(Error::InvalidConfig("request timeouts must be non-zero".to_string()));
        }
        if self.max_missed_beacons == 0 {
            return Err(Error::InvalidConfig("max_missed_beacons is 0".to_string()));
        }
        if self.supported_rates.is_empty() {
            return Err(Error::InvalidConfig("no supported rates".to_string()));
        }
        if let Some(r) = self
            .supported_rates
            .iter()
            .chain(self.bss_membership_selectors.iter())
            .find(|r| **r == 0 || **r > 127)
        {
            return Err(Error::InvalidConfig(format!("rate {} out of range", r)));
        }
        if let Some(r) = self.basic_rates.iter().find(|r| !self.supported_rates.contains(r)) {
            return Err(Error::InvalidConfig(format!("basic rate {} is not supported", r)));
        }
        if (self.vht_supported || self.he_supported) && !self.ht_supported {
            return Err(Error::InvalidConfig("VHT and HE require HT".to_string()));
        }
        Ok(())
    }

    pub fn ssid(&self) -> Ssid {
        self.ssid.as_bytes().to_vec()
    }

    pub fn probe_request_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_request_timeout_ms)
    }

    pub fn assoc_request_timeout(&self) -> Duration {
        Duration::from_millis(self.assoc_request_timeout_ms)
    }

    /// Own rate set as advertised in probe and association requests.
    pub fn rates(&self) -> SupportedRates {
        SupportedRates::from_rates(&self.supported_rates, &self.basic_rates)
    }
}
