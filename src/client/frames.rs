// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    config::StationConfig,
    mac::{
        CapabilityInfo, ExtCapabilities, FrameHeader, FrameKind, HeCapabilities, HtCapabilities,
        McsSet, ReasonCode, SupportedRates, VhtCapabilities, BCAST_ADDR, HT_PHY_SELECTOR,
        HE_PHY_SELECTOR, VHT_PHY_SELECTOR,
    },
    MacAddr, Ssid,
};

/// Highest traffic identifier of a user priority.
const MAX_TID: u8 = 7;

/// Elements a station advertises about its own PHY.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PhyElements {
    pub ext_cap: Option<ExtCapabilities>,
    pub ht_cap: Option<HtCapabilities>,
    pub vht_cap: Option<VhtCapabilities>,
    pub he_cap: Option<HeCapabilities>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProbeRequest {
    pub ssid: Ssid,
    pub rates: SupportedRates,
    pub phy: PhyElements,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssocRequest {
    pub ssid: Ssid,
    pub rates: SupportedRates,
    pub capabilities: CapabilityInfo,
    pub listen_interval: u16,
    /// Set for reassociation requests.
    pub current_ap: Option<MacAddr>,
    pub phy: PhyElements,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FrameBody {
    ProbeRequest(ProbeRequest),
    AssocRequest(AssocRequest),
    Disassociation { reason_code: ReasonCode },
    Data { tid: Option<u8>, payload: Vec<u8> },
}

/// A frame the station asks the lower layer to transmit.
#[derive(Clone, Debug, PartialEq)]
pub struct OutgoingFrame {
    pub hdr: FrameHeader,
    pub body: FrameBody,
}

fn mgmt_hdr_to_ap(kind: FrameKind, bssid: MacAddr, client_addr: MacAddr) -> FrameHeader {
    FrameHeader { kind, addr1: bssid, addr2: client_addr, addr3: bssid, to_ds: false, from_ds: false }
}

fn data_hdr_client_to_ap(
    kind: FrameKind,
    bssid: MacAddr,
    client_addr: MacAddr,
    dst: MacAddr,
) -> FrameHeader {
    FrameHeader { kind, addr1: bssid, addr2: client_addr, addr3: dst, to_ds: true, from_ds: false }
}

fn own_rates(config: &StationConfig) -> SupportedRates {
    let mut rates = config.rates();
    if config.ht_supported {
        rates.add_membership_selector(HT_PHY_SELECTOR);
    }
    if config.vht_supported {
        rates.add_membership_selector(VHT_PHY_SELECTOR);
    }
    if config.he_supported {
        rates.add_membership_selector(HE_PHY_SELECTOR);
    }
    rates
}

fn own_phy_elements(config: &StationConfig) -> PhyElements {
    let mut phy = PhyElements::default();
    // Extended and HT capabilities go out with every HT, VHT or HE capable request.
    if config.ht_supported || config.vht_supported || config.he_supported {
        phy.ext_cap = Some(ExtCapabilities::default());
        phy.ht_cap = Some(HtCapabilities {
            rx_mcs: McsSet::from_indices(config.ht_mcs.iter().copied()),
            ..Default::default()
        });
    }
    if config.vht_supported || config.he_supported {
        phy.vht_cap = Some(VhtCapabilities {
            rx_highest_lgi_data_rate: 1,
            rx_mcs: McsSet::from_indices(config.vht_mcs.iter().copied()),
        });
    }
    if config.he_supported {
        phy.he_cap =
            Some(HeCapabilities { rx_mcs: McsSet::from_indices(config.he_mcs.iter().copied()) });
    }
    phy
}

fn own_capabilities(config: &StationConfig) -> CapabilityInfo {
    let mut cap = CapabilityInfo::default();
    cap.set_short_preamble(config.short_preamble_supported);
    cap.set_short_slot_time(config.short_slot_time_supported);
    cap.set_qos(config.qos_supported);
    cap
}

pub fn probe_request(client_addr: MacAddr, ssid: &Ssid, config: &StationConfig) -> OutgoingFrame {
    OutgoingFrame {
        hdr: FrameHeader {
            kind: FrameKind::ProbeRequest,
            addr1: BCAST_ADDR,
            addr2: client_addr,
            addr3: BCAST_ADDR,
            to_ds: false,
            from_ds: false,
        },
        body: FrameBody::ProbeRequest(ProbeRequest {
            ssid: ssid.clone(),
            rates: own_rates(config),
            phy: own_phy_elements(config),
        }),
    }
}

/// Builds an association request, or a reassociation request when `current_ap` is set.
pub fn assoc_request(
    bssid: MacAddr,
    client_addr: MacAddr,
    ssid: &Ssid,
    current_ap: Option<MacAddr>,
    config: &StationConfig,
) -> OutgoingFrame {
    let kind = match current_ap {
        Some(_) => FrameKind::ReassocRequest,
        None => FrameKind::AssocRequest,
    };
    OutgoingFrame {
        hdr: mgmt_hdr_to_ap(kind, bssid, client_addr),
        body: FrameBody::AssocRequest(AssocRequest {
            ssid: ssid.clone(),
            rates: own_rates(config),
            capabilities: own_capabilities(config),
            listen_interval: 0,
            current_ap,
            phy: own_phy_elements(config),
        }),
    }
}

pub fn disassociation(bssid: MacAddr, client_addr: MacAddr) -> OutgoingFrame {
    OutgoingFrame {
        hdr: mgmt_hdr_to_ap(FrameKind::Disassociation, bssid, client_addr),
        body: FrameBody::Disassociation { reason_code: ReasonCode::LEAVING_NETWORK_DISASSOC },
    }
}

/// Builds a data frame to the AP. A QoS data frame is used when `qos` is set; out of range TIDs
/// fall back to best effort.
pub fn data_frame(
    bssid: MacAddr,
    client_addr: MacAddr,
    dst: MacAddr,
    payload: Vec<u8>,
    qos: bool,
    tid: u8,
) -> OutgoingFrame {
    let (kind, tid) = if qos {
        (FrameKind::QosData, Some(if tid > MAX_TID { 0 } else { tid }))
    } else {
        (FrameKind::Data, None)
    };
    OutgoingFrame {
        hdr: data_hdr_client_to_ap(kind, bssid, client_addr, dst),
        body: FrameBody::Data { tid, payload },
    }
}
