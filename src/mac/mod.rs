// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Frames as handed over by the lower layer's codec. Headers and elements are already decoded;
//! only the fields the association machine acts upon are modeled.

mod fields;
mod tags;

pub use {fields::*, tags::*};

use crate::{MacAddr, Ssid};

pub const BCAST_ADDR: MacAddr = [0xFF; 6];
pub const NULL_ADDR: MacAddr = [0; 6];

pub fn is_group_addr(addr: &MacAddr) -> bool {
    addr[0] & 0x01 != 0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Beacon,
    ProbeRequest,
    ProbeResponse,
    AssocRequest,
    ReassocRequest,
    AssocResponse,
    ReassocResponse,
    Disassociation,
    Data,
    QosData,
    Action,
}

// IEEE Std 802.11-2016, 9.2.3
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub kind: FrameKind,
    /// Receiver.
    pub addr1: MacAddr,
    /// Transmitter.
    pub addr2: MacAddr,
    /// BSSID for management frames; source or destination for data frames, depending on the DS
    /// bits.
    pub addr3: MacAddr,
    pub to_ds: bool,
    pub from_ds: bool,
}

/// Decoded fixed fields and elements of a management frame body. Elements absent from the frame
/// are `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MgmtBody {
    pub ssid: Ssid,
    pub beacon_interval: TimeUnit,
    pub capabilities: CapabilityInfo,
    pub rates: SupportedRates,
    pub status_code: StatusCode,
    pub erp: Option<ErpInformation>,
    pub edca: Option<EdcaParameterSet>,
    pub ext_cap: Option<ExtCapabilities>,
    pub ht_cap: Option<HtCapabilities>,
    pub ht_op: Option<HtOperation>,
    pub vht_cap: Option<VhtCapabilities>,
    pub he_cap: Option<HeCapabilities>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RxFrame {
    pub hdr: FrameHeader,
    pub body: MgmtBody,
    pub tags: QualityTags,
    /// MSDU payload of data frames.
    pub payload: Vec<u8>,
}

impl RxFrame {
    pub fn mgmt(kind: FrameKind, addr1: MacAddr, addr2: MacAddr, addr3: MacAddr) -> Self {
        RxFrame {
            hdr: FrameHeader { kind, addr1, addr2, addr3, to_ds: false, from_ds: false },
            body: MgmtBody::default(),
            tags: QualityTags::default(),
            payload: vec![],
        }
    }
}
