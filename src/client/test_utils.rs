// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Frame fixtures for station tests.

use crate::{
    mac::{FrameKind, RxFrame, StatusCode, SupportedRates, TimeUnit, BCAST_ADDR},
    MacAddr,
};

pub const STA_ADDR: MacAddr = [0x02, 0x11, 0x11, 0x11, 0x11, 0x11];
pub const AP_A: MacAddr = [0x02, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa];
pub const AP_B: MacAddr = [0x02, 0xbb, 0xbb, 0xbb, 0xbb, 0xbb];
pub const REMOTE_ADDR: MacAddr = [0x02, 0x99, 0x99, 0x99, 0x99, 0x99];

fn ap_rates() -> SupportedRates {
    SupportedRates::from_rates(&[12, 18, 24, 36, 48, 72, 96, 108], &[12, 24, 48])
}

pub fn beacon(bssid: MacAddr, ssid: &[u8]) -> RxFrame {
    let mut frame = RxFrame::mgmt(FrameKind::Beacon, BCAST_ADDR, bssid, bssid);
    frame.body.ssid = ssid.to_vec();
    frame.body.beacon_interval = TimeUnit::DEFAULT_BEACON_INTERVAL;
    frame.body.capabilities.set_ess(true);
    frame.body.rates = ap_rates();
    frame
}

pub fn probe_response(bssid: MacAddr, ssid: &[u8]) -> RxFrame {
    let mut frame = beacon(bssid, ssid);
    frame.hdr.kind = FrameKind::ProbeResponse;
    frame.hdr.addr1 = STA_ADDR;
    frame
}

pub fn assoc_response(bssid: MacAddr, status_code: StatusCode) -> RxFrame {
    let mut frame = RxFrame::mgmt(FrameKind::AssocResponse, STA_ADDR, bssid, bssid);
    frame.body.status_code = status_code;
    frame.body.capabilities.set_ess(true);
    frame.body.rates = ap_rates();
    frame
}

/// A data frame relayed by `bssid` from `REMOTE_ADDR` to the station.
pub fn data_from_ap(bssid: MacAddr, payload: Vec<u8>) -> RxFrame {
    let mut frame = RxFrame::mgmt(FrameKind::Data, STA_ADDR, bssid, REMOTE_ADDR);
    frame.hdr.from_ds = true;
    frame.payload = payload;
    frame
}
