// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        link::{
            LinkDetectedInfo, LinkDownIndication, LinkDownReason, LinkIdentifier, LinkType,
            LinkUpIndication, MihCapabilityFlags, MihfId, MobilityManagementSupport,
            NetworkCapabilities,
        },
        mac::{QualityTag, QualityTagKind, RxFrame},
        MacAddr,
    },
    log::debug,
};

pub type LinkDetectedFn = Box<dyn FnMut(&MihfId, LinkDetectedInfo) -> bool>;
pub type LinkUpFn = Box<dyn FnMut(LinkUpIndication)>;
pub type LinkDownFn = Box<dyn FnMut(LinkDownIndication)>;
pub type LinkLostFn = Box<dyn FnMut(MacAddr)>;

/// Routes the station's link notifications to whoever registered for them. Every notification is
/// optional; an unregistered one is silently skipped.
#[derive(Default)]
pub struct HandoverBridge {
    link_detected: Option<(MihfId, LinkDetectedFn)>,
    link_up: Option<LinkUpFn>,
    link_down: Option<LinkDownFn>,
    link_lost: Option<LinkLostFn>,
}

impl HandoverBridge {
    pub fn set_link_detected(&mut self, source: MihfId, callback: LinkDetectedFn) {
        self.link_detected = Some((source, callback));
    }

    pub fn set_link_up(&mut self, callback: LinkUpFn) {
        self.link_up = Some(callback);
    }

    pub fn set_link_down(&mut self, callback: LinkDownFn) {
        self.link_down = Some(callback);
    }

    pub fn set_link_lost(&mut self, callback: LinkLostFn) {
        self.link_lost = Some(callback);
    }

    /// Reports the link advertised by `frame` and returns whether the station should switch to
    /// it, or `None` if nobody listens. The signal strength and station count tags are consumed.
    pub fn link_detected(&mut self, own_addr: MacAddr, frame: &mut RxFrame) -> Option<bool> {
        let (source, callback) = self.link_detected.as_mut()?;
        let info = detected_info(own_addr, frame);
        Some(callback(source, info))
    }

    pub fn link_up(&mut self, own_addr: MacAddr, ap: MacAddr, previous_ap: Option<MacAddr>) {
        let callback = match self.link_up.as_mut() {
            Some(callback) => callback,
            None => return,
        };
        debug!("link up towards {:02x?}", ap);
        callback(LinkUpIndication {
            link_id: LinkIdentifier::new(LinkType::Wireless80211, own_addr, ap),
            old_access_router: previous_ap.filter(|previous| *previous != ap),
            new_access_router: ap,
            ip_renewal: true,
            mobility_support: MobilityManagementSupport::MOBILE_IPV4_RFC3344,
        });
    }

    pub fn link_down(&mut self, own_addr: MacAddr, bssid: MacAddr) {
        let callback = match self.link_down.as_mut() {
            Some(callback) => callback,
            None => return,
        };
        debug!("link down from {:02x?}", bssid);
        callback(LinkDownIndication {
            link_id: LinkIdentifier::new(LinkType::Wireless80211, own_addr, bssid),
            old_access_router: bssid,
            reason: LinkDownReason::NoBroadcast,
        });
    }

    /// Unlike `link_down`, which is reported once until the next association, this fires on
    /// every loss of the BSS so listeners can start a fresh candidate search.
    pub fn link_lost(&mut self, bssid: MacAddr) {
        if let Some(callback) = self.link_lost.as_mut() {
            callback(bssid);
        }
    }
}

fn detected_info(own_addr: MacAddr, frame: &mut RxFrame) -> LinkDetectedInfo {
    let signal_strength = match frame.tags.remove(QualityTagKind::SignalStrength) {
        Some(QualityTag::SignalStrength(signal)) => signal,
        _ => 0.0,
    };
    let station_count = match frame.tags.remove(QualityTagKind::StationCount) {
        Some(QualityTag::StationCount(count)) => count,
        _ => 0,
    };
    let snr = frame.tags.snr().unwrap_or(0.0);

    let mut network_capabilities = NetworkCapabilities::empty();
    if frame.body.capabilities.privacy() {
        network_capabilities |= NetworkCapabilities::SECURITY;
    }
    if frame.body.capabilities.qos() {
        network_capabilities |= NetworkCapabilities::QOS_CLASS_0;
    }

    LinkDetectedInfo {
        link_id: LinkIdentifier::new(LinkType::Wireless80211, own_addr, frame.hdr.addr2),
        network_id: String::from_utf8_lossy(&frame.body.ssid).into_owned(),
        network_aux_id: String::new(),
        signal_strength,
        snr,
        supported_rates: frame.body.rates.clone(),
        mih_capabilities: MihCapabilityFlags::empty(),
        network_capabilities,
        station_count,
    }
}
