// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{
        CapabilityDiscoverConfirm, CommandList, DeviceInformation, EventList, LinkDetectedInfo,
        LinkDownIndication, LinkEvent, LinkIdentifier, LinkQualityTracker, LinkSap, LinkType,
        LinkUpIndication, MihfId, Status,
    },
    crate::{mac::NULL_ADDR, sink::LinkEventSink, LinkEventStream, MacAddr},
    futures::channel::mpsc,
    log::{debug, info},
};

/// Link SAP of an 802.11 station interface. Detected links are ranked by a
/// `LinkQualityTracker`; every notification is forwarded on the returned `LinkEventStream`.
pub struct WifiLinkSap {
    link_id: LinkIdentifier,
    mihf_id: MihfId,
    tracker: LinkQualityTracker,
    events: LinkEventSink,
}

impl WifiLinkSap {
    pub fn new(mihf_id: MihfId) -> (Self, LinkEventStream) {
        let (sender, receiver) = mpsc::unbounded();
        let sap = WifiLinkSap {
            link_id: LinkIdentifier::new(LinkType::Wireless80211, NULL_ADDR, NULL_ADDR),
            mihf_id,
            tracker: LinkQualityTracker::default(),
            events: LinkEventSink::new(sender),
        };
        (sap, receiver)
    }

    pub fn tracker(&self) -> &LinkQualityTracker {
        &self.tracker
    }
}

impl LinkSap for WifiLinkSap {
    fn link_identifier(&self) -> LinkIdentifier {
        self.link_id
    }

    fn set_link_identifier(&mut self, link_id: LinkIdentifier) {
        self.link_id = link_id;
    }

    fn mihf_id(&self) -> &MihfId {
        &self.mihf_id
    }

    fn set_mihf_id(&mut self, mihf_id: MihfId) {
        self.mihf_id = mihf_id;
    }

    fn capability_discover(&self) -> CapabilityDiscoverConfirm {
        CapabilityDiscoverConfirm {
            status: Status::Success,
            events: EventList::LINK_DETECTED
                | EventList::LINK_UP
                | EventList::LINK_DOWN
                | EventList::LINK_PARAMETERS_REPORT,
            commands: CommandList::LINK_GET_PARAMETERS | CommandList::LINK_CONFIGURE_THRESHOLDS,
        }
    }

    fn device_states(&self) -> DeviceInformation {
        DeviceInformation { info: "OEM = wlan-handover".to_string() }
    }

    fn link_detected(&mut self, source: &MihfId, info: LinkDetectedInfo) -> bool {
        let accepted = self.tracker.accept(info.signal_strength, info.station_count);
        info!(
            "link detected by {}: poa {:02x?}, {} dBm, {} stations, accepted: {}",
            source, info.link_id.poa_addr, info.signal_strength, info.station_count, accepted
        );
        self.events.send(LinkEvent::Detected { source: source.clone(), info, accepted });
        accepted
    }

    fn link_up(&mut self, indication: LinkUpIndication) {
        info!("link up: poa {:02x?}", indication.new_access_router);
        self.link_id = indication.link_id;
        self.link_id.poa_addr = indication.new_access_router;
        self.events.send(LinkEvent::Up(indication));
    }

    fn link_down(&mut self, indication: LinkDownIndication) {
        info!(
            "link down: poa {:02x?}, reason {:?}",
            indication.old_access_router, indication.reason
        );
        self.link_id.poa_addr = NULL_ADDR;
        // Candidates seen after a loss are ranked afresh.
        self.tracker.reset();
        self.events.send(LinkEvent::Down(indication));
    }

    fn link_lost(&mut self, poa_addr: MacAddr) {
        debug!("lost {:02x?}, restarting candidate ranking", poa_addr);
        self.tracker.reset();
    }
}
