// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{
        CapabilityDiscoverConfirm, CommandList, DeviceInformation, EventList, LinkDetectedInfo,
        LinkDownIndication, LinkEvent, LinkIdentifier, LinkSap, LinkType, LinkUpIndication,
        MihfId, Status,
    },
    crate::{mac::NULL_ADDR, sink::LinkEventSink, LinkEventStream, MacAddr},
    futures::channel::mpsc,
    log::{info, warn},
};

/// Link SAP of a wired interface. There is nothing to scan for, so detected links are never
/// taken.
pub struct EthernetLinkSap {
    link_id: LinkIdentifier,
    mihf_id: MihfId,
    events: LinkEventSink,
}

impl EthernetLinkSap {
    pub fn new(link_addr: MacAddr, mihf_id: MihfId) -> (Self, LinkEventStream) {
        let (sender, receiver) = mpsc::unbounded();
        let sap = EthernetLinkSap {
            link_id: LinkIdentifier::new(LinkType::Ethernet, link_addr, NULL_ADDR),
            mihf_id,
            events: LinkEventSink::new(sender),
        };
        (sap, receiver)
    }
}

impl LinkSap for EthernetLinkSap {
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
            events: EventList::LINK_UP | EventList::LINK_DOWN,
            commands: CommandList::LINK_GET_PARAMETERS,
        }
    }

    fn device_states(&self) -> DeviceInformation {
        DeviceInformation { info: "OEM = wlan-handover, wired".to_string() }
    }

    fn link_detected(&mut self, source: &MihfId, info: LinkDetectedInfo) -> bool {
        warn!("wired link {} cannot switch to {:02x?}", source, info.link_id.poa_addr);
        false
    }

    fn link_up(&mut self, indication: LinkUpIndication) {
        info!("wired link up");
        self.link_id.poa_addr = indication.new_access_router;
        self.events.send(LinkEvent::Up(indication));
    }

    fn link_down(&mut self, indication: LinkDownIndication) {
        info!("wired link down: {:?}", indication.reason);
        self.events.send(LinkEvent::Down(indication));
    }
}
