// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The client station: association state machine, handover bridge and the timers driving them.

mod capabilities;
mod frames;
mod handover;
mod state;
mod timeouts;

#[cfg(test)]
pub mod test_utils;

use {
    crate::{
        config::StationConfig,
        error::Error,
        link::{LinkDetectedInfo, LinkDownIndication, LinkUpIndication, MihfId},
        mac::RxFrame,
        timer::{EventId, Scheduler},
        MacAddr, Ssid, StationStream,
    },
    futures::channel::mpsc,
    log::{debug, info},
};

pub use self::{
    capabilities::{BssCapabilities, ContentionWindow, LONG_SLOT_TIME, SHORT_SLOT_TIME},
    frames::{AssocRequest, FrameBody, OutgoingFrame, PhyElements, ProbeRequest},
    state::{AssociationContext, State},
    timeouts::TimeoutKind,
};

/// Frame and drop accounting of a station.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub rx_drops: u64,
    pub tx_drops: u64,
    pub forwarded_up: u64,
}

// A private module is not allowed to include private types in its interface,
// so the context shared by all states lives in a private module with public types.
mod internal {
    use {
        super::{
            capabilities::BssCapabilities, handover::HandoverBridge, timeouts::Timeouts, Counters,
        },
        crate::{
            config::StationConfig, sink::StationSink, timer::Scheduler, MacAddr, Ssid,
            StationRequest,
        },
        futures::channel::mpsc,
    };

    pub struct Context {
        pub config: StationConfig,
        pub ssid: Ssid,
        pub active_probing: bool,
        /// BSS the station is associated with, or the last one accepted from a beacon or probe
        /// response.
        pub bssid: Option<MacAddr>,
        /// The last AP the station was associated with.
        pub previous_ap: Option<MacAddr>,
        /// Set once a loss has been reported; cleared on association.
        pub link_down_reported: bool,
        pub timeouts: Timeouts,
        pub bridge: HandoverBridge,
        pub caps: BssCapabilities,
        pub counters: Counters,
        pub sink: StationSink,
    }

    impl Context {
        pub fn new(
            config: StationConfig,
            scheduler: Box<dyn Scheduler>,
            sender: mpsc::UnboundedSender<StationRequest>,
        ) -> Self {
            Context {
                ssid: config.ssid(),
                active_probing: config.active_probing,
                config,
                bssid: None,
                previous_ap: None,
                link_down_reported: false,
                timeouts: Timeouts::new(scheduler),
                bridge: HandoverBridge::default(),
                caps: BssCapabilities::default(),
                counters: Counters::default(),
                sink: StationSink::new(sender),
            }
        }
    }
}

use self::internal::*;

type BssidLogger = Box<dyn FnMut(MacAddr)>;

/// A client station. Frames arrive already decoded through `on_frame_rx`, timers through
/// `handle_timeout`; everything the station wants done is emitted on the `StationStream`
/// returned by `new`.
pub struct Station {
    state: Option<State>,
    address: Option<MacAddr>,
    context: Context,
    assoc_logger: Option<BssidLogger>,
    deassoc_logger: Option<BssidLogger>,
    /// BSS the station is currently associated with, as reported to the loggers.
    associated_bssid: Option<MacAddr>,
}

impl Station {
    pub fn new(config: StationConfig, scheduler: Box<dyn Scheduler>) -> (Self, StationStream) {
        let (sender, receiver) = mpsc::unbounded();
        let station = Station {
            state: Some(State::BeaconMissed),
            address: None,
            context: Context::new(config, scheduler, sender),
            assoc_logger: None,
            deassoc_logger: None,
            associated_bssid: None,
        };
        (station, receiver)
    }

    pub fn set_address(&mut self, address: MacAddr) {
        self.address = Some(address);
    }

    pub fn address(&self) -> Option<MacAddr> {
        self.address
    }

    /// Starts looking for a BSS if the station is neither associated nor already trying.
    pub fn ensure_associated(&mut self) -> Result<(), Error> {
        self.run(|state, own_addr, ctx| state.ensure_associated(own_addr, ctx))
    }

    pub fn on_frame_rx(&mut self, frame: RxFrame) -> Result<(), Error> {
        self.run(|state, own_addr, ctx| state.on_frame_rx(own_addr, frame, ctx))
    }

    /// Dispatches a timer event released by the scheduler. Events the station no longer waits
    /// for are ignored.
    pub fn handle_timeout(&mut self, event_id: EventId) -> Result<(), Error> {
        let kind = match self.context.timeouts.triggered(&event_id) {
            Some(kind) => kind,
            None => {
                debug!("ignoring stale timer event {:?}", event_id);
                return Ok(());
            }
        };
        self.run(|state, own_addr, ctx| state.on_timeout(own_addr, kind, ctx))
    }

    /// Queues `payload` for `dst` through the AP. Anything above the highest user priority is
    /// sent as best effort.
    pub fn send_data(&mut self, dst: MacAddr, payload: Vec<u8>, tid: u8) -> Result<(), Error> {
        self.run(|state, own_addr, ctx| state.on_send_data(own_addr, dst, payload, tid, ctx))
    }

    /// To be called when the lower layer's PHY capabilities change.
    pub fn on_capabilities_changed(&mut self) -> Result<(), Error> {
        self.run(|state, own_addr, ctx| state.on_capabilities_changed(own_addr, ctx))
    }

    pub fn set_active_probing(&mut self, enable: bool) -> Result<(), Error> {
        self.context.active_probing = enable;
        self.run(|state, own_addr, ctx| state.on_active_probing_changed(own_addr, ctx))
    }

    /// Changes the SSID to join. This is also what gets a refused station going again.
    pub fn set_ssid(&mut self, ssid: Ssid) -> Result<(), Error> {
        self.context.ssid = ssid;
        self.run(|state, own_addr, ctx| state.on_ssid_changed(own_addr, ctx))
    }

    pub fn register_link_detected<F>(&mut self, source: MihfId, callback: F)
    where
        F: FnMut(&MihfId, LinkDetectedInfo) -> bool + 'static,
    {
        self.context.bridge.set_link_detected(source, Box::new(callback));
    }

    pub fn register_link_up<F>(&mut self, callback: F)
    where
        F: FnMut(LinkUpIndication) + 'static,
    {
        self.context.bridge.set_link_up(Box::new(callback));
    }

    pub fn register_link_down<F>(&mut self, callback: F)
    where
        F: FnMut(LinkDownIndication) + 'static,
    {
        self.context.bridge.set_link_down(Box::new(callback));
    }

    /// Called on every loss of the BSS. `register_link_down` is only told once per loss until
    /// the next association.
    pub fn register_link_lost<F>(&mut self, callback: F)
    where
        F: FnMut(MacAddr) + 'static,
    {
        self.context.bridge.set_link_lost(Box::new(callback));
    }

    pub fn register_assoc_logger<F: FnMut(MacAddr) + 'static>(&mut self, logger: F) {
        self.assoc_logger = Some(Box::new(logger));
    }

    pub fn register_deassoc_logger<F: FnMut(MacAddr) + 'static>(&mut self, logger: F) {
        self.deassoc_logger = Some(Box::new(logger));
    }

    pub fn state(&self) -> &State {
        // The state is only taken for the duration of a transition.
        self.state.as_ref().unwrap_or(&State::BeaconMissed)
    }

    pub fn is_associated(&self) -> bool {
        self.state().is_associated()
    }

    pub fn bssid(&self) -> Option<MacAddr> {
        self.context.bssid
    }

    pub fn counters(&self) -> Counters {
        self.context.counters
    }

    pub fn capabilities(&self) -> &BssCapabilities {
        &self.context.caps
    }

    pub fn config(&self) -> &StationConfig {
        &self.context.config
    }

    fn run<F>(&mut self, transition: F) -> Result<(), Error>
    where
        F: FnOnce(State, MacAddr, &mut Context) -> State,
    {
        let own_addr = self.address.ok_or(Error::AddressNotConfigured)?;
        let was_associated = self.is_associated();
        let context = &mut self.context;
        self.state = self.state.take().map(|state| {
            let old = state.clone();
            let new = transition(state, own_addr, context);
            if new != old {
                info!("station state: {:?} -> {:?}", old, new);
            }
            new
        });

        match (was_associated, self.is_associated()) {
            (false, true) => {
                self.associated_bssid = self.context.bssid;
                if let (Some(logger), Some(bssid)) =
                    (self.assoc_logger.as_mut(), self.associated_bssid)
                {
                    logger(bssid);
                }
            }
            (true, false) => {
                if let Some(bssid) = self.associated_bssid.take() {
                    if let Some(logger) = self.deassoc_logger.as_mut() {
                        logger(bssid);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{test_utils::*, *},
        crate::{
            link::{LinkDownReason, LinkType},
            mac::{FrameKind, StatusCode},
            timer::VirtualClock,
            StationRequest,
        },
        assert_matches::assert_matches,
        std::{cell::RefCell, rc::Rc},
    };

    fn station(config: StationConfig) -> (Station, StationStream, VirtualClock) {
        let clock = VirtualClock::new();
        let (mut station, stream) = Station::new(config, clock.scheduler());
        station.set_address(STA_ADDR);
        (station, stream, clock)
    }

    fn drain_frames(stream: &mut StationStream) -> Vec<OutgoingFrame> {
        let mut frames = vec![];
        while let Ok(Some(request)) = stream.try_next() {
            if let StationRequest::Transmit(frame) = request {
                frames.push(frame);
            }
        }
        frames
    }

    fn associate(station: &mut Station, stream: &mut StationStream, bssid: MacAddr) {
        station.on_frame_rx(beacon(bssid, b"home-net")).expect("beacon accepted");
        station.on_frame_rx(assoc_response(bssid, StatusCode::SUCCESS)).expect("response accepted");
        assert!(station.is_associated());
        drain_frames(stream);
    }

    #[test]
    fn actions_require_address() {
        let clock = VirtualClock::new();
        let (mut station, _stream) = Station::new(StationConfig::default(), clock.scheduler());
        assert_matches!(station.ensure_associated(), Err(Error::AddressNotConfigured));
        assert_matches!(
            station.on_frame_rx(beacon(AP_A, b"home-net")),
            Err(Error::AddressNotConfigured)
        );
        assert_eq!(station.state(), &State::BeaconMissed);
    }

    #[test]
    fn initial_state_and_config() {
        let config = StationConfig { ssid: "home-net".to_string(), ..Default::default() };
        let (station, _stream, _clock) = station(config);
        assert_eq!(station.state(), &State::BeaconMissed);
        assert_eq!(station.bssid(), None);
        assert_eq!(station.counters(), Counters::default());
        assert_eq!(station.config().ssid, "home-net");
    }

    #[test]
    fn loggers_follow_association() {
        let log = Rc::new(RefCell::new(vec![]));
        let (mut station, mut stream, clock) = station(StationConfig::default());
        let assoc_log = Rc::clone(&log);
        station.register_assoc_logger(move |bssid| assoc_log.borrow_mut().push(("assoc", bssid)));
        let deassoc_log = Rc::clone(&log);
        station.register_deassoc_logger(move |bssid| {
            deassoc_log.borrow_mut().push(("deassoc", bssid))
        });

        associate(&mut station, &mut stream, AP_A);
        assert_eq!(&log.borrow()[..], &[("assoc", AP_A)]);

        let id = clock.advance_to_next().expect("beacon watchdog");
        station.handle_timeout(id).expect("timeout handled");
        assert_eq!(station.state(), &State::BeaconMissed);
        assert_eq!(&log.borrow()[..], &[("assoc", AP_A), ("deassoc", AP_A)]);
    }

    #[test]
    fn capability_change_reassociates() {
        let log = Rc::new(RefCell::new(vec![]));
        let (mut station, mut stream, _clock) = station(StationConfig::default());
        let deassoc_log = Rc::clone(&log);
        station.register_deassoc_logger(move |bssid| deassoc_log.borrow_mut().push(bssid));
        associate(&mut station, &mut stream, AP_A);

        station.on_capabilities_changed().expect("capabilities changed");
        assert_matches!(
            station.state(),
            State::WaitAssocResponse(AssociationContext { is_reassociation: true, .. })
        );
        assert_eq!(&log.borrow()[..], &[AP_A]);
        let frames = drain_frames(&mut stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].hdr.kind, FrameKind::ReassocRequest);

        let mut response = assoc_response(AP_A, StatusCode::SUCCESS);
        response.hdr.kind = FrameKind::ReassocResponse;
        station.on_frame_rx(response).expect("reassoc response");
        assert!(station.is_associated());
    }

    #[test]
    fn stale_timer_events_are_ignored() {
        let (mut station, mut stream, clock) = station(StationConfig::default());
        station.on_frame_rx(beacon(AP_A, b"home-net")).expect("beacon");
        // Two events pending: the beacon watchdog and the association retry.
        assert_eq!(clock.pending_events(), 2);
        station.on_frame_rx(assoc_response(AP_A, StatusCode::SUCCESS)).expect("response");
        assert_eq!(clock.pending_events(), 1);
        drain_frames(&mut stream);

        // An event scheduled by someone else sharing the clock.
        let foreign = clock.scheduler().schedule(crate::timer::Time::ZERO);
        station.handle_timeout(foreign).expect("unknown event");
        assert!(station.is_associated());
        assert!(drain_frames(&mut stream).is_empty());
    }

    #[test]
    fn assoc_retry_resends_request() {
        let (mut station, mut stream, clock) = station(StationConfig::default());
        station.on_frame_rx(beacon(AP_A, b"home-net")).expect("beacon");
        assert_eq!(drain_frames(&mut stream).len(), 1);

        let id = clock.advance_to_next().expect("assoc retry");
        station.handle_timeout(id).expect("timeout");
        let frames = drain_frames(&mut stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].hdr.kind, FrameKind::AssocRequest);
        assert_eq!(frames[0].hdr.addr1, AP_A);
    }

    #[test]
    fn refused_then_new_ssid() {
        let config = StationConfig { active_probing: true, ..Default::default() };
        let (mut station, mut stream, clock) = station(config);
        station.on_frame_rx(beacon(AP_A, b"home-net")).expect("beacon");
        station
            .on_frame_rx(assoc_response(AP_A, StatusCode::REFUSED_CAPABILITIES_MISMATCH))
            .expect("response");
        assert_eq!(station.state(), &State::Refused);
        drain_frames(&mut stream);

        station.ensure_associated().expect("ensure");
        assert_eq!(station.state(), &State::Refused);
        assert!(drain_frames(&mut stream).is_empty());

        station.set_ssid(b"other-net".to_vec()).expect("ssid");
        assert_eq!(station.state(), &State::WaitProbeResponse);
        let frames = drain_frames(&mut stream);
        assert_matches!(&frames[0].body, FrameBody::ProbeRequest(req) => {
            assert_eq!(req.ssid, b"other-net".to_vec());
        });
        assert!(clock.pending_events() > 0);
    }

    #[test]
    fn link_down_reported_once_per_loss() {
        let downs = Rc::new(RefCell::new(vec![]));
        let (mut station, mut stream, clock) = station(StationConfig::default());
        let downs_clone = Rc::clone(&downs);
        station.register_link_down(move |ind| downs_clone.borrow_mut().push(ind));
        associate(&mut station, &mut stream, AP_A);

        let id = clock.advance_to_next().expect("beacon watchdog");
        station.handle_timeout(id).expect("timeout");
        station.ensure_associated().expect("ensure");
        station.send_data(REMOTE_ADDR, vec![1], 0).expect("send");

        let downs = downs.borrow();
        assert_eq!(downs.len(), 1);
        assert_eq!(downs[0].link_id.link_type, LinkType::Wireless80211);
        assert_eq!(downs[0].link_id.poa_addr, AP_A);
        assert_eq!(downs[0].reason, LinkDownReason::NoBroadcast);
        assert_eq!(station.counters().tx_drops, 1);
    }

    #[test]
    fn qos_data_once_edca_is_advertised() {
        let config = StationConfig { qos_supported: true, ..Default::default() };
        let (mut station, mut stream, _clock) = station(config);
        let mut frame = beacon(AP_A, b"home-net");
        frame.body.edca = Some(Default::default());
        station.on_frame_rx(frame).expect("beacon");
        let mut response = assoc_response(AP_A, StatusCode::SUCCESS);
        response.body.edca = Some(Default::default());
        station.on_frame_rx(response).expect("response");
        drain_frames(&mut stream);

        station.send_data(REMOTE_ADDR, vec![7], 9).expect("send");
        let frames = drain_frames(&mut stream);
        assert_eq!(frames[0].hdr.kind, FrameKind::QosData);
        assert_matches!(frames[0].body, FrameBody::Data { tid: Some(0), .. });
        assert!(station.capabilities().qos);
    }
}
