// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    assert_matches::assert_matches,
    std::{cell::RefCell, rc::Rc, time::Duration},
    wlan_handover::{
        client::{FrameBody, OutgoingFrame, State},
        link::{
            self, EthernetLinkSap, LinkEvent, LinkSap, MihfId, SignalQualityRecord, WifiLinkSap,
        },
        mac::{
            FrameKind, QualityTag, QualityTags, ReasonCode, RxFrame, StatusCode, SupportedRates,
            TimeUnit, BCAST_ADDR,
        },
        timer::{Time, VirtualClock},
        MacAddr, Station, StationConfig, StationRequest, StationStream,
    },
};

const STA_ADDR: MacAddr = [0x02, 0x11, 0x11, 0x11, 0x11, 0x11];
const AP_A: MacAddr = [0x02, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa];
const AP_B: MacAddr = [0x02, 0xbb, 0xbb, 0xbb, 0xbb, 0xbb];

fn beacon(bssid: MacAddr, signal_strength: f64, station_count: u32) -> RxFrame {
    let mut frame = RxFrame::mgmt(FrameKind::Beacon, BCAST_ADDR, bssid, bssid);
    frame.body.ssid = b"home-net".to_vec();
    frame.body.beacon_interval = TimeUnit::DEFAULT_BEACON_INTERVAL;
    frame.body.rates = SupportedRates::from_rates(&[12, 24, 48, 108], &[12, 24]);
    frame.tags = QualityTags::new()
        .with(QualityTag::SignalStrength(signal_strength))
        .with(QualityTag::Snr(signal_strength + 95.0))
        .with(QualityTag::StationCount(station_count));
    frame
}

fn probe_response(bssid: MacAddr) -> RxFrame {
    let mut frame = beacon(bssid, -60.0, 1);
    frame.hdr.kind = FrameKind::ProbeResponse;
    frame.hdr.addr1 = STA_ADDR;
    frame
}

fn assoc_response(bssid: MacAddr, status_code: StatusCode) -> RxFrame {
    let mut frame = RxFrame::mgmt(FrameKind::AssocResponse, STA_ADDR, bssid, bssid);
    frame.body.status_code = status_code;
    frame.body.rates = SupportedRates::from_rates(&[12, 24, 48, 108], &[12, 24]);
    frame
}

fn at_ms(ms: u64) -> Time {
    Time::ZERO + Duration::from_millis(ms)
}

fn new_station(config: StationConfig) -> (Station, StationStream, VirtualClock) {
    let clock = VirtualClock::new();
    let (mut station, stream) = Station::new(config, clock.scheduler());
    station.set_address(STA_ADDR);
    (station, stream, clock)
}

fn home_net() -> StationConfig {
    StationConfig { ssid: "home-net".to_string(), ..Default::default() }
}

/// Releases every event due up to `until` into the station.
fn run_until(clock: &VirtualClock, station: &mut Station, until: Time) {
    while let Some(id) = clock.advance_until(until) {
        station.handle_timeout(id).expect("timeout handled");
    }
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

fn drain_events(stream: &mut wlan_handover::LinkEventStream) -> Vec<LinkEvent> {
    let mut events = vec![];
    while let Ok(Some(event)) = stream.try_next() {
        events.push(event);
    }
    events
}

#[test]
fn beacon_loss_reports_link_down_once() {
    let (mut station, mut stream, clock) = new_station(home_net());
    let downs = Rc::new(RefCell::new(vec![]));
    let downs_clone = Rc::clone(&downs);
    station.register_link_down(move |ind| downs_clone.borrow_mut().push(ind));

    station.on_frame_rx(beacon(AP_A, -60.0, 1)).expect("beacon");
    station.on_frame_rx(assoc_response(AP_A, StatusCode::SUCCESS)).expect("response");
    assert_eq!(station.state(), &State::Associated);

    // Regular beacons keep the watchdog away, no matter how often it fires in between.
    for i in 1..=20 {
        run_until(&clock, &mut station, at_ms(i * 100));
        station.on_frame_rx(beacon(AP_A, -60.0, 1)).expect("beacon");
        assert_eq!(station.state(), &State::Associated);
    }
    assert!(downs.borrow().is_empty());

    // The last beacon at 2000ms is covered for ten beacon intervals of 102.4ms.
    run_until(&clock, &mut station, at_ms(3000));
    assert_eq!(station.state(), &State::Associated);
    run_until(&clock, &mut station, at_ms(3100));
    assert_eq!(station.state(), &State::BeaconMissed);

    run_until(&clock, &mut station, at_ms(10_000));
    station.ensure_associated().expect("ensure");
    let downs = downs.borrow();
    assert_eq!(downs.len(), 1);
    assert_eq!(downs[0].old_access_router, AP_A);
    drain_frames(&mut stream);
}

#[test]
fn probe_response_leads_to_single_link_up() {
    let config = StationConfig::from_json_str(r#"{"ssid": "home-net", "active_probing": true}"#)
        .expect("valid config");
    let (mut station, mut stream, clock) = new_station(config);
    let ups = Rc::new(RefCell::new(vec![]));
    let ups_clone = Rc::clone(&ups);
    station.register_link_up(move |ind| ups_clone.borrow_mut().push(ind));

    station.ensure_associated().expect("ensure");
    assert_eq!(station.state(), &State::WaitProbeResponse);
    let frames = drain_frames(&mut stream);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].hdr.kind, FrameKind::ProbeRequest);

    // Unanswered probes are retried.
    run_until(&clock, &mut station, at_ms(120));
    assert_eq!(drain_frames(&mut stream).len(), 2);

    station.on_frame_rx(probe_response(AP_A)).expect("probe response");
    assert_matches!(station.state(), State::WaitAssocResponse(ctx) => {
        assert_eq!(ctx.target_bssid, AP_A);
        assert!(!ctx.is_reassociation);
    });
    let frames = drain_frames(&mut stream);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].hdr.kind, FrameKind::AssocRequest);
    assert_eq!(frames[0].hdr.addr1, AP_A);

    station.on_frame_rx(assoc_response(AP_A, StatusCode::SUCCESS)).expect("response");
    assert_eq!(station.state(), &State::Associated);
    assert_eq!(station.bssid(), Some(AP_A));

    let ups = ups.borrow();
    assert_eq!(ups.len(), 1);
    assert_eq!(ups[0].new_access_router, AP_A);
    assert_eq!(ups[0].link_id.poa_addr, AP_A);
    assert_eq!(ups[0].link_id.link_addr, STA_ADDR);
    assert_eq!(ups[0].old_access_router, None);
}

#[test]
fn shorter_beacon_interval_does_not_shrink_watchdog() {
    let (mut station, mut stream, clock) = new_station(home_net());
    station.on_frame_rx(beacon(AP_A, -60.0, 1)).expect("beacon");
    station.on_frame_rx(assoc_response(AP_A, StatusCode::SUCCESS)).expect("response");
    assert_eq!(clock.next_deadline(), Some(at_ms(1024)));

    run_until(&clock, &mut station, at_ms(100));
    let mut short = beacon(AP_A, -60.0, 1);
    short.body.beacon_interval = TimeUnit(10);
    station.on_frame_rx(short).expect("beacon");
    assert_eq!(clock.next_deadline(), Some(at_ms(1024)));

    run_until(&clock, &mut station, at_ms(1023));
    assert_eq!(station.state(), &State::Associated);
    run_until(&clock, &mut station, at_ms(1024));
    assert_eq!(station.state(), &State::BeaconMissed);
    drain_frames(&mut stream);
}

#[test]
fn handover_disassociates_before_associating() {
    let (mut station, mut stream, _clock) = new_station(home_net());
    station.register_link_detected(MihfId("sta".to_string()), |_, info| {
        info.signal_strength > -65.0
    });

    station.on_frame_rx(beacon(AP_A, -60.0, 1)).expect("beacon");
    station.on_frame_rx(assoc_response(AP_A, StatusCode::SUCCESS)).expect("response");
    assert_eq!(station.state(), &State::Associated);
    drain_frames(&mut stream);

    station.on_frame_rx(beacon(AP_B, -70.0, 1)).expect("weak beacon");
    assert_eq!(station.state(), &State::Associated);
    assert!(drain_frames(&mut stream).is_empty());

    station.on_frame_rx(beacon(AP_B, -50.0, 1)).expect("strong beacon");
    let frames = drain_frames(&mut stream);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].hdr.kind, FrameKind::Disassociation);
    assert_eq!(frames[0].hdr.addr1, AP_A);
    assert_matches!(frames[0].body, FrameBody::Disassociation { reason_code } => {
        assert_eq!(reason_code, ReasonCode::LEAVING_NETWORK_DISASSOC);
    });
    assert_eq!(frames[1].hdr.kind, FrameKind::AssocRequest);
    assert_eq!(frames[1].hdr.addr1, AP_B);
    assert_matches!(station.state(), State::WaitAssocResponse(ctx) => {
        assert_eq!(ctx.target_bssid, AP_B);
    });
}

#[test]
fn refusal_cancels_assoc_retry() {
    let (mut station, mut stream, clock) = new_station(home_net());
    station.on_frame_rx(beacon(AP_A, -60.0, 1)).expect("beacon");
    assert_eq!(clock.pending_events(), 2);
    station
        .on_frame_rx(assoc_response(AP_A, StatusCode::DENIED_NO_MORE_STAS))
        .expect("response");
    assert_eq!(station.state(), &State::Refused);
    // Only the beacon watchdog is left.
    assert_eq!(clock.pending_events(), 1);
    drain_frames(&mut stream);

    run_until(&clock, &mut station, at_ms(60_000));
    assert_eq!(station.state(), &State::Refused);
    assert!(drain_frames(&mut stream).is_empty());
}

#[test]
fn wifi_link_sap_ranks_access_points() {
    let (mut station, mut stream, _clock) = new_station(home_net());
    let (sap, mut events) = WifiLinkSap::new(MihfId("sta@mih-local".to_string()));
    let sap = Rc::new(RefCell::new(sap));
    link::install(&sap, &mut station);
    assert_eq!(sap.borrow().link_address(), STA_ADDR);

    station.on_frame_rx(beacon(AP_A, -70.0, 2)).expect("beacon A");
    station.on_frame_rx(assoc_response(AP_A, StatusCode::SUCCESS)).expect("response A");
    assert_eq!(station.state(), &State::Associated);
    assert_eq!(sap.borrow().poa_address(), AP_A);

    // Beacons of the current AP are not reported.
    station.on_frame_rx(beacon(AP_A, -40.0, 0)).expect("beacon A");
    // Weaker than the tracked best.
    station.on_frame_rx(beacon(AP_B, -75.0, 0)).expect("weak beacon B");
    assert_eq!(station.state(), &State::Associated);
    // Stronger, and not more loaded than allowed.
    station.on_frame_rx(beacon(AP_B, -60.0, 1)).expect("strong beacon B");
    assert_matches!(station.state(), State::WaitAssocResponse(_));
    station.on_frame_rx(assoc_response(AP_B, StatusCode::SUCCESS)).expect("response B");
    assert_eq!(station.bssid(), Some(AP_B));
    assert_eq!(sap.borrow().poa_address(), AP_B);

    let events = drain_events(&mut events);
    assert_eq!(events.len(), 5);
    assert_matches!(&events[0], LinkEvent::Detected { accepted: true, info, .. } => {
        assert_eq!(info.link_id.poa_addr, AP_A);
        assert_eq!(info.signal_strength, -70.0);
        assert_eq!(info.station_count, 2);
    });
    assert_matches!(&events[1], LinkEvent::Up(up) => assert_eq!(up.new_access_router, AP_A));
    assert_matches!(&events[2], LinkEvent::Detected { accepted: false, .. });
    assert_matches!(&events[3], LinkEvent::Detected { accepted: true, .. });
    assert_matches!(&events[4], LinkEvent::Up(up) => {
        assert_eq!(up.new_access_router, AP_B);
        assert_eq!(up.old_access_router, Some(AP_A));
    });
    assert_eq!(sap.borrow().tracker().record().tracked_station_count, 2);
    drain_frames(&mut stream);
}

#[test]
fn repeated_losses_restart_candidate_ranking() {
    let (mut station, mut stream, clock) = new_station(home_net());
    let (sap, mut events) = WifiLinkSap::new(MihfId("sta@mih-local".to_string()));
    let sap = Rc::new(RefCell::new(sap));
    link::install(&sap, &mut station);

    // The AP never answers, so every attempt ends in a beacon loss.
    station.on_frame_rx(beacon(AP_A, -60.0, 5)).expect("beacon");
    assert_matches!(station.state(), State::WaitAssocResponse(_));
    run_until(&clock, &mut station, at_ms(1100));
    assert_eq!(station.state(), &State::BeaconMissed);
    assert_matches!(drain_events(&mut events).last(), Some(LinkEvent::Down(_)));

    station.on_frame_rx(beacon(AP_A, -60.0, 5)).expect("beacon");
    assert_matches!(station.state(), State::WaitAssocResponse(_));
    run_until(&clock, &mut station, at_ms(2300));
    assert_eq!(station.state(), &State::BeaconMissed);
    // The second loss is not reported as a link down, but ranking still starts over.
    let second_attempt = drain_events(&mut events);
    assert!(!second_attempt.iter().any(|event| matches!(event, LinkEvent::Down(_))));
    assert_eq!(sap.borrow().tracker().record(), SignalQualityRecord::UNTRACKED);

    station.on_frame_rx(beacon(AP_A, -60.0, 5)).expect("beacon");
    assert_matches!(station.state(), State::WaitAssocResponse(ctx) => {
        assert_eq!(ctx.target_bssid, AP_A);
    });
    assert_matches!(&drain_events(&mut events)[..], [LinkEvent::Detected { accepted: true, .. }]);
    let frames = drain_frames(&mut stream);
    assert_eq!(frames.last().map(|f| f.hdr.kind), Some(FrameKind::AssocRequest));
}

#[test]
fn refused_link_detection_does_not_block_good_beacon() {
    let (mut station, mut stream, _clock) = new_station(home_net());
    let asked = Rc::new(RefCell::new(0));
    let asked_clone = Rc::clone(&asked);
    station.register_link_detected(MihfId("sta".to_string()), move |_, _| {
        *asked_clone.borrow_mut() += 1;
        false
    });

    station.on_frame_rx(beacon(AP_A, -60.0, 1)).expect("beacon");
    assert_eq!(*asked.borrow(), 1);
    assert_matches!(station.state(), State::WaitAssocResponse(ctx) => {
        assert_eq!(ctx.target_bssid, AP_A);
    });
    let frames = drain_frames(&mut stream);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].hdr.kind, FrameKind::AssocRequest);
}

#[test]
fn ethernet_link_sap_never_switches() {
    let (mut station, mut stream, _clock) = new_station(home_net());
    let (sap, mut events) = EthernetLinkSap::new(STA_ADDR, MihfId("wired".to_string()));
    let sap = Rc::new(RefCell::new(sap));
    link::install(&sap, &mut station);

    station.on_frame_rx(beacon(AP_A, -70.0, 3)).expect("beacon");
    station.on_frame_rx(assoc_response(AP_A, StatusCode::SUCCESS)).expect("response");
    assert_eq!(station.state(), &State::Associated);
    assert_matches!(&drain_events(&mut events)[..], [LinkEvent::Up(_)]);
    drain_frames(&mut stream);

    // A much better AP is still not worth leaving the current one for.
    station.on_frame_rx(beacon(AP_B, -40.0, 0)).expect("beacon");
    assert_eq!(station.state(), &State::Associated);
    assert_eq!(station.bssid(), Some(AP_A));
    assert!(drain_frames(&mut stream).is_empty());
    assert!(drain_events(&mut events).is_empty());
}
