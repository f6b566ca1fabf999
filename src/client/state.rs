// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{
        frames,
        timeouts::{TimeoutKind, WatchdogOutcome},
        Context,
    },
    crate::{
        config::StationConfig,
        mac::{is_group_addr, FrameKind, RxFrame, SupportedRates, NULL_ADDR},
        MacAddr, StationRequest,
    },
    log::{debug, info, warn},
    std::time::Duration,
};

/// Request state kept while an association or reassociation request is outstanding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssociationContext {
    pub is_reassociation: bool,
    pub target_bssid: MacAddr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum State {
    Associated,
    WaitProbeResponse,
    BeaconMissed,
    WaitAssocResponse(AssociationContext),
    /// The AP refused us. Only a new SSID gets the station out of here.
    Refused,
}

impl State {
    pub fn is_associated(&self) -> bool {
        match self {
            State::Associated => true,
            _ => false,
        }
    }

    pub fn ensure_associated(self, own_addr: MacAddr, ctx: &mut Context) -> Self {
        match self {
            State::BeaconMissed => {
                if !ctx.link_down_reported {
                    ctx.link_down_reported = true;
                    ctx.bridge.link_down(own_addr, ctx.bssid.unwrap_or(NULL_ADDR));
                }
                if ctx.active_probing {
                    send_probe_request(own_addr, ctx);
                    State::WaitProbeResponse
                } else {
                    State::BeaconMissed
                }
            }
            other => other,
        }
    }

    /// Runs the receive filter and dispatches the frame to its handler.
    pub fn on_frame_rx(self, own_addr: MacAddr, frame: RxFrame, ctx: &mut Context) -> Self {
        if frame.hdr.addr3 == own_addr {
            // Our own transmission, reflected.
            return self;
        }
        if frame.hdr.addr1 != own_addr && !is_group_addr(&frame.hdr.addr1) {
            drop_rx(ctx, "not addressed to us", &frame);
            return self;
        }

        match frame.hdr.kind {
            FrameKind::Data | FrameKind::QosData => {
                self.on_data_frame(frame, ctx);
                self
            }
            FrameKind::Beacon => self.on_beacon(own_addr, frame, ctx),
            FrameKind::ProbeResponse => self.on_probe_response(own_addr, frame, ctx),
            FrameKind::AssocResponse | FrameKind::ReassocResponse => {
                self.on_assoc_response(own_addr, frame, ctx)
            }
            FrameKind::ProbeRequest | FrameKind::AssocRequest | FrameKind::ReassocRequest => {
                drop_rx(ctx, "AP-directed management frame", &frame);
                self
            }
            FrameKind::Disassociation | FrameKind::Action => {
                ctx.sink.send(StationRequest::ForwardToParent(frame));
                self
            }
        }
    }

    fn on_data_frame(&self, frame: RxFrame, ctx: &mut Context) {
        let from_ap = frame.hdr.from_ds && !frame.hdr.to_ds && Some(frame.hdr.addr2) == ctx.bssid;
        if !self.is_associated() || !from_ap {
            drop_rx(ctx, "data frame not from our AP", &frame);
            return;
        }
        ctx.counters.forwarded_up += 1;
        ctx.sink.send(StationRequest::ForwardUp {
            src: frame.hdr.addr3,
            dst: frame.hdr.addr1,
            payload: frame.payload,
        });
    }

    fn on_beacon(self, own_addr: MacAddr, mut frame: RxFrame, ctx: &mut Context) -> Self {
        let sender_bssid = frame.hdr.addr3;
        let mut good_beacon = ctx.ssid.is_empty() || frame.body.ssid == ctx.ssid;

        let from_current_ap = self.is_associated() && Some(sender_bssid) == ctx.bssid;
        let mut send_assoc = if from_current_ap {
            false
        } else {
            ctx.bridge.link_detected(own_addr, &mut frame).unwrap_or(false)
        };

        if !advertises_any_selector(&ctx.config, &frame.body.rates) {
            debug!("beacon from {:02x?} lacks every required membership selector", sender_bssid);
            good_beacon = false;
            send_assoc = false;
        }

        if send_assoc && self.is_associated() {
            if let Some(current_ap) = ctx.bssid {
                info!("handing over from {:02x?} to {:02x?}", current_ap, sender_bssid);
                ctx.sink.send(StationRequest::Transmit(frames::disassociation(
                    current_ap, own_addr,
                )));
            }
        }

        match &self {
            State::Associated | State::WaitAssocResponse(_) if Some(sender_bssid) != ctx.bssid => {
                good_beacon = false;
            }
            _ => {}
        }

        if !good_beacon && !send_assoc {
            drop_rx(ctx, "beacon not matching our BSS", &frame);
            return self;
        }

        ctx.timeouts.restart_beacon_watchdog(watchdog_delay(&frame, &ctx.config));
        ctx.bssid = Some(sender_bssid);
        ctx.caps.adopt_beacon(&frame.body, &ctx.config);

        let waiting_for_bss = match self {
            State::BeaconMissed | State::WaitProbeResponse => true,
            _ => false,
        };
        if send_assoc || (good_beacon && waiting_for_bss) {
            ctx.timeouts.cancel(TimeoutKind::ProbeRequest);
            return send_assoc_request(own_addr, sender_bssid, false, ctx);
        }
        self
    }

    fn on_probe_response(self, own_addr: MacAddr, mut frame: RxFrame, ctx: &mut Context) -> Self {
        match self {
            State::WaitProbeResponse => {}
            other => return other,
        }

        if !ctx.ssid.is_empty() && frame.body.ssid != ctx.ssid {
            drop_rx(ctx, "probe response for another SSID", &frame);
            return self;
        }
        if !advertises_all_selectors(&ctx.config, &frame.body.rates) {
            drop_rx(ctx, "probe response lacks a required membership selector", &frame);
            return self;
        }

        let bssid = frame.hdr.addr2;
        ctx.caps.adopt_probe_response(&frame.body, &ctx.config);
        ctx.bssid = Some(bssid);
        ctx.timeouts.restart_beacon_watchdog(watchdog_delay(&frame, &ctx.config));
        ctx.timeouts.cancel(TimeoutKind::ProbeRequest);
        // A probe response answers our own request, so the decision is not consulted.
        let _ = ctx.bridge.link_detected(own_addr, &mut frame);
        send_assoc_request(own_addr, bssid, false, ctx)
    }

    fn on_assoc_response(self, own_addr: MacAddr, frame: RxFrame, ctx: &mut Context) -> Self {
        let assoc_ctx = match self {
            State::WaitAssocResponse(assoc_ctx) => assoc_ctx,
            other => {
                debug!("ignoring association response in state {:?}", other);
                return other;
            }
        };
        if frame.hdr.addr2 != assoc_ctx.target_bssid {
            drop_rx(ctx, "association response from another AP", &frame);
            return self;
        }
        ctx.timeouts.cancel(TimeoutKind::AssocRequest);

        let status = frame.body.status_code;
        if !status.is_success() {
            warn!("association with {:02x?} refused: {:?}", assoc_ctx.target_bssid, status);
            return State::Refused;
        }

        info!("associated with {:02x?}", assoc_ctx.target_bssid);
        ctx.caps.adopt_assoc_response(&frame.body, &ctx.config);
        ctx.link_down_reported = false;
        ctx.bridge.link_up(own_addr, frame.hdr.addr2, ctx.previous_ap);
        ctx.previous_ap = Some(frame.hdr.addr2);
        State::Associated
    }

    pub fn on_timeout(self, own_addr: MacAddr, kind: TimeoutKind, ctx: &mut Context) -> Self {
        match (self, kind) {
            (State::WaitProbeResponse, TimeoutKind::ProbeRequest) => {
                debug!("probe request timed out, retrying");
                send_probe_request(own_addr, ctx);
                State::WaitProbeResponse
            }
            (State::WaitAssocResponse(assoc_ctx), TimeoutKind::AssocRequest) => {
                debug!("association request timed out, retrying");
                send_assoc_request(
                    own_addr,
                    assoc_ctx.target_bssid,
                    assoc_ctx.is_reassociation,
                    ctx,
                )
            }
            (State::Refused, TimeoutKind::BeaconWatchdog) => State::Refused,
            (state, TimeoutKind::BeaconWatchdog) => match ctx.timeouts.on_beacon_watchdog() {
                WatchdogOutcome::Rearmed => state,
                WatchdogOutcome::Expired => {
                    info!("beacons missed from {:02x?}", ctx.bssid);
                    ctx.timeouts.cancel(TimeoutKind::ProbeRequest);
                    ctx.timeouts.cancel(TimeoutKind::AssocRequest);
                    enter_beacon_missed(own_addr, ctx)
                }
            },
            (state, kind) => {
                debug!("ignoring {:?} timeout in state {:?}", kind, state);
                state
            }
        }
    }

    pub fn on_capabilities_changed(self, own_addr: MacAddr, ctx: &mut Context) -> Self {
        match (self, ctx.bssid) {
            (State::Associated, Some(bssid)) => {
                info!("capabilities changed, reassociating with {:02x?}", bssid);
                send_assoc_request(own_addr, bssid, true, ctx)
            }
            (other, _) => other,
        }
    }

    pub fn on_ssid_changed(self, own_addr: MacAddr, ctx: &mut Context) -> Self {
        match self {
            State::Refused => enter_beacon_missed(own_addr, ctx),
            other => other,
        }
    }

    pub fn on_active_probing_changed(self, own_addr: MacAddr, ctx: &mut Context) -> Self {
        if ctx.active_probing {
            self.ensure_associated(own_addr, ctx)
        } else {
            ctx.timeouts.cancel(TimeoutKind::ProbeRequest);
            self
        }
    }

    pub fn on_send_data(
        self,
        own_addr: MacAddr,
        dst: MacAddr,
        payload: Vec<u8>,
        tid: u8,
        ctx: &mut Context,
    ) -> Self {
        match ctx.bssid {
            Some(bssid) if self.is_associated() => {
                let frame = frames::data_frame(bssid, own_addr, dst, payload, ctx.caps.qos, tid);
                ctx.sink.send(StationRequest::Transmit(frame));
                self
            }
            _ => {
                ctx.counters.tx_drops += 1;
                debug!("dropping outgoing data while in state {:?}", self);
                self.ensure_associated(own_addr, ctx)
            }
        }
    }
}

fn enter_beacon_missed(own_addr: MacAddr, ctx: &mut Context) -> State {
    ctx.bridge.link_lost(ctx.bssid.unwrap_or(NULL_ADDR));
    State::BeaconMissed.ensure_associated(own_addr, ctx)
}

fn send_probe_request(own_addr: MacAddr, ctx: &mut Context) {
    let frame = frames::probe_request(own_addr, &ctx.ssid, &ctx.config);
    ctx.sink.send(StationRequest::Transmit(frame));
    ctx.timeouts.start(TimeoutKind::ProbeRequest, ctx.config.probe_request_timeout());
}

fn send_assoc_request(
    own_addr: MacAddr,
    bssid: MacAddr,
    is_reassociation: bool,
    ctx: &mut Context,
) -> State {
    let current_ap = if is_reassociation { Some(bssid) } else { None };
    let frame = frames::assoc_request(bssid, own_addr, &ctx.ssid, current_ap, &ctx.config);
    ctx.sink.send(StationRequest::Transmit(frame));
    ctx.timeouts.start(TimeoutKind::AssocRequest, ctx.config.assoc_request_timeout());
    State::WaitAssocResponse(AssociationContext { is_reassociation, target_bssid: bssid })
}

fn drop_rx(ctx: &mut Context, reason: &str, frame: &RxFrame) {
    ctx.counters.rx_drops += 1;
    debug!("dropping {:?} from {:02x?}: {}", frame.hdr.kind, frame.hdr.addr2, reason);
}

fn watchdog_delay(frame: &RxFrame, config: &StationConfig) -> Duration {
    Duration::from(frame.body.beacon_interval) * config.max_missed_beacons
}

fn advertises_any_selector(config: &StationConfig, rates: &SupportedRates) -> bool {
    config.bss_membership_selectors.is_empty()
        || config.bss_membership_selectors.iter().any(|s| rates.is_membership_selector(*s))
}

fn advertises_all_selectors(config: &StationConfig, rates: &SupportedRates) -> bool {
    config.bss_membership_selectors.iter().all(|s| rates.is_membership_selector(*s))
}
