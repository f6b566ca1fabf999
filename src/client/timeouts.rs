// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::timer::{EventId, Scheduler, Time, Timer},
    log::debug,
    std::time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutKind {
    ProbeRequest,
    AssocRequest,
    BeaconWatchdog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    /// A beacon arrived in the meantime and pushed the deadline out; the watchdog was rearmed
    /// for the remaining time.
    Rearmed,
    Expired,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    id: EventId,
    deadline: Time,
}

/// The station's three retry and watchdog timers. At most one timer per kind is pending; starting
/// a timer cancels the pending one of the same kind.
pub struct Timeouts {
    timer: Timer<TimeoutKind>,
    probe_request: Option<Pending>,
    assoc_request: Option<Pending>,
    beacon_watchdog: Option<Pending>,
    /// Latest time the watchdog has been asked to cover. Never moves backwards.
    beacon_watchdog_end: Time,
}

impl Timeouts {
    pub fn new(scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            timer: Timer::new(scheduler),
            probe_request: None,
            assoc_request: None,
            beacon_watchdog: None,
            beacon_watchdog_end: Time::ZERO,
        }
    }

    fn slot(&mut self, kind: TimeoutKind) -> &mut Option<Pending> {
        match kind {
            TimeoutKind::ProbeRequest => &mut self.probe_request,
            TimeoutKind::AssocRequest => &mut self.assoc_request,
            TimeoutKind::BeaconWatchdog => &mut self.beacon_watchdog,
        }
    }

    fn pending(&self, kind: TimeoutKind) -> Option<Pending> {
        match kind {
            TimeoutKind::ProbeRequest => self.probe_request,
            TimeoutKind::AssocRequest => self.assoc_request,
            TimeoutKind::BeaconWatchdog => self.beacon_watchdog,
        }
    }

    pub fn start(&mut self, kind: TimeoutKind, delay: Duration) -> EventId {
        self.cancel(kind);
        let deadline = self.timer.now() + delay;
        let id = self.timer.schedule_at(deadline, kind);
        *self.slot(kind) = Some(Pending { id, deadline });
        id
    }

    pub fn cancel(&mut self, kind: TimeoutKind) {
        if let Some(pending) = self.slot(kind).take() {
            self.timer.cancel_event(pending.id);
        }
    }

    pub fn is_running(&self, kind: TimeoutKind) -> bool {
        self.pending(kind).is_some()
    }

    pub fn deadline(&self, kind: TimeoutKind) -> Option<Time> {
        self.pending(kind).map(|p| p.deadline)
    }

    /// Maps a dispatched event back to its timer kind. Events that were cancelled or replaced
    /// are stale and yield `None`.
    pub fn triggered(&mut self, id: &EventId) -> Option<TimeoutKind> {
        let kind = self.timer.triggered(id)?;
        match self.pending(kind) {
            Some(pending) if pending.id == *id => {
                *self.slot(kind) = None;
                Some(kind)
            }
            _ => None,
        }
    }

    /// Extends the beacon watchdog to cover at least `delay` from now. The deadline never
    /// shrinks, and a running watchdog is left alone: it rearms itself for the remainder once it
    /// fires.
    pub fn restart_beacon_watchdog(&mut self, delay: Duration) {
        let now = self.timer.now();
        self.beacon_watchdog_end = std::cmp::max(now + delay, self.beacon_watchdog_end);
        if !self.is_running(TimeoutKind::BeaconWatchdog) {
            debug!("restarting beacon watchdog: {:?}", delay);
            self.start(TimeoutKind::BeaconWatchdog, delay);
        }
    }

    /// To be called when the beacon watchdog fires.
    pub fn on_beacon_watchdog(&mut self) -> WatchdogOutcome {
        let now = self.timer.now();
        if self.beacon_watchdog_end > now {
            let remaining = self.beacon_watchdog_end - now;
            debug!("beacon watchdog rearmed for {:?}", remaining);
            self.start(TimeoutKind::BeaconWatchdog, remaining);
            WatchdogOutcome::Rearmed
        } else {
            WatchdogOutcome::Expired
        }
    }
}
