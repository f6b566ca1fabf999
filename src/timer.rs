// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Discrete-event time keeping. A `VirtualClock` owned by the harness orders all scheduled
//! events by virtual deadline; components hold a `Timer` which maps the opaque `EventId`s handed
//! out by the clock back to their own event payloads.

use {
    std::{
        cell::RefCell,
        collections::{BTreeMap, HashMap},
        convert::TryFrom,
        ops::{Add, Sub},
        rc::Rc,
        time::Duration,
    },
};

/// A point in virtual time, in nanoseconds since the start of the simulation.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Copy, Clone, Default)]
pub struct Time(u64);

impl Time {
    pub const ZERO: Time = Time(0);

    pub fn from_nanos(nanos: u64) -> Self {
        Time(nanos)
    }

    /// Time left until `deadline`, or zero if the deadline has passed.
    pub fn until(self, deadline: Time) -> Duration {
        deadline - self
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, rhs: Duration) -> Time {
        Time(self.0.saturating_add(u64::try_from(rhs.as_nanos()).unwrap_or(u64::MAX)))
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, rhs: Time) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(rhs.0))
    }
}

#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone, PartialOrd, Ord)]
pub struct EventId(u64);

/// A scheduler to schedule and cancel timeouts.
pub trait Scheduler {
    fn now(&self) -> Time;
    /// Requests to schedule an event. Returns a unique ID used to cancel the scheduled event.
    fn schedule(&mut self, deadline: Time) -> EventId;
    /// Cancels a previously scheduled event. A cancelled event is never dispatched.
    fn cancel(&mut self, id: EventId);
}

/// A timer to schedule and cancel timeouts and retrieve triggered events.
pub struct Timer<E> {
    events: HashMap<EventId, E>,
    scheduler: Box<dyn Scheduler>,
}

impl<E> Timer<E> {
    pub fn new(scheduler: Box<dyn Scheduler>) -> Self {
        Self { events: HashMap::default(), scheduler }
    }

    pub fn now(&self) -> Time {
        self.scheduler.now()
    }

    pub fn triggered(&mut self, event_id: &EventId) -> Option<E> {
        self.events.remove(event_id)
    }

    pub fn schedule_at(&mut self, deadline: Time, event: E) -> EventId {
        let event_id = self.scheduler.schedule(deadline);
        self.events.insert(event_id, event);
        event_id
    }

    pub fn schedule_after(&mut self, delay: Duration, event: E) -> EventId {
        let deadline = self.now() + delay;
        self.schedule_at(deadline, event)
    }

    pub fn cancel_event(&mut self, event_id: EventId) {
        self.events.remove(&event_id);
        self.scheduler.cancel(event_id);
    }

    pub fn cancel_all(&mut self) {
        for event_id in self.events.keys() {
            self.scheduler.cancel(*event_id);
        }
        self.events.clear();
    }
}

#[derive(Debug, Default)]
struct EventQueue {
    now: Time,
    next_id: u64,
    pending: BTreeMap<(Time, EventId), ()>,
    deadlines: HashMap<EventId, Time>,
}

impl EventQueue {
    fn pop_due(&mut self, until: Time) -> Option<EventId> {
        let (deadline, id) = match self.pending.keys().next() {
            Some(&(deadline, id)) if deadline <= until => (deadline, id),
            _ => {
                self.now = std::cmp::max(self.now, until);
                return None;
            }
        };
        self.pending.remove(&(deadline, id));
        self.deadlines.remove(&id);
        self.now = std::cmp::max(self.now, deadline);
        Some(id)
    }
}

/// The single-threaded event queue driving a simulation. Clones share the same queue, so the
/// harness keeps one handle and gives boxed clones to the components that schedule timeouts.
///
/// Events are released strictly in deadline order; events sharing a deadline are released in
/// the order they were scheduled.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    queue: Rc<RefCell<EventQueue>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler(&self) -> Box<dyn Scheduler> {
        Box::new(self.clone())
    }

    /// Releases the earliest event due at or before `until` and moves the clock to its deadline.
    /// Once nothing else is due the clock rests at `until` and `None` is returned.
    pub fn advance_until(&self, until: Time) -> Option<EventId> {
        self.queue.borrow_mut().pop_due(until)
    }

    /// Same as `advance_until(now + delay)`.
    pub fn advance_by(&self, delay: Duration) -> Option<EventId> {
        let until = self.now() + delay;
        self.advance_until(until)
    }

    pub fn advance_to_next(&self) -> Option<EventId> {
        let next = self.next_deadline()?;
        self.advance_until(next)
    }

    pub fn next_deadline(&self) -> Option<Time> {
        self.queue.borrow().pending.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn pending_events(&self) -> usize {
        self.queue.borrow().pending.len()
    }
}

impl Scheduler for VirtualClock {
    fn now(&self) -> Time {
        self.queue.borrow().now
    }

    fn schedule(&mut self, deadline: Time) -> EventId {
        let mut queue = self.queue.borrow_mut();
        queue.next_id += 1;
        let id = EventId(queue.next_id);
        // Deadlines in the past fire at the current instant.
        let deadline = std::cmp::max(deadline, queue.now);
        queue.pending.insert((deadline, id), ());
        queue.deadlines.insert(id, deadline);
        id
    }

    fn cancel(&mut self, id: EventId) {
        let mut queue = self.queue.borrow_mut();
        if let Some(deadline) = queue.deadlines.remove(&id) {
            queue.pending.remove(&(deadline, id));
        }
    }
}
