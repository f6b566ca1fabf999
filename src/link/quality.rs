// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use log::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalQualityRecord {
    /// Strongest signal accepted so far, in dBm.
    pub best_signal_strength: f64,
    pub tracked_station_count: u32,
}

impl SignalQualityRecord {
    /// A record that any candidate link improves on.
    pub const UNTRACKED: Self =
        SignalQualityRecord { best_signal_strength: f64::NEG_INFINITY, tracked_station_count: u32::MAX };
}

impl Default for SignalQualityRecord {
    fn default() -> Self {
        Self::UNTRACKED
    }
}

/// Decides whether a newly detected link is an improvement over the one chosen before.
///
/// A candidate is accepted iff its signal is strictly stronger than the best accepted so far and
/// its AP serves no more stations than the tracked count. Accepting a candidate raises the
/// tracked count to the candidate's count plus one, so the next candidate has to serve strictly
/// fewer stations than that to win again.
#[derive(Clone, Debug, Default)]
pub struct LinkQualityTracker {
    record: SignalQualityRecord,
}

impl LinkQualityTracker {
    pub fn new(record: SignalQualityRecord) -> Self {
        Self { record }
    }

    pub fn accept(&mut self, signal_strength: f64, station_count: u32) -> bool {
        let accepted = signal_strength > self.record.best_signal_strength
            && station_count <= self.record.tracked_station_count;
        if accepted {
            self.record = SignalQualityRecord {
                best_signal_strength: signal_strength,
                tracked_station_count: station_count.saturating_add(1),
            };
        } else {
            debug!(
                "link rejected: signal {} dBm / {} stations vs best {} dBm / {} stations",
                signal_strength,
                station_count,
                self.record.best_signal_strength,
                self.record.tracked_station_count
            );
        }
        accepted
    }

    pub fn record(&self) -> SignalQualityRecord {
        self.record
    }

    /// Starts a new tracking session.
    pub fn reset(&mut self) {
        self.record = SignalQualityRecord::UNTRACKED;
    }
}
