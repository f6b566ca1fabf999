// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

/// Side-channel measurements the lower layer attaches to a received frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QualityTag {
    /// Received signal strength, in dBm.
    SignalStrength(f64),
    /// Signal to noise ratio, in dB.
    Snr(f64),
    /// Number of stations associated with the transmitting AP.
    StationCount(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QualityTagKind {
    SignalStrength,
    Snr,
    StationCount,
}

impl QualityTag {
    pub fn kind(&self) -> QualityTagKind {
        match self {
            QualityTag::SignalStrength(_) => QualityTagKind::SignalStrength,
            QualityTag::Snr(_) => QualityTagKind::Snr,
            QualityTag::StationCount(_) => QualityTagKind::StationCount,
        }
    }
}

/// The tag set carried by a received frame. At most one tag of each kind is kept; adding a tag
/// replaces an earlier one of the same kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QualityTags(Vec<QualityTag>);

impl QualityTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: QualityTag) -> Self {
        self.add(tag);
        self
    }

    pub fn add(&mut self, tag: QualityTag) {
        self.0.retain(|t| t.kind() != tag.kind());
        self.0.push(tag);
    }

    /// Returns the tag of the given kind, leaving it attached.
    pub fn peek(&self, kind: QualityTagKind) -> Option<QualityTag> {
        self.0.iter().find(|t| t.kind() == kind).copied()
    }

    /// Detaches and returns the tag of the given kind.
    pub fn remove(&mut self, kind: QualityTagKind) -> Option<QualityTag> {
        let idx = self.0.iter().position(|t| t.kind() == kind)?;
        Some(self.0.remove(idx))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn signal_strength(&self) -> Option<f64> {
        match self.peek(QualityTagKind::SignalStrength)? {
            QualityTag::SignalStrength(v) => Some(v),
            _ => None,
        }
    }

    pub fn snr(&self) -> Option<f64> {
        match self.peek(QualityTagKind::Snr)? {
            QualityTag::Snr(v) => Some(v),
            _ => None,
        }
    }

    pub fn station_count(&self) -> Option<u32> {
        match self.peek(QualityTagKind::StationCount)? {
            QualityTag::StationCount(v) => Some(v),
            _ => None,
        }
    }
}
