// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Client-side WLAN association state machine with a media-independent handover (MIH) bridge.
//!
//! A [`client::Station`] consumes already-decoded frames and timer expirations, and emits
//! [`StationRequest`]s on a stream owned by the caller. Cross-layer link detection, link-up and
//! link-down notifications are routed to a [`link::LinkSap`], whose link-detected answer can
//! override the station's default choice of access point.

pub mod client;
pub mod config;
pub mod error;
pub mod link;
pub mod mac;
mod sink;
pub mod timer;

use futures::channel::mpsc;

pub use crate::{client::Station, config::StationConfig, error::Error};

pub type Ssid = Vec<u8>;
pub type MacAddr = [u8; 6];

/// Everything a station asks its lower and upper layers to do.
#[derive(Debug)]
pub enum StationRequest {
    /// Hand a frame to the lower layer for transmission.
    Transmit(client::OutgoingFrame),
    /// Deliver an accepted data payload to the upper layer.
    ForwardUp { src: MacAddr, dst: MacAddr, payload: Vec<u8> },
    /// A frame kind the association machine does not handle, e.g. block-ack action frames.
    ForwardToParent(mac::RxFrame),
}

pub type StationStream = mpsc::UnboundedReceiver<StationRequest>;
pub type LinkEventStream = mpsc::UnboundedReceiver<link::LinkEvent>;
