// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use futures::channel::mpsc;

#[derive(Debug)]
pub struct UnboundedSink<T> {
    sink: mpsc::UnboundedSender<T>,
}

impl<T> UnboundedSink<T> {
    pub fn new(sink: mpsc::UnboundedSender<T>) -> Self {
        UnboundedSink { sink }
    }

    pub fn send(&self, msg: T) {
        match self.sink.unbounded_send(msg) {
            Ok(()) => {}
            Err(e) => {
                if e.is_full() {
                    panic!("Did not expect an unbounded channel to be full: {:?}", e);
                }
                // The receiving side went away. Frames and events are fire-and-forget,
                // so the station keeps running.
            }
        }
    }
}

impl<T> Clone for UnboundedSink<T> {
    fn clone(&self) -> Self {
        UnboundedSink { sink: self.sink.clone() }
    }
}

pub(crate) type StationSink = UnboundedSink<crate::StationRequest>;
pub(crate) type LinkEventSink = UnboundedSink<crate::link::LinkEvent>;
