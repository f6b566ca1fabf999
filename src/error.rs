// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("station address is not configured")]
    AddressNotConfigured,
    #[error("invalid station configuration: {0}")]
    InvalidConfig(String),
    #[error("error parsing station configuration: {0}")]
    ParsingConfig(#[from] serde_json::Error),
}
