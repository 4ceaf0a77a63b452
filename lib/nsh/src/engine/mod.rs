// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! The header builders and the packet assembler.

pub mod bits;
pub mod ether;
pub mod gre;
pub mod headers;
pub mod ip4;
pub mod nsh;
pub mod packet;
pub mod resolve;
pub mod trace;
pub mod vxlan_gpe;

use std::io;
use thiserror::Error;

/// Errors produced while building headers and packets.
///
/// A build that fails never hands back a partially written buffer.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A field value does not fit in the bits allotted to it.
    #[error("{field} value {value:#x} does not fit in {width} bits")]
    InvalidFieldWidth { field: &'static str, value: u64, width: u8 },

    /// The requested combination of headers is not a packet shape we
    /// know how to build.
    #[error("unsupported encapsulation: {0}")]
    UnsupportedEncap(String),

    /// The local address to embed in a header could not be determined.
    #[error("failed to resolve local address for {target}: {source}")]
    AddrResolution {
        target: String,
        #[source]
        source: io::Error,
    },
}
