// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! Builders for Network Service Header (NSH) packets.
//!
//! Typed header values go in, byte-exact network-order headers come
//! out. The outer transport is VXLAN-GPE or GRE, optionally followed
//! by an inner Ethernet header or an OAM trace request, and trace
//! packets can be extended hop by hop with service-function records.

#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

pub use nsh_api as api;

pub mod engine;
pub mod print;

pub use engine::BuildError;
