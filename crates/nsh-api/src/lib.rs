// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! Value types shared by the NSH packet builder and its consumers.
//!
//! Protocol numbers (next-protocol values, MD types, OAM types) are
//! assigned outside of this workspace. The constants here are the
//! commonly deployed values and exist as convenient defaults; the
//! builders treat every such field as an opaque integer.

#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

pub mod encap;
pub mod mac;

pub use encap::*;
pub use mac::*;

/// VXLAN-GPE flags with the I (valid VNI) and P (next protocol) bits set.
pub const VXLAN_GPE_FLAGS_I_P: u8 = 0x0C;

/// VXLAN-GPE next protocol value for an NSH payload.
pub const VXLAN_GPE_NEXT_PROTO_NSH: u16 = 0x0004;

/// IANA UDP port for VXLAN-GPE.
pub const VXLAN_GPE_PORT: u16 = 4790;

/// GRE protocol type (an Ether Type) for an NSH payload.
pub const GRE_PROTO_NSH: u16 = 0x894F;

pub const NSH_VERSION: u8 = 0;

/// NSH length, in 4-byte words, of a base header followed by the four
/// fixed MD type 1 context words.
pub const NSH_MD_TYPE1_LEN: u8 = 6;

pub const NSH_MD_TYPE1: u8 = 0x01;
pub const NSH_MD_TYPE2: u8 = 0x02;

pub const NSH_NEXT_PROTO_IPV4: u8 = 0x01;
pub const NSH_NEXT_PROTO_IPV6: u8 = 0x02;
pub const NSH_NEXT_PROTO_ETH: u8 = 0x03;
pub const NSH_NEXT_PROTO_OAM: u8 = 0x05;

pub const OAM_TRACE_REQ_TYPE: u8 = 0x01;
pub const OAM_TRACE_RESP_TYPE: u8 = 0x02;
