// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! Network Service Header base and context headers.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |Ver|O|C|R|R|R|R|R|R|   Length  |    MD Type    | Next Protocol |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          Service Path ID                      | Service Index |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  Network Platform Context                     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  Network Shared Context                       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  Service Platform Context                     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  Service Shared Context                       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use super::BuildError;
use super::bits::Field;
use super::bits::pack16;
use super::bits::pack32;
use super::headers::HeaderEmit;
use nsh_api::NSH_MD_TYPE1;
use nsh_api::NSH_MD_TYPE1_LEN;
use nsh_api::NSH_VERSION;
use serde::Deserialize;
use serde::Serialize;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;

pub const NSH_BASE_HDR_SZ: usize = 8;
pub const NSH_CTX_HDR_SZ: usize = 16;
pub const NSH_HDR_SZ: usize = NSH_BASE_HDR_SZ + NSH_CTX_HDR_SZ;

pub const NSH_VER_BITS: u8 = 2;
pub const NSH_FLAGS_BITS: u8 = 8;
pub const NSH_LEN_BITS: u8 = 6;
pub const NSH_PATH_BITS: u8 = 24;

/// OAM packet.
pub const NSH_FLAG_O: u8 = 0x80;
/// Critical metadata present.
pub const NSH_FLAG_C: u8 = 0x40;

const NSH_VER_SHIFT: u16 = 14;
const NSH_FLAGS_SHIFT: u16 = 6;
const NSH_FLAGS_MASK: u16 = 0x3FC0;
const NSH_LEN_MASK: u16 = 0x003F;

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct NshBaseHdr {
    /// Only the low 2 bits are available on the wire.
    #[serde(default)]
    pub version: u8,
    /// The O and C bits followed by six reserved bits.
    #[serde(default)]
    pub flags: u8,
    /// Total NSH length in 4-byte words; 6 bits on the wire.
    pub length: u8,
    pub md_type: u8,
    pub next_protocol: u8,
    /// Only the low 24 bits are available on the wire.
    pub service_path: u32,
    pub service_index: u8,
}

impl NshBaseHdr {
    /// An MD type 1 base header: four fixed context words follow.
    pub fn md_type1(
        next_protocol: u8,
        service_path: u32,
        service_index: u8,
    ) -> Self {
        Self {
            version: NSH_VERSION,
            flags: 0,
            length: NSH_MD_TYPE1_LEN,
            md_type: NSH_MD_TYPE1,
            next_protocol,
            service_path,
            service_index,
        }
    }
}

impl HeaderEmit for NshBaseHdr {
    type Raw = NshBaseHdrRaw;
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct NshBaseHdrRaw {
    pub ver_flags_len: [u8; 2],
    pub md_type: u8,
    pub next_protocol: u8,
    pub path_idx: [u8; 4],
}

impl NshBaseHdrRaw {
    fn word0(&self) -> u16 {
        u16::from_be_bytes(self.ver_flags_len)
    }

    pub fn version(&self) -> u8 {
        (self.word0() >> NSH_VER_SHIFT) as u8
    }

    pub fn flags(&self) -> u8 {
        ((self.word0() & NSH_FLAGS_MASK) >> NSH_FLAGS_SHIFT) as u8
    }

    pub fn length(&self) -> u8 {
        (self.word0() & NSH_LEN_MASK) as u8
    }

    pub fn service_path(&self) -> u32 {
        u32::from_be_bytes(self.path_idx) >> 8
    }

    pub fn service_index(&self) -> u8 {
        self.path_idx[3]
    }
}

impl TryFrom<&NshBaseHdr> for NshBaseHdrRaw {
    type Error = BuildError;

    fn try_from(hdr: &NshBaseHdr) -> Result<Self, Self::Error> {
        let ver_flags_len = pack16(&[
            Field::new("nsh.version", u32::from(hdr.version), NSH_VER_BITS),
            Field::new("nsh.flags", u32::from(hdr.flags), NSH_FLAGS_BITS),
            Field::new("nsh.length", u32::from(hdr.length), NSH_LEN_BITS),
        ])?;

        let path_idx = pack32(&[
            Field::new("nsh.service_path", hdr.service_path, NSH_PATH_BITS),
            Field::new("nsh.service_index", u32::from(hdr.service_index), 8),
        ])?;

        Ok(Self {
            ver_flags_len: ver_flags_len.to_be_bytes(),
            md_type: hdr.md_type,
            next_protocol: hdr.next_protocol,
            path_idx: path_idx.to_be_bytes(),
        })
    }
}

/// The four fixed context words of an MD type 1 header.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
#[serde(default)]
pub struct NshCtxHdr {
    pub network_platform: u32,
    pub network_shared: u32,
    pub service_platform: u32,
    pub service_shared: u32,
}

impl HeaderEmit for NshCtxHdr {
    type Raw = NshCtxHdrRaw;
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct NshCtxHdrRaw {
    pub network_platform: [u8; 4],
    pub network_shared: [u8; 4],
    pub service_platform: [u8; 4],
    pub service_shared: [u8; 4],
}

// Every context field is a full 32-bit word, so there is nothing to
// reject here.
impl TryFrom<&NshCtxHdr> for NshCtxHdrRaw {
    type Error = BuildError;

    fn try_from(hdr: &NshCtxHdr) -> Result<Self, Self::Error> {
        Ok(Self {
            network_platform: hdr.network_platform.to_be_bytes(),
            network_shared: hdr.network_shared.to_be_bytes(),
            service_platform: hdr.service_platform.to_be_bytes(),
            service_shared: hdr.service_shared.to_be_bytes(),
        })
    }
}

/// A base header and its context headers, which always travel
/// together.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct NshHdr {
    pub base: NshBaseHdr,
    #[serde(default)]
    pub ctx: NshCtxHdr,
}

impl HeaderEmit for NshHdr {
    type Raw = NshHdrRaw;
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct NshHdrRaw {
    pub base: NshBaseHdrRaw,
    pub ctx: NshCtxHdrRaw,
}

impl TryFrom<&NshHdr> for NshHdrRaw {
    type Error = BuildError;

    fn try_from(hdr: &NshHdr) -> Result<Self, Self::Error> {
        Ok(Self { base: hdr.base.to_raw()?, ctx: hdr.ctx.to_raw()? })
    }
}
