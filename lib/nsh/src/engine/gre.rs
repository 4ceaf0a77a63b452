// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! GRE headers.
//!
//! RFC 2784 Generic Routing Encapsulation. The key and sequence
//! number extensions of RFC 2890 are not used; the checksum and
//! reserved1 words are always present.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |C|       Reserved0       | Ver |         Protocol Type         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      Checksum (optional)      |       Reserved1 (Optional)    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use super::BuildError;
use super::bits::Field;
use super::bits::pack16;
use super::headers::HeaderEmit;
use nsh_api::GRE_PROTO_NSH;
use serde::Deserialize;
use serde::Serialize;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;

pub const GRE_HDR_SZ: usize = 8;
pub const GRE_C_SHIFT: u16 = 15;
pub const GRE_RESERVED0_MASK: u16 = 0x7FF8;
pub const GRE_RESERVED0_SHIFT: u16 = 3;
pub const GRE_VER_MASK: u16 = 0x0007;

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct GreHdr {
    /// Checksum present.
    #[serde(default)]
    pub c: bool,
    /// Only the low 12 bits are available on the wire.
    #[serde(default)]
    pub reserved0: u16,
    /// Only the low 3 bits are available on the wire.
    #[serde(default)]
    pub version: u8,
    pub protocol_type: u16,
    #[serde(default)]
    pub checksum: u16,
    #[serde(default)]
    pub reserved1: u16,
}

impl GreHdr {
    /// A version 0 header announcing an NSH payload.
    pub fn nsh() -> Self {
        Self { protocol_type: GRE_PROTO_NSH, ..Default::default() }
    }
}

impl HeaderEmit for GreHdr {
    type Raw = GreHdrRaw;
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct GreHdrRaw {
    pub c_rsvd0_ver: [u8; 2],
    pub protocol_type: [u8; 2],
    pub checksum: [u8; 2],
    pub reserved1: [u8; 2],
}

impl GreHdrRaw {
    fn word0(&self) -> u16 {
        u16::from_be_bytes(self.c_rsvd0_ver)
    }

    pub fn c(&self) -> bool {
        self.word0() >> GRE_C_SHIFT == 1
    }

    pub fn reserved0(&self) -> u16 {
        (self.word0() & GRE_RESERVED0_MASK) >> GRE_RESERVED0_SHIFT
    }

    pub fn version(&self) -> u8 {
        (self.word0() & GRE_VER_MASK) as u8
    }
}

impl TryFrom<&GreHdr> for GreHdrRaw {
    type Error = BuildError;

    fn try_from(hdr: &GreHdr) -> Result<Self, Self::Error> {
        let c_rsvd0_ver = pack16(&[
            Field::new("gre.c", u32::from(hdr.c), 1),
            Field::new("gre.reserved0", u32::from(hdr.reserved0), 12),
            Field::new("gre.version", u32::from(hdr.version), 3),
        ])?;

        Ok(Self {
            c_rsvd0_ver: c_rsvd0_ver.to_be_bytes(),
            protocol_type: hdr.protocol_type.to_be_bytes(),
            checksum: hdr.checksum.to_be_bytes(),
            reserved1: hdr.reserved1.to_be_bytes(),
        })
    }
}
