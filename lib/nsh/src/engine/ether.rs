// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! Ethernet frames carried behind NSH.

use super::BuildError;
use super::headers::HeaderEmit;
use nsh_api::MacAddr;
use serde::Deserialize;
use serde::Serialize;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;

pub const ETHER_TYPE_ETHER: u16 = 0x6558;
pub const ETHER_TYPE_IPV4: u16 = 0x0800;
pub const ETHER_TYPE_ARP: u16 = 0x0806;
pub const ETHER_TYPE_IPV6: u16 = 0x86DD;
pub const ETHER_TYPE_NSH: u16 = 0x894F;

pub const ETHER_ADDR_LEN: usize = 6;
pub const ETHER_HDR_SZ: usize = 14;

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct EtherHdr {
    pub dst: MacAddr,
    pub src: MacAddr,
    pub ethertype: u16,
}

impl EtherHdr {
    pub fn new(dst: MacAddr, src: MacAddr, ethertype: u16) -> Self {
        Self { dst, src, ethertype }
    }
}

impl HeaderEmit for EtherHdr {
    type Raw = EtherHdrRaw;
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct EtherHdrRaw {
    pub dst: [u8; ETHER_ADDR_LEN],
    pub src: [u8; ETHER_ADDR_LEN],
    pub ethertype: [u8; 2],
}

impl EtherHdrRaw {
    pub fn ethertype(&self) -> u16 {
        u16::from_be_bytes(self.ethertype)
    }
}

// Byte-wise fields only; nothing can be out of range.
impl TryFrom<&EtherHdr> for EtherHdrRaw {
    type Error = BuildError;

    fn try_from(hdr: &EtherHdr) -> Result<Self, Self::Error> {
        Ok(Self {
            dst: hdr.dst.bytes(),
            src: hdr.src.bytes(),
            ethertype: hdr.ethertype.to_be_bytes(),
        })
    }
}
