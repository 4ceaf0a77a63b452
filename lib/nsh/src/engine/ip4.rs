// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! A minimal IPv4 header for raw-socket transmission.
//!
//! The total length and checksum are left as zero: the sending stack
//! fills them in when the packet goes out on a raw socket with
//! `IP_HDRINCL`.

use super::BuildError;
use super::bits::Field;
use super::bits::pack16;
use super::headers::HeaderEmit;
use super::resolve::AddrResolver;
use serde::Deserialize;
use serde::Serialize;
use std::net::Ipv4Addr;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;

pub const IPV4_HDR_SZ: usize = 20;
pub const IPV4_VERSION: u8 = 4;
pub const IPV4_HDR_LEN_MIN_WORDS: u8 = 5;
pub const IPV4_SHIM_ID: u16 = 54321;
pub const IPV4_SHIM_TTL: u8 = 255;
pub const IPPROTO_RAW: u8 = 255;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Ipv4ShimHdr {
    pub version: u8,
    /// Header length in 4-byte words.
    pub ihl: u8,
    pub tos: u8,
    pub total_len: u16,
    pub id: u16,
    pub frag_off: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
}

impl Ipv4ShimHdr {
    /// A shim from this host to `dst`, sourced from the address the
    /// local hostname resolves to.
    pub fn new(
        dst: Ipv4Addr,
        resolver: &impl AddrResolver,
    ) -> Result<Self, BuildError> {
        let src = resolver.host_addr_v4().map_err(|source| {
            BuildError::AddrResolution {
                target: "local hostname".to_string(),
                source,
            }
        })?;

        Ok(Self::with_src(src, dst))
    }

    pub fn with_src(src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        Self {
            version: IPV4_VERSION,
            ihl: IPV4_HDR_LEN_MIN_WORDS,
            tos: 0,
            total_len: 0,
            id: IPV4_SHIM_ID,
            frag_off: 0,
            ttl: IPV4_SHIM_TTL,
            protocol: IPPROTO_RAW,
            checksum: 0,
            src,
            dst,
        }
    }
}

impl HeaderEmit for Ipv4ShimHdr {
    type Raw = Ipv4ShimHdrRaw;
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct Ipv4ShimHdrRaw {
    pub ver_ihl: u8,
    pub tos: u8,
    pub total_len: [u8; 2],
    pub id: [u8; 2],
    pub frag_off: [u8; 2],
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: [u8; 2],
    pub src: [u8; 4],
    pub dst: [u8; 4],
}

impl TryFrom<&Ipv4ShimHdr> for Ipv4ShimHdrRaw {
    type Error = BuildError;

    fn try_from(hdr: &Ipv4ShimHdr) -> Result<Self, Self::Error> {
        // Version and IHL share the first byte.
        let ver_ihl_tos = pack16(&[
            Field::new("ipv4.version", u32::from(hdr.version), 4),
            Field::new("ipv4.ihl", u32::from(hdr.ihl), 4),
            Field::new("ipv4.tos", u32::from(hdr.tos), 8),
        ])?
        .to_be_bytes();

        Ok(Self {
            ver_ihl: ver_ihl_tos[0],
            tos: ver_ihl_tos[1],
            total_len: hdr.total_len.to_be_bytes(),
            id: hdr.id.to_be_bytes(),
            frag_off: hdr.frag_off.to_be_bytes(),
            ttl: hdr.ttl,
            protocol: hdr.protocol,
            checksum: hdr.checksum.to_be_bytes(),
            src: hdr.src.octets(),
            dst: hdr.dst.octets(),
        })
    }
}
