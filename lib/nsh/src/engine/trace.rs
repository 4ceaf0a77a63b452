// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! OAM trace requests and the service-function path trace.
//!
//! A trace request follows the NSH context headers and tells each
//! service function where to send its report:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |   OAM Type    |      SIL      |         Dest Port             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                      Dest IP Address                          |
//! |                   (IPv6 or IPv4-mapped IPv6)                  |
//! |                                                               |
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! As the probe travels the chain each hop appends a record of itself
//! to the packet: its type and name, each as a one-byte length in
//! 4-byte words followed by the zero-padded string.

use super::BuildError;
use super::headers::HeaderEmit;
use super::resolve::AddrResolver;
use serde::Deserialize;
use serde::Serialize;
use std::net::IpAddr;
use std::net::Ipv6Addr;
use std::net::SocketAddr;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;

pub const TRACE_REQ_HDR_SZ: usize = 20;

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct TraceReqHdr {
    pub oam_type: u8,
    /// Service index limit. Carried as-is; its interpretation is up
    /// to the service functions.
    pub sil: u8,
    /// The port trace reports are sent to.
    pub port: u16,
    /// The prober's address, see [`trace_words()`].
    pub ip: [u32; 4],
}

impl TraceReqHdr {
    /// Build a trace request whose reports come back to this host.
    ///
    /// The report address is whichever local address the host would
    /// use to reach `remote`.
    pub fn for_remote(
        oam_type: u8,
        sil: u8,
        remote: SocketAddr,
        resolver: &impl AddrResolver,
    ) -> Result<Self, BuildError> {
        let local = resolver.local_addr_for(remote).map_err(|source| {
            BuildError::AddrResolution { target: remote.to_string(), source }
        })?;

        Ok(Self { oam_type, sil, port: remote.port(), ip: trace_words(local) })
    }

    pub fn addr(&self) -> IpAddr {
        let v6 = Ipv6Addr::from(
            self.ip.iter().fold(0u128, |acc, w| (acc << 32) | u128::from(*w)),
        );

        match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        }
    }
}

/// Split an address into the four big-endian words of a trace
/// request. IPv4 addresses are carried IPv4-mapped (`::ffff:a.b.c.d`).
pub fn trace_words(addr: IpAddr) -> [u32; 4] {
    let v6 = match addr {
        IpAddr::V4(v4) => v4.to_ipv6_mapped(),
        IpAddr::V6(v6) => v6,
    };

    let bits = u128::from(v6);
    [(bits >> 96) as u32, (bits >> 64) as u32, (bits >> 32) as u32, bits as u32]
}

impl HeaderEmit for TraceReqHdr {
    type Raw = TraceReqHdrRaw;
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct TraceReqHdrRaw {
    pub oam_type: u8,
    pub sil: u8,
    pub port: [u8; 2],
    pub ip: [[u8; 4]; 4],
}

impl TryFrom<&TraceReqHdr> for TraceReqHdrRaw {
    type Error = BuildError;

    fn try_from(hdr: &TraceReqHdr) -> Result<Self, Self::Error> {
        Ok(Self {
            oam_type: hdr.oam_type,
            sil: hdr.sil,
            port: hdr.port.to_be_bytes(),
            ip: hdr.ip.map(u32::to_be_bytes),
        })
    }
}

/// Round `x` up to the next multiple of 4.
#[inline]
pub const fn roundup4(x: usize) -> usize {
    if x % 4 == 0 { x } else { x + 4 - x % 4 }
}

/// Return the number of bytes [`append_sf_hop()`] adds for this hop.
pub fn sf_hop_len(sf_type: &str, sf_name: &str) -> usize {
    2 + roundup4(sf_type.len()) + roundup4(sf_name.len())
}

/// Return the word count written ahead of a path trace field.
fn sf_field_words(field: &'static str, s: &str) -> Result<u8, BuildError> {
    let words = roundup4(s.len()) / 4;
    u8::try_from(words).map_err(|_| BuildError::InvalidFieldWidth {
        field,
        value: words as u64,
        width: 8,
    })
}

fn push_sf_field(buf: &mut Vec<u8>, words: u8, s: &str) {
    buf.push(words);
    buf.extend_from_slice(s.as_bytes());
    buf.resize(buf.len() + roundup4(s.len()) - s.len(), 0);
}

/// Append one service function's record to a trace packet.
///
/// The bytes already in `buf` are never touched. If either string is
/// too long to describe with a one-byte word count, nothing is
/// appended and an error is returned.
pub fn append_sf_hop(
    mut buf: Vec<u8>,
    sf_type: &str,
    sf_name: &str,
) -> Result<Vec<u8>, BuildError> {
    let type_words = sf_field_words("sf_type", sf_type)?;
    let name_words = sf_field_words("sf_name", sf_name)?;

    buf.reserve(sf_hop_len(sf_type, sf_name));
    push_sf_field(&mut buf, type_words, sf_type);
    push_sf_field(&mut buf, name_words, sf_name);
    Ok(buf)
}
