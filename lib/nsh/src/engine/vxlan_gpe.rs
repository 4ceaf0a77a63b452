// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! VXLAN-GPE headers.
//!
//! draft-ietf-nvo3-vxlan-gpe: Generic Protocol Extension for VXLAN
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |R|R|R|R|I|P|R|R|   Reserved    |         Protocol Type         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                VXLAN Network Identifier (VNI) |   Reserved    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use super::BuildError;
use super::bits::Field;
use super::bits::pack32;
use super::headers::HeaderEmit;
use nsh_api::VXLAN_GPE_FLAGS_I_P;
use nsh_api::VXLAN_GPE_NEXT_PROTO_NSH;
use serde::Deserialize;
use serde::Serialize;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;

pub const VXLAN_GPE_HDR_SZ: usize = 8;
pub const VNI_BITS: u8 = 24;

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct VxlanGpeHdr {
    pub flags: u8,
    #[serde(default)]
    pub reserved: u8,
    pub protocol_type: u16,
    /// Only the low 24 bits are available on the wire.
    pub vni: u32,
    #[serde(default)]
    pub reserved2: u8,
}

impl VxlanGpeHdr {
    /// A header announcing an NSH payload on the given VNI.
    pub fn nsh(vni: u32) -> Self {
        Self {
            flags: VXLAN_GPE_FLAGS_I_P,
            protocol_type: VXLAN_GPE_NEXT_PROTO_NSH,
            vni,
            ..Default::default()
        }
    }
}

impl HeaderEmit for VxlanGpeHdr {
    type Raw = VxlanGpeHdrRaw;
}

#[repr(C)]
#[derive(
    Clone, Copy, Debug, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
)]
pub struct VxlanGpeHdrRaw {
    pub flags: u8,
    pub reserved: u8,
    pub protocol_type: [u8; 2],
    pub vni_reserved2: [u8; 4],
}

impl VxlanGpeHdrRaw {
    pub fn protocol_type(&self) -> u16 {
        u16::from_be_bytes(self.protocol_type)
    }

    pub fn vni(&self) -> u32 {
        u32::from_be_bytes(self.vni_reserved2) >> 8
    }

    pub fn reserved2(&self) -> u8 {
        self.vni_reserved2[3]
    }
}

impl TryFrom<&VxlanGpeHdr> for VxlanGpeHdrRaw {
    type Error = BuildError;

    fn try_from(hdr: &VxlanGpeHdr) -> Result<Self, Self::Error> {
        let vni_reserved2 = pack32(&[
            Field::new("vxlan_gpe.vni", hdr.vni, VNI_BITS),
            Field::new("vxlan_gpe.reserved2", u32::from(hdr.reserved2), 8),
        ])?;

        Ok(Self {
            flags: hdr.flags,
            reserved: hdr.reserved,
            protocol_type: hdr.protocol_type.to_be_bytes(),
            vni_reserved2: vni_reserved2.to_be_bytes(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn emit_nsh_over_vxlan_gpe() {
        let hdr = VxlanGpeHdr {
            flags: 0x04,
            reserved: 0,
            protocol_type: 0x894F,
            vni: 0x000001,
            reserved2: 0,
        };

        #[rustfmt::skip]
        let expected = vec![
            // flags, reserved
            0x04, 0x00,
            // protocol type
            0x89, 0x4F,
            // vni + reserved
            0x00, 0x00, 0x01, 0x00,
        ];
        assert_eq!(hdr.emit_vec().unwrap(), expected);
        assert_eq!(VxlanGpeHdr::SIZE, VXLAN_GPE_HDR_SZ);
    }

    #[test]
    fn vni_and_reserved_share_a_word() {
        let hdr = VxlanGpeHdr {
            vni: 0xABCDEF,
            reserved2: 0x12,
            ..VxlanGpeHdr::nsh(0)
        };

        let bytes = hdr.emit_vec().unwrap();
        assert_eq!(&bytes[4..], &[0xAB, 0xCD, 0xEF, 0x12]);

        let raw = VxlanGpeHdrRaw::read_from_bytes(&bytes[..]).unwrap();
        assert_eq!(raw.vni(), 0xABCDEF);
        assert_eq!(raw.reserved2(), 0x12);
        assert_eq!(raw.protocol_type(), VXLAN_GPE_NEXT_PROTO_NSH);
    }

    #[test]
    fn vni_too_wide() {
        let hdr = VxlanGpeHdr::nsh(1 << 24);
        let mut dst = vec![0xAA];

        assert!(matches!(
            hdr.emit(&mut dst),
            Err(BuildError::InvalidFieldWidth {
                field: "vxlan_gpe.vni",
                value: 0x100_0000,
                width: 24,
            })
        ));
        assert_eq!(dst, vec![0xAA]);
    }
}
