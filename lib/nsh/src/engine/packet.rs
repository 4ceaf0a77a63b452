// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! Assembly of complete NSH packets.
//!
//! Every supported packet shape is a variant of [`NshPacket`], and
//! each variant emits its headers in one fixed order. Receivers
//! expect exactly this layout, so the order is not configurable.

use super::BuildError;
use super::ether::EtherHdr;
use super::gre::GreHdr;
use super::headers::HeaderEmit;
use super::nsh::NshBaseHdr;
use super::nsh::NshCtxHdr;
use super::nsh::NshHdr;
use super::trace::TraceReqHdr;
use super::vxlan_gpe::VxlanGpeHdr;
use nsh_api::EncapKind;
use serde::Deserialize;
use serde::Serialize;

/// The outer transport header.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum EncapHdr {
    VxlanGpe(VxlanGpeHdr),
    Gre(GreHdr),
}

impl EncapHdr {
    pub fn name(&self) -> &'static str {
        match self {
            Self::VxlanGpe(_) => "VXLAN-GPE",
            Self::Gre(_) => "GRE",
        }
    }
}

/// A header carried after the NSH context headers.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum InnerHdr {
    Ether(EtherHdr),
    TraceReq(TraceReqHdr),
}

impl InnerHdr {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ether(_) => "ETHER",
            Self::TraceReq(_) => "TRACE-REQ",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NshPacket {
    /// VXLAN-GPE, NSH base, NSH context.
    VxlanGpe { vxlan: VxlanGpeHdr, nsh: NshHdr },

    /// GRE, NSH base, NSH context.
    Gre { gre: GreHdr, nsh: NshHdr },

    /// VXLAN-GPE, NSH base, NSH context, Ethernet.
    Ether { vxlan: VxlanGpeHdr, nsh: NshHdr, ether: EtherHdr },

    /// VXLAN-GPE, NSH base, NSH context, OAM trace request.
    TraceReq { vxlan: VxlanGpeHdr, nsh: NshHdr, trace: TraceReqHdr },
}

impl NshPacket {
    /// Assemble a packet from loose parts, checking that they form the
    /// shape named by `kind`.
    pub fn from_parts(
        kind: EncapKind,
        encap: EncapHdr,
        nsh: NshHdr,
        inner: Option<InnerHdr>,
    ) -> Result<Self, BuildError> {
        use EncapKind::*;

        match (kind, encap, inner) {
            (VxlanGpeNsh, EncapHdr::VxlanGpe(vxlan), None) => {
                Ok(Self::VxlanGpe { vxlan, nsh })
            }

            (GreNsh, EncapHdr::Gre(gre), None) => Ok(Self::Gre { gre, nsh }),

            (
                VxlanGpeNshEther,
                EncapHdr::VxlanGpe(vxlan),
                Some(InnerHdr::Ether(ether)),
            ) => Ok(Self::Ether { vxlan, nsh, ether }),

            (
                VxlanGpeNshTrace,
                EncapHdr::VxlanGpe(vxlan),
                Some(InnerHdr::TraceReq(trace)),
            ) => Ok(Self::TraceReq { vxlan, nsh, trace }),

            (kind, encap, inner) => {
                Err(BuildError::UnsupportedEncap(format!(
                    "{kind} cannot be built from {}/NSH{}",
                    encap.name(),
                    inner.map(|i| format!("/{}", i.name())).unwrap_or_default(),
                )))
            }
        }
    }

    /// Like [`NshPacket::from_parts()`], with the kind given by its tag,
    /// e.g. `"GRE/NSH"`.
    pub fn from_tag(
        tag: &str,
        encap: EncapHdr,
        nsh: NshHdr,
        inner: Option<InnerHdr>,
    ) -> Result<Self, BuildError> {
        let kind = tag
            .parse::<EncapKind>()
            .map_err(BuildError::UnsupportedEncap)?;
        Self::from_parts(kind, encap, nsh, inner)
    }

    pub fn kind(&self) -> EncapKind {
        match self {
            Self::VxlanGpe { .. } => EncapKind::VxlanGpeNsh,
            Self::Gre { .. } => EncapKind::GreNsh,
            Self::Ether { .. } => EncapKind::VxlanGpeNshEther,
            Self::TraceReq { .. } => EncapKind::VxlanGpeNshTrace,
        }
    }

    pub fn nsh(&self) -> &NshHdr {
        match self {
            Self::VxlanGpe { nsh, .. }
            | Self::Gre { nsh, .. }
            | Self::Ether { nsh, .. }
            | Self::TraceReq { nsh, .. } => nsh,
        }
    }

    /// The name and length of each header, in emission order.
    pub fn layout(&self) -> Vec<(&'static str, usize)> {
        let outer = match self {
            Self::Gre { .. } => ("GRE", GreHdr::SIZE),
            _ => ("VXLAN-GPE", VxlanGpeHdr::SIZE),
        };

        let mut layout = vec![
            outer,
            ("NSH-BASE", NshBaseHdr::SIZE),
            ("NSH-CTX", NshCtxHdr::SIZE),
        ];

        match self {
            Self::Ether { .. } => layout.push(("ETHER", EtherHdr::SIZE)),
            Self::TraceReq { .. } => {
                layout.push(("TRACE-REQ", TraceReqHdr::SIZE))
            }
            Self::VxlanGpe { .. } | Self::Gre { .. } => {}
        }

        layout
    }

    /// Return the length of all headers in this packet.
    pub fn hdr_len(&self) -> usize {
        self.layout().iter().map(|(_, len)| len).sum()
    }

    /// Emit every header of the packet into a new buffer.
    pub fn emit_vec(&self) -> Result<Vec<u8>, BuildError> {
        let mut bytes = Vec::with_capacity(self.hdr_len());

        match self {
            Self::VxlanGpe { vxlan, nsh } => {
                vxlan.emit(&mut bytes)?;
                nsh.emit(&mut bytes)?;
            }

            Self::Gre { gre, nsh } => {
                gre.emit(&mut bytes)?;
                nsh.emit(&mut bytes)?;
            }

            Self::Ether { vxlan, nsh, ether } => {
                vxlan.emit(&mut bytes)?;
                nsh.emit(&mut bytes)?;
                ether.emit(&mut bytes)?;
            }

            Self::TraceReq { vxlan, nsh, trace } => {
                vxlan.emit(&mut bytes)?;
                nsh.emit(&mut bytes)?;
                trace.emit(&mut bytes)?;
            }
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::ether::ETHER_TYPE_IPV4;
    use nsh_api::MacAddr;
    use nsh_api::NSH_NEXT_PROTO_ETH;
    use nsh_api::OAM_TRACE_REQ_TYPE;

    fn nsh() -> NshHdr {
        NshHdr {
            base: NshBaseHdr::md_type1(NSH_NEXT_PROTO_ETH, 0x123456, 7),
            ctx: NshCtxHdr {
                network_platform: 1,
                network_shared: 2,
                service_platform: 3,
                service_shared: 4,
            },
        }
    }

    fn ether() -> EtherHdr {
        EtherHdr::new(
            MacAddr::from([2, 0, 0, 0, 0, 1]),
            MacAddr::from([2, 0, 0, 0, 0, 2]),
            ETHER_TYPE_IPV4,
        )
    }

    fn trace() -> TraceReqHdr {
        TraceReqHdr {
            oam_type: OAM_TRACE_REQ_TYPE,
            sil: 3,
            port: 55555,
            ip: [0, 0, 0xFFFF, 0x0A000001],
        }
    }

    fn concat(parts: &[Vec<u8>]) -> Vec<u8> {
        parts.concat()
    }

    #[test]
    fn vxlan_gpe_order() {
        let vxlan = VxlanGpeHdr::nsh(100);
        let pkt = NshPacket::VxlanGpe { vxlan, nsh: nsh() };

        let bytes = pkt.emit_vec().unwrap();
        assert_eq!(
            bytes,
            concat(&[vxlan.emit_vec().unwrap(), nsh().emit_vec().unwrap()])
        );
        assert_eq!(bytes.len(), 32);
        assert_eq!(pkt.hdr_len(), 32);
    }

    #[test]
    fn gre_order() {
        let gre = GreHdr::nsh();
        let pkt = NshPacket::Gre { gre, nsh: nsh() };

        let bytes = pkt.emit_vec().unwrap();
        assert_eq!(
            bytes,
            concat(&[gre.emit_vec().unwrap(), nsh().emit_vec().unwrap()])
        );
        assert_eq!(pkt.kind(), EncapKind::GreNsh);
    }

    #[test]
    fn ether_order() {
        let vxlan = VxlanGpeHdr::nsh(100);
        let pkt = NshPacket::Ether { vxlan, nsh: nsh(), ether: ether() };

        let bytes = pkt.emit_vec().unwrap();
        assert_eq!(
            bytes,
            concat(&[
                vxlan.emit_vec().unwrap(),
                nsh().base.emit_vec().unwrap(),
                nsh().ctx.emit_vec().unwrap(),
                ether().emit_vec().unwrap(),
            ])
        );
        assert_eq!(bytes.len(), 8 + 8 + 16 + 14);
    }

    #[test]
    fn trace_req_order() {
        let vxlan = VxlanGpeHdr::nsh(100);
        let pkt = NshPacket::TraceReq { vxlan, nsh: nsh(), trace: trace() };

        let bytes = pkt.emit_vec().unwrap();
        assert_eq!(
            bytes,
            concat(&[
                vxlan.emit_vec().unwrap(),
                nsh().emit_vec().unwrap(),
                trace().emit_vec().unwrap(),
            ])
        );

        let names: Vec<_> = pkt.layout().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["VXLAN-GPE", "NSH-BASE", "NSH-CTX", "TRACE-REQ"]);
        assert_eq!(pkt.hdr_len(), bytes.len());
    }

    #[test]
    fn from_parts_matches_shape() {
        let vxlan = EncapHdr::VxlanGpe(VxlanGpeHdr::nsh(1));
        let gre = EncapHdr::Gre(GreHdr::nsh());

        for (kind, encap, inner) in [
            (EncapKind::VxlanGpeNsh, vxlan, None),
            (EncapKind::GreNsh, gre, None),
            (EncapKind::VxlanGpeNshEther, vxlan, Some(InnerHdr::Ether(ether()))),
            (
                EncapKind::VxlanGpeNshTrace,
                vxlan,
                Some(InnerHdr::TraceReq(trace())),
            ),
        ] {
            let pkt = NshPacket::from_parts(kind, encap, nsh(), inner).unwrap();
            assert_eq!(pkt.kind(), kind);
            assert_eq!(pkt.nsh(), &nsh());
        }
    }

    #[test]
    fn from_parts_rejects_mismatch() {
        let vxlan = EncapHdr::VxlanGpe(VxlanGpeHdr::nsh(1));
        let gre = EncapHdr::Gre(GreHdr::nsh());

        for (kind, encap, inner) in [
            (EncapKind::GreNsh, vxlan, None),
            (EncapKind::VxlanGpeNsh, gre, None),
            (EncapKind::VxlanGpeNsh, vxlan, Some(InnerHdr::Ether(ether()))),
            (EncapKind::VxlanGpeNshEther, vxlan, None),
            (EncapKind::VxlanGpeNshTrace, gre, Some(InnerHdr::TraceReq(trace()))),
            (EncapKind::VxlanGpeNshTrace, vxlan, Some(InnerHdr::Ether(ether()))),
        ] {
            assert!(matches!(
                NshPacket::from_parts(kind, encap, nsh(), inner),
                Err(BuildError::UnsupportedEncap(_))
            ));
        }
    }

    #[test]
    fn from_tag() {
        let gre = EncapHdr::Gre(GreHdr::nsh());

        let pkt = NshPacket::from_tag("GRE/NSH", gre, nsh(), None).unwrap();
        assert_eq!(pkt.kind(), EncapKind::GreNsh);

        let err = NshPacket::from_tag("MPLS/NSH", gre, nsh(), None).unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedEncap(_)));
        assert_eq!(
            err.to_string(),
            "unsupported encapsulation: unknown encapsulation: MPLS/NSH"
        );
    }

    #[test]
    fn failed_build_yields_nothing() {
        let mut nsh = nsh();
        nsh.base.service_path = 1 << 24;
        let pkt = NshPacket::Gre { gre: GreHdr::nsh(), nsh };

        assert!(matches!(
            pkt.emit_vec(),
            Err(BuildError::InvalidFieldWidth {
                field: "nsh.service_path",
                ..
            })
        ));
    }
}
