// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! NSH probe construction library
//!
//! A probe is described by a TOML file naming the packet shape and
//! the values of each of its headers, for example:
//!
//! ```toml
//! kind = "VXLAN/NSH"
//!
//! [vxlan_gpe]
//! flags = 0x0C
//! protocol_type = 0x0004
//! vni = 500
//!
//! [nsh.base]
//! length = 6
//! md_type = 1
//! next_protocol = 3
//! service_path = 0x123456
//! service_index = 7
//!
//! [nsh.ctx]
//! network_platform = 0xAABBCCDD
//! ```

use nsh::BuildError;
use nsh::api::EncapKind;
use nsh::api::OAM_TRACE_REQ_TYPE;
use nsh::engine::ether::EtherHdr;
use nsh::engine::gre::GreHdr;
use nsh::engine::headers::HeaderEmit;
use nsh::engine::ip4::Ipv4ShimHdr;
use nsh::engine::nsh::NshHdr;
use nsh::engine::packet::EncapHdr;
use nsh::engine::packet::InnerHdr;
use nsh::engine::packet::NshPacket;
use nsh::engine::resolve::AddrResolver;
use nsh::engine::trace::TraceReqHdr;
use nsh::engine::trace::append_sf_hop;
use nsh::engine::vxlan_gpe::VxlanGpeHdr;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CfgError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse probe config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{kind} probes require a [{table}] table")]
    MissingTable { kind: EncapKind, table: &'static str },

    #[error("{kind} probes cannot carry a [{table}] table")]
    UnexpectedTable { kind: EncapKind, table: &'static str },

    #[error("{0} probes are built from a remote address, use trace")]
    NeedsRemote(EncapKind),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// The OAM fields of a trace request. The report address and port are
/// supplied when the probe is built.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct TraceCfg {
    pub oam_type: u8,
    pub sil: u8,
}

impl Default for TraceCfg {
    fn default() -> Self {
        Self { oam_type: OAM_TRACE_REQ_TYPE, sil: 0 }
    }
}

/// The contents of a probe config file.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProbeCfg {
    pub kind: EncapKind,
    pub vxlan_gpe: Option<VxlanGpeHdr>,
    pub gre: Option<GreHdr>,
    pub nsh: NshHdr,
    pub ether: Option<EtherHdr>,
    pub trace: Option<TraceCfg>,
}

impl FromStr for ProbeCfg {
    type Err = CfgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl ProbeCfg {
    /// Read and parse a probe config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CfgError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| CfgError::Read {
            path: path.display().to_string(),
            source,
        })?;
        s.parse()
    }

    fn missing(&self, table: &'static str) -> CfgError {
        CfgError::MissingTable { kind: self.kind, table }
    }

    fn unexpected(&self, table: &'static str) -> CfgError {
        CfgError::UnexpectedTable { kind: self.kind, table }
    }

    /// The outer header. Exactly one of `[gre]` and `[vxlan_gpe]` may
    /// be given, and it must match the kind.
    fn encap(&self) -> Result<EncapHdr, CfgError> {
        match self.kind {
            EncapKind::GreNsh => {
                if self.vxlan_gpe.is_some() {
                    return Err(self.unexpected("vxlan_gpe"));
                }
                self.gre.map(EncapHdr::Gre).ok_or_else(|| self.missing("gre"))
            }

            _ => {
                if self.gre.is_some() {
                    return Err(self.unexpected("gre"));
                }
                self.vxlan_gpe
                    .map(EncapHdr::VxlanGpe)
                    .ok_or_else(|| self.missing("vxlan_gpe"))
            }
        }
    }

    /// Build the packet this config describes. Trace requests need a
    /// remote, see [`ProbeCfg::trace_packet()`].
    pub fn packet(&self) -> Result<NshPacket, CfgError> {
        match self.kind {
            EncapKind::VxlanGpeNshTrace => {
                return Err(CfgError::NeedsRemote(self.kind));
            }

            EncapKind::VxlanGpeNshEther if self.ether.is_none() => {
                return Err(self.missing("ether"));
            }

            _ => {}
        }

        if self.trace.is_some() {
            return Err(self.unexpected("trace"));
        }

        // An [ether] table on any other kind is refused by from_parts.
        let inner = self.ether.map(InnerHdr::Ether);
        Ok(NshPacket::from_parts(self.kind, self.encap()?, self.nsh, inner)?)
    }

    /// Build a trace request whose reports are sent to this host, on
    /// the local address used to reach `remote`.
    pub fn trace_packet(
        &self,
        remote: SocketAddr,
        resolver: &impl AddrResolver,
    ) -> Result<NshPacket, CfgError> {
        if self.ether.is_some() {
            return Err(self.unexpected("ether"));
        }

        let encap = self.encap()?;
        let trace = self.trace.unwrap_or_default();
        let hdr = TraceReqHdr::for_remote(
            trace.oam_type,
            trace.sil,
            remote,
            resolver,
        )?;

        Ok(NshPacket::from_parts(
            self.kind,
            encap,
            self.nsh,
            Some(InnerHdr::TraceReq(hdr)),
        )?)
    }
}

/// A service function hop, given on the command line as `TYPE:NAME`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SfHop {
    pub sf_type: String,
    pub sf_name: String,
}

impl FromStr for SfHop {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((sf_type, sf_name)) => Ok(Self {
                sf_type: sf_type.to_string(),
                sf_name: sf_name.to_string(),
            }),

            None => Err(format!("expected TYPE:NAME, got {s}")),
        }
    }
}

/// The bytes of a built probe and the headers they are made of.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Probe {
    pub layout: Vec<(&'static str, usize)>,
    pub bytes: Vec<u8>,
}

impl Probe {
    pub fn new(pkt: &NshPacket) -> Result<Self, BuildError> {
        Ok(Self { layout: pkt.layout(), bytes: pkt.emit_vec()? })
    }

    /// Put an IPv4 header in front of the packet.
    pub fn with_ip_shim(
        mut self,
        shim: &Ipv4ShimHdr,
    ) -> Result<Self, BuildError> {
        let mut bytes = shim.emit_vec()?;
        bytes.append(&mut self.bytes);
        self.layout.insert(0, ("IPV4", Ipv4ShimHdr::SIZE));
        Ok(Self { layout: self.layout, bytes })
    }

    /// Append a trace record for each hop, in order.
    pub fn with_hops(mut self, hops: &[SfHop]) -> Result<Self, BuildError> {
        for hop in hops {
            self.bytes =
                append_sf_hop(self.bytes, &hop.sf_type, &hop.sf_name)?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nsh::engine::nsh::NshCtxHdr;
    use nsh::engine::resolve::FixedResolver;

    const GRE_PROBE: &str = r#"
        kind = "GRE/NSH"

        [gre]
        protocol_type = 0x894F

        [nsh.base]
        length = 6
        md_type = 1
        next_protocol = 1
        service_path = 0x000042
        service_index = 255
    "#;

    const TRACE_PROBE: &str = r#"
        kind = "VXLAN/NSH/TRACE"

        [vxlan_gpe]
        flags = 0x0C
        protocol_type = 4
        vni = 1

        [nsh.base]
        flags = 0x80
        length = 6
        md_type = 1
        next_protocol = 5
        service_path = 0x000042
        service_index = 255

        [trace]
        sil = 250
    "#;

    #[test]
    fn parse_gre() {
        let cfg: ProbeCfg = GRE_PROBE.parse().unwrap();
        assert_eq!(cfg.kind, EncapKind::GreNsh);
        assert_eq!(cfg.gre, Some(GreHdr::nsh()));
        assert_eq!(cfg.nsh.ctx, NshCtxHdr::default());
        assert_eq!(cfg.trace, None);

        let pkt = cfg.packet().unwrap();
        assert_eq!(pkt.kind(), EncapKind::GreNsh);
        assert_eq!(pkt.nsh().base.service_path, 0x42);
    }

    #[test]
    fn trace_needs_remote() {
        let cfg: ProbeCfg = TRACE_PROBE.parse().unwrap();
        assert!(matches!(
            cfg.packet(),
            Err(CfgError::NeedsRemote(EncapKind::VxlanGpeNshTrace))
        ));
    }

    #[test]
    fn trace_defaults() {
        let cfg: ProbeCfg = TRACE_PROBE.parse().unwrap();
        assert_eq!(
            cfg.trace,
            Some(TraceCfg { oam_type: OAM_TRACE_REQ_TYPE, sil: 250 })
        );

        let resolver = FixedResolver::new("10.0.0.1".parse().unwrap());
        let remote = "10.0.0.2:4790".parse().unwrap();
        let pkt = cfg.trace_packet(remote, &resolver).unwrap();
        let NshPacket::TraceReq { trace, .. } = pkt else {
            panic!("expected trace request: {pkt:?}");
        };
        assert_eq!(trace.sil, 250);
        assert_eq!(trace.port, 4790);
        assert_eq!(trace.addr(), resolver.local);
    }

    const VXLAN_PROBE: &str = r#"
        kind = "VXLAN/NSH"

        [vxlan_gpe]
        flags = 0x0C
        protocol_type = 4
        vni = 1

        [nsh.base]
        length = 6
        md_type = 1
        next_protocol = 3
        service_path = 0x000042
        service_index = 255
    "#;

    const VXLAN_TABLE: &str =
        "[vxlan_gpe]\nflags = 0x0C\nprotocol_type = 4\nvni = 1";
    const GRE_TABLE: &str = "[gre]\nprotocol_type = 0x894F";
    const ETHER_TABLE: &str = r#"
        [ether]
        dst = "A8:40:25:00:00:01"
        src = "A8:40:25:00:00:02"
        ethertype = 0x0800
    "#;

    fn with_table(base: &str, table: &str) -> ProbeCfg {
        format!("{base}\n{table}\n").parse().unwrap()
    }

    fn unexpected_table(res: Result<NshPacket, CfgError>) -> &'static str {
        match res {
            Err(CfgError::UnexpectedTable { table, .. }) => table,
            res => panic!("expected an unexpected table error: {res:?}"),
        }
    }

    #[test]
    fn missing_encap_table() {
        let cfg: ProbeCfg = GRE_PROBE
            .replace("[gre]", "")
            .replace("protocol_type = 0x894F", "")
            .parse()
            .unwrap();
        let err = cfg.packet().unwrap_err();
        assert_eq!(err.to_string(), "GRE/NSH probes require a [gre] table");
    }

    #[test]
    fn gre_table_on_vxlan() {
        let cfg = with_table(VXLAN_PROBE, GRE_TABLE);
        assert_eq!(unexpected_table(cfg.packet()), "gre");
    }

    #[test]
    fn vxlan_table_on_gre() {
        let cfg = with_table(GRE_PROBE, VXLAN_TABLE);
        let err = cfg.packet().unwrap_err();
        assert_eq!(
            err.to_string(),
            "GRE/NSH probes cannot carry a [vxlan_gpe] table"
        );
    }

    #[test]
    fn ether_table_on_vxlan() {
        let cfg = with_table(VXLAN_PROBE, ETHER_TABLE);
        assert!(matches!(
            cfg.packet(),
            Err(CfgError::Build(BuildError::UnsupportedEncap(_)))
        ));

        let cfg = with_table(GRE_PROBE, ETHER_TABLE);
        assert!(matches!(
            cfg.packet(),
            Err(CfgError::Build(BuildError::UnsupportedEncap(_)))
        ));
    }

    #[test]
    fn trace_table_on_vxlan() {
        let cfg = with_table(VXLAN_PROBE, "[trace]\nsil = 1");
        assert_eq!(unexpected_table(cfg.packet()), "trace");
    }

    #[test]
    fn ether_table_on_trace() {
        let cfg = with_table(TRACE_PROBE, ETHER_TABLE);
        let resolver = FixedResolver::new("10.0.0.1".parse().unwrap());
        let remote = "10.0.0.2:4790".parse().unwrap();
        assert_eq!(
            unexpected_table(cfg.trace_packet(remote, &resolver)),
            "ether"
        );
    }

    #[test]
    fn every_foreign_table_refused() {
        let tables = format!("{GRE_TABLE}\n{ETHER_TABLE}\n[trace]\nsil = 1");
        let cfg = with_table(VXLAN_PROBE, &tables);
        assert!(cfg.packet().is_err());

        let cfg = with_table(VXLAN_PROBE, "");
        assert_eq!(cfg.packet().unwrap().kind(), EncapKind::VxlanGpeNsh);
    }

    #[test]
    fn trace_with_wrong_kind() {
        let cfg: ProbeCfg = TRACE_PROBE
            .replace("VXLAN/NSH/TRACE", "VXLAN/NSH")
            .parse()
            .unwrap();
        let resolver = FixedResolver::new("10.0.0.1".parse().unwrap());
        let remote = "10.0.0.2:4790".parse().unwrap();
        assert!(matches!(
            cfg.trace_packet(remote, &resolver),
            Err(CfgError::Build(BuildError::UnsupportedEncap(_)))
        ));
    }

    #[test]
    fn unknown_kind() {
        let res = GRE_PROBE.replace("GRE/NSH", "MPLS/NSH").parse::<ProbeCfg>();
        assert!(matches!(res, Err(CfgError::Parse(_))));
    }

    #[test]
    fn parse_hops() {
        assert_eq!(
            "firewall:fw-1".parse::<SfHop>().unwrap(),
            SfHop { sf_type: "firewall".into(), sf_name: "fw-1".into() }
        );
        assert_eq!(
            ":a:b".parse::<SfHop>().unwrap(),
            SfHop { sf_type: "".into(), sf_name: "a:b".into() }
        );
        assert!("firewall".parse::<SfHop>().is_err());
    }

    #[test]
    fn probe_with_shim() {
        let cfg: ProbeCfg = GRE_PROBE.parse().unwrap();
        let shim = Ipv4ShimHdr::with_src(
            "10.0.0.1".parse().unwrap(),
            "10.0.0.2".parse().unwrap(),
        );
        let probe = Probe::new(&cfg.packet().unwrap())
            .unwrap()
            .with_ip_shim(&shim)
            .unwrap();

        assert_eq!(probe.layout[0], ("IPV4", 20));
        assert_eq!(probe.layout[1], ("GRE", 8));
        assert_eq!(probe.bytes.len(), 20 + 8 + 8 + 16);
        assert_eq!(probe.bytes[0], 0x45);
        assert_eq!(&probe.bytes[20..24], &[0x00, 0x00, 0x89, 0x4F]);
    }
}
