// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use slog::Drain;
use slog::Logger;
use slog::info;
use slog::o;

use nsh::api::EncapKind;
use nsh::engine::ip4::Ipv4ShimHdr;
use nsh::engine::resolve::FixedResolver;
use nsh::engine::resolve::SystemResolver;
use nsh::print::print_packet;
use nshprobe::Probe;
use nshprobe::ProbeCfg;
use nshprobe::SfHop;

/// Build Network Service Header (NSH) probe packets
#[derive(Debug, Parser)]
#[command(version)]
enum Command {
    /// Build the packet described by a probe config.
    Build {
        config: PathBuf,

        /// Put an IPv4 header addressed to this host in front of a
        /// GRE packet.
        #[arg(long)]
        ip_shim: Option<Ipv4Addr>,

        /// Source address of the IPv4 header. Defaults to the address
        /// of the local hostname.
        #[arg(long, requires = "ip_shim")]
        source: Option<Ipv4Addr>,
    },

    /// Build a service path trace request.
    Trace {
        config: PathBuf,

        /// The first service function forwarder on the path.
        #[arg(long)]
        remote: IpAddr,

        /// The port trace reports are sent back to.
        #[arg(long)]
        port: u16,

        /// The address trace reports are sent back to. Defaults to the
        /// local address used to reach `remote`.
        #[arg(long)]
        source: Option<IpAddr>,

        /// Append a service function record, as TYPE:NAME. May be
        /// given more than once.
        #[arg(long = "hop")]
        hops: Vec<SfHop>,
    },
}

fn logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain);
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!("component" => "nshprobe"))
}

fn load(config: &Path) -> anyhow::Result<ProbeCfg> {
    ProbeCfg::load(config)
        .with_context(|| format!("loading probe {}", config.display()))
}

fn main() -> anyhow::Result<()> {
    let log = logger();
    let cmd = Command::parse();

    let probe = match cmd {
        Command::Build { config, ip_shim, source } => {
            let cfg = load(&config)?;
            let pkt = cfg.packet().context("building packet")?;
            let probe = Probe::new(&pkt)?;

            match ip_shim {
                Some(dst) => {
                    anyhow::ensure!(
                        cfg.kind == EncapKind::GreNsh,
                        "an IPv4 shim can only carry {}, not {}",
                        EncapKind::GreNsh,
                        cfg.kind,
                    );

                    let shim = match source {
                        Some(src) => Ipv4ShimHdr::with_src(src, dst),
                        None => {
                            let resolver = SystemResolver::new(log.clone());
                            Ipv4ShimHdr::new(dst, &resolver)
                                .context("building IPv4 shim")?
                        }
                    };
                    probe.with_ip_shim(&shim)?
                }

                None => probe,
            }
        }

        Command::Trace { config, remote, port, source, hops } => {
            let cfg = load(&config)?;
            let remote = SocketAddr::new(remote, port);
            let pkt = match source {
                Some(src) => cfg.trace_packet(remote, &FixedResolver::new(src)),
                None => {
                    cfg.trace_packet(remote, &SystemResolver::new(log.clone()))
                }
            }
            .context("building trace request")?;

            Probe::new(&pkt)?.with_hops(&hops).context("appending hops")?
        }
    };

    info!(log, "built probe"; "len" => probe.bytes.len());
    print_packet(&probe.layout, &probe.bytes)?;
    Ok(())
}
