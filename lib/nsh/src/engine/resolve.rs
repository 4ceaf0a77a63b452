// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! Discovery of the local addresses embedded in outgoing headers.
//!
//! This is the only part of the engine which touches the network, so
//! it sits behind the [`AddrResolver`] trait. Header builders take a
//! resolver as an argument; tests hand them a [`FixedResolver`].

use slog::Logger;
use slog::debug;
use std::io;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::Ipv6Addr;
use std::net::SocketAddr;
use std::net::UdpSocket;

pub trait AddrResolver {
    /// Return the local address this host would use to reach `remote`.
    fn local_addr_for(&self, remote: SocketAddr) -> io::Result<IpAddr>;

    /// Return the IPv4 address the local hostname resolves to.
    fn host_addr_v4(&self) -> io::Result<Ipv4Addr>;
}

/// Resolve addresses by asking the host's routing table and resolver.
///
/// Both lookups block. Callers wanting a bound on how long they wait
/// need to run them on a thread of their own.
#[derive(Clone, Debug)]
pub struct SystemResolver {
    log: Logger,
}

impl SystemResolver {
    pub fn new(log: Logger) -> Self {
        Self { log }
    }
}

impl AddrResolver for SystemResolver {
    fn local_addr_for(&self, remote: SocketAddr) -> io::Result<IpAddr> {
        let any: SocketAddr = match remote {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        // Connecting a datagram socket only performs the route lookup
        // and binds the local end; no packet leaves the host.
        let sock = UdpSocket::bind(any)?;
        sock.connect(remote)?;
        let local = sock.local_addr()?.ip();

        debug!(self.log, "resolved local address";
            "remote" => %remote,
            "local" => %local
        );
        Ok(local)
    }

    fn host_addr_v4(&self) -> io::Result<Ipv4Addr> {
        let host = dns_lookup::get_hostname()?;
        let addr = dns_lookup::lookup_host(&host)?
            .into_iter()
            .find_map(|addr| match addr {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no IPv4 address for host {host}"),
                )
            })?;

        debug!(self.log, "resolved host address";
            "host" => &host,
            "addr" => %addr
        );
        Ok(addr)
    }
}

/// A resolver with predetermined answers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedResolver {
    pub local: IpAddr,
    pub host: Ipv4Addr,
}

impl FixedResolver {
    /// Answer every query with `addr`. An IPv6 `addr` leaves the host
    /// lookup with nothing to answer.
    pub fn new(addr: IpAddr) -> Self {
        let host = match addr {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(_) => Ipv4Addr::UNSPECIFIED,
        };

        Self { local: addr, host }
    }
}

impl AddrResolver for FixedResolver {
    fn local_addr_for(&self, _remote: SocketAddr) -> io::Result<IpAddr> {
        Ok(self.local)
    }

    fn host_addr_v4(&self) -> io::Result<Ipv4Addr> {
        if self.host.is_unspecified() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "no fixed IPv4 host address",
            ));
        }

        Ok(self.host)
    }
}
