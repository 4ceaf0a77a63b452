// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

use core::fmt;
use core::fmt::Display;
use core::str::FromStr;
use serde::Deserialize;
use serde::Serialize;

/// The closed set of packet shapes the NSH builder knows how to emit.
///
/// The string forms are the tags used by service-function tooling to
/// name each shape, e.g. `"VXLAN/NSH"`.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum EncapKind {
    /// VXLAN-GPE + NSH base + NSH context.
    VxlanGpeNsh,
    /// GRE + NSH base + NSH context.
    GreNsh,
    /// VXLAN-GPE + NSH base + NSH context + inner Ethernet.
    VxlanGpeNshEther,
    /// VXLAN-GPE + NSH base + NSH context + OAM trace request.
    VxlanGpeNshTrace,
}

impl EncapKind {
    pub const ALL: [Self; 4] = [
        Self::VxlanGpeNsh,
        Self::GreNsh,
        Self::VxlanGpeNshEther,
        Self::VxlanGpeNshTrace,
    ];

    pub const fn tag(&self) -> &'static str {
        match self {
            Self::VxlanGpeNsh => "VXLAN/NSH",
            Self::GreNsh => "GRE/NSH",
            Self::VxlanGpeNshEther => "VXLAN/NSH/ETH",
            Self::VxlanGpeNshTrace => "VXLAN/NSH/TRACE",
        }
    }
}

impl FromStr for EncapKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown encapsulation: {s}"))
    }
}

impl TryFrom<String> for EncapKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EncapKind> for String {
    fn from(kind: EncapKind) -> Self {
        kind.tag().to_string()
    }
}

impl Display for EncapKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
