// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! Print built packets in a human-friendly manner.

use std::io::Write;
use tabwriter::TabWriter;

/// Bytes per line of the hex dump.
const HEX_LINE: usize = 16;

/// Print a packet's headers and bytes.
pub fn print_packet(
    layout: &[(&str, usize)],
    bytes: &[u8],
) -> std::io::Result<()> {
    print_packet_into(&mut std::io::stdout(), layout, bytes)
}

/// Print a packet's headers and bytes into a given writer.
///
/// `layout` names the headers at the front of `bytes`, in order. Any
/// bytes left over past the last header are service-function path
/// trace records and are shown as a single `SF-TRACE` entry.
pub fn print_packet_into(
    writer: &mut impl Write,
    layout: &[(&str, usize)],
    bytes: &[u8],
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);
    writeln!(t, "HEADER\tOFFSET\tLEN\tBYTES")?;

    let mut offset = 0;
    for (name, len) in layout {
        let end = (offset + len).min(bytes.len());
        writeln!(t, "{name}\t{offset}\t{len}\t{}", hex(&bytes[offset..end]))?;
        offset = end;
    }

    if offset < bytes.len() {
        writeln!(
            t,
            "SF-TRACE\t{offset}\t{}\t{}",
            bytes.len() - offset,
            hex(&bytes[offset..])
        )?;
    }
    t.flush()?;

    writeln!(t, "\n{} bytes", bytes.len())?;
    for (i, line) in bytes.chunks(HEX_LINE).enumerate() {
        writeln!(t, "{:04x}\t{}", i * HEX_LINE, hex(line))?;
    }
    t.flush()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}
