// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! Emission of typed headers as their wire bytes.

use super::BuildError;
use zerocopy::Immutable;
use zerocopy::IntoBytes;

/// A header value which can be written to the wire.
///
/// Each header has a `#[repr(C)]` raw counterpart laid out exactly as
/// it appears on the wire. Converting to the raw form is where field
/// widths are checked and packed words are assembled; emitting is
/// then a plain copy of the raw bytes. Because the whole raw header is
/// built before anything is written, a failed emit leaves `dst`
/// untouched.
pub trait HeaderEmit {
    type Raw: IntoBytes + Immutable + for<'a> TryFrom<&'a Self, Error = BuildError>;

    /// The length of the emitted header in bytes.
    const SIZE: usize = size_of::<Self::Raw>();

    /// Validate and pack this header into its wire layout.
    #[inline]
    fn to_raw(&self) -> Result<Self::Raw, BuildError> {
        <Self::Raw as TryFrom<&Self>>::try_from(self)
    }

    /// Append this header's bytes to `dst`.
    fn emit(&self, dst: &mut Vec<u8>) -> Result<(), BuildError> {
        let raw = self.to_raw()?;
        dst.extend_from_slice(raw.as_bytes());
        Ok(())
    }

    /// Return this header's bytes.
    fn emit_vec(&self) -> Result<Vec<u8>, BuildError> {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        self.emit(&mut bytes)?;
        Ok(bytes)
    }
}
