// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 The nsh-probe Authors

//! Packing of narrow integer fields into big-endian words.
//!
//! Several header words carry more than one field, e.g. the NSH base
//! header's `version(2) | flags(8) | length(6)`. A word is described
//! as an ordered list of [`Field`]s, most significant first, whose
//! widths add up to a whole number of bytes. Every value is checked
//! against its width before it is shifted into place: a value which
//! does not fit is an error, never a silent truncation into the
//! neighbouring field.

use super::BuildError;

/// One named field of a packed word.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub value: u32,
    pub width: u8,
}

impl Field {
    pub const fn new(name: &'static str, value: u32, width: u8) -> Self {
        Self { name, value, width }
    }

    /// Return the value if it fits in `width` bits.
    #[inline]
    pub fn checked(&self) -> Result<u32, BuildError> {
        if u64::from(self.value) >> self.width != 0 {
            return Err(BuildError::InvalidFieldWidth {
                field: self.name,
                value: u64::from(self.value),
                width: self.width,
            });
        }

        Ok(self.value)
    }
}

fn total_width(fields: &[Field]) -> u32 {
    fields.iter().map(|f| u32::from(f.width)).sum()
}

/// Pack `fields` into a single word, most significant field first.
pub fn pack(fields: &[Field]) -> Result<u32, BuildError> {
    let total = total_width(fields);
    debug_assert!(
        total % 8 == 0 && total <= 32,
        "packed word of {total} bits"
    );

    let mut word = 0u64;
    for f in fields {
        word = (word << f.width) | u64::from(f.checked()?);
    }

    Ok(word as u32)
}

/// Pack `fields` into a 16-bit word.
#[inline]
pub fn pack16(fields: &[Field]) -> Result<u16, BuildError> {
    debug_assert_eq!(total_width(fields), 16);
    pack(fields).map(|w| w as u16)
}

/// Pack `fields` into a 32-bit word.
#[inline]
pub fn pack32(fields: &[Field]) -> Result<u32, BuildError> {
    debug_assert_eq!(total_width(fields), 32);
    pack(fields)
}
