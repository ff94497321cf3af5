//! MSB-first binary digit strings.

use std::fmt;
use std::str::FromStr;

use crate::CodecError;

/// Sequence of binary digits, most significant first.
///
/// This is the representation exchanged with the error-correcting code;
/// `Display`/`FromStr` use the `'0'`/`'1'` text form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Digits(Vec<bool>);

impl Digits {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// `bits` low-order bits of `value`, MSB first.
    pub fn from_value(value: u64, bits: usize) -> Self {
        Self(
            (0..bits)
                .rev()
                .map(|i| i < 64 && (value >> i) & 1 == 1)
                .collect(),
        )
    }

    /// Accumulate the digits MSB first. Digits beyond 64 shift out.
    pub fn to_value(&self) -> u64 {
        self.0
            .iter()
            .fold(0u64, |acc, &bit| (acc << 1) | u64::from(bit))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    #[inline]
    pub fn push(&mut self, bit: bool) {
        self.0.push(bit);
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    /// First `len` digits.
    pub fn prefix(&self, len: usize) -> Digits {
        Digits(self.0[..len.min(self.0.len())].to_vec())
    }
}

impl From<Vec<bool>> for Digits {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

impl FromIterator<bool> for Digits {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Digits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for Digits {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(CodecError::InvalidData {
                    input: s.to_string(),
                    reason: "binary digits must be '0' or '1'",
                }),
            })
            .collect()
    }
}
