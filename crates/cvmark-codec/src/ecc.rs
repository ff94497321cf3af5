//! Error-correcting code service and its Hamming implementation.

use crate::{CodecError, Digits};

/// Systematic binary error-correcting code with fixed lengths.
pub trait ErrorCorrectingCode {
    /// Raw payload length in digits.
    fn payload_len(&self) -> usize;

    /// Codeword length in digits.
    fn codeword_len(&self) -> usize;

    /// Extend a payload into a codeword.
    fn encode(&self, payload: &Digits) -> Result<Digits, CodecError>;

    /// Recover the payload from a possibly corrupted codeword.
    fn decode(&self, codeword: &Digits) -> Result<Digits, CodecError>;
}

/// Single-error-correcting Hamming code.
///
/// Codeword positions are numbered from 1. Parity digits sit at the
/// power-of-two positions; payload digits fill the remaining positions in
/// MSB-first order. The code corrects one flipped digit. A syndrome pointing
/// past the end of a shortened codeword is reported as uncorrectable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HammingCode {
    payload: usize,
    parity: usize,
}

impl HammingCode {
    /// Smallest Hamming code carrying `payload` digits.
    pub fn new(payload: usize) -> Self {
        let mut parity = 0usize;
        while (1usize << parity) < payload + parity + 1 {
            parity += 1;
        }
        Self { payload, parity }
    }

    #[inline]
    pub fn parity_len(&self) -> usize {
        self.parity
    }

    /// XOR of all 1-based positions holding a set digit.
    pub fn syndrome(codeword: &[bool]) -> usize {
        codeword
            .iter()
            .enumerate()
            .filter(|(_, &bit)| bit)
            .fold(0, |acc, (i, _)| acc ^ (i + 1))
    }

    fn check_len(expected: usize, got: usize) -> Result<(), CodecError> {
        if expected == got {
            Ok(())
        } else {
            Err(CodecError::CodewordLength { expected, got })
        }
    }
}

#[inline]
fn is_parity_position(pos: usize) -> bool {
    pos.is_power_of_two()
}

impl ErrorCorrectingCode for HammingCode {
    #[inline]
    fn payload_len(&self) -> usize {
        self.payload
    }

    #[inline]
    fn codeword_len(&self) -> usize {
        self.payload + self.parity
    }

    fn encode(&self, payload: &Digits) -> Result<Digits, CodecError> {
        Self::check_len(self.payload, payload.len())?;

        let n = self.codeword_len();
        let mut word = vec![false; n];
        let mut data = payload.iter();
        for pos in 1..=n {
            if !is_parity_position(pos) {
                word[pos - 1] = data.next().unwrap_or(false);
            }
        }

        // Parity digits start at zero, so the syndrome of the data alone
        // is exactly the set of parity digits that must be raised.
        let syndrome = Self::syndrome(&word);
        for i in 0..self.parity {
            let pos = 1usize << i;
            word[pos - 1] = syndrome & pos != 0;
        }
        Ok(Digits::from(word))
    }

    fn decode(&self, codeword: &Digits) -> Result<Digits, CodecError> {
        let n = self.codeword_len();
        Self::check_len(n, codeword.len())?;

        let mut word = codeword.as_slice().to_vec();
        let syndrome = Self::syndrome(&word);
        if syndrome > n {
            return Err(CodecError::UncorrectableData { syndrome });
        }
        if syndrome > 0 {
            word[syndrome - 1] = !word[syndrome - 1];
        }

        Ok((1..=n)
            .filter(|&pos| !is_parity_position(pos))
            .map(|pos| word[pos - 1])
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_sizes() {
        assert_eq!(HammingCode::new(1).codeword_len(), 3);
        assert_eq!(HammingCode::new(4).codeword_len(), 7);
        assert_eq!(HammingCode::new(9).codeword_len(), 13);
        assert_eq!(HammingCode::new(11).codeword_len(), 15);
        assert_eq!(HammingCode::new(30).codeword_len(), 36);
    }

    #[test]
    fn classic_7_4_codeword() {
        // Data 1011 -> p1 p2 d1 p4 d2 d3 d4 = 0 1 1 0 0 1 1
        let code = HammingCode::new(4);
        let word = code.encode(&"1011".parse().expect("digits")).expect("encode");
        assert_eq!(word.to_string(), "0110011");
        assert_eq!(HammingCode::syndrome(word.as_slice()), 0);
    }

    #[test]
    fn corrects_every_single_flip() {
        let code = HammingCode::new(9);
        let payload = Digits::from_value(300, 9);
        let word = code.encode(&payload).expect("encode");
        for i in 0..word.len() {
            let mut bits = word.as_slice().to_vec();
            bits[i] = !bits[i];
            let decoded = code.decode(&Digits::from(bits)).expect("decode");
            assert_eq!(decoded, payload, "flip at {i}");
        }
    }

    #[test]
    fn out_of_range_syndrome_is_uncorrectable() {
        let code = HammingCode::new(9);
        let word = code.encode(&Digits::from_value(0, 9)).expect("encode");
        let mut bits = word.as_slice().to_vec();
        // positions 6 and 8 -> syndrome 14, past the 13-digit codeword
        bits[5] = !bits[5];
        bits[7] = !bits[7];
        assert_eq!(
            code.decode(&Digits::from(bits)),
            Err(CodecError::UncorrectableData { syndrome: 14 })
        );
    }

    #[test]
    fn rejects_wrong_lengths() {
        let code = HammingCode::new(9);
        assert!(matches!(
            code.encode(&Digits::from_value(1, 8)),
            Err(CodecError::CodewordLength { expected: 9, got: 8 })
        ));
        assert!(matches!(
            code.decode(&Digits::from_value(1, 12)),
            Err(CodecError::CodewordLength { expected: 13, got: 12 })
        ));
    }
}
