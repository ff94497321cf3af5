//! Classified cell matrix to payload value.

use serde::Serialize;

use crate::{BitMatrix, CodecError, Digits, ErrorCorrectingCode, MarkerProfile};

/// Value recovered from one marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DecodedMarker {
    pub value: u64,
    /// At least one codeword digit was repaired.
    pub corrected: bool,
}

/// Payload-grid view of `matrix`, which is either the bare payload grid or
/// the grid with its border rings.
fn payload_bits(profile: &MarkerProfile, matrix: &BitMatrix) -> Result<Vec<bool>, CodecError> {
    let offset = if (matrix.cols, matrix.rows) == (profile.marker_cols(), profile.marker_rows()) {
        profile.border
    } else if (matrix.cols, matrix.rows) == (profile.width, profile.height) {
        0
    } else {
        return Err(CodecError::MatrixShape {
            expected_cols: profile.marker_cols(),
            expected_rows: profile.marker_rows(),
            got_cols: matrix.cols,
            got_rows: matrix.rows,
        });
    };

    let mut bits = Vec::with_capacity(profile.cell_count());
    for row in offset..offset + profile.height {
        for col in offset..offset + profile.width {
            bits.push(matrix.get(col, row).unwrap_or(false));
        }
    }
    Ok(bits)
}

/// Concatenate the data cells in scan order, skipping orientation sentinels.
pub fn extract_codeword(profile: &MarkerProfile, matrix: &BitMatrix) -> Result<Digits, CodecError> {
    Ok(payload_bits(profile, matrix)?
        .into_iter()
        .enumerate()
        .filter(|&(i, _)| !profile.is_orientation_index(i))
        .map(|(_, bit)| bit)
        .collect())
}

/// Whether the orientation sentinels read `set, set, unset`.
///
/// Profiles without sentinels always match.
pub fn orientation_matches(profile: &MarkerProfile, matrix: &BitMatrix) -> Result<bool, CodecError> {
    let Some([a, b, c]) = profile.orientation_indices() else {
        return Ok(true);
    };
    let bits = payload_bits(profile, matrix)?;
    Ok(bits[a] && bits[b] && !bits[c])
}

/// Decode the data-cell digits of one marker.
///
/// Only the first codeword-length digits are used; trailing spare cells
/// are ignored.
pub fn decode_digits(profile: &MarkerProfile, digits: &Digits) -> Result<DecodedMarker, CodecError> {
    let code = profile.code();
    let received = digits.prefix(code.codeword_len());
    let payload = code.decode(&received)?;
    let corrected = code.encode(&payload)? != received;
    if corrected {
        log::trace!("{}: repaired codeword {received}", profile.name);
    }
    Ok(DecodedMarker {
        value: payload.to_value(),
        corrected,
    })
}

/// Decode a classified matrix (with or without its border rings).
pub fn decode_matrix(profile: &MarkerProfile, matrix: &BitMatrix) -> Result<DecodedMarker, CodecError> {
    decode_digits(profile, &extract_codeword(profile, matrix)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode_payload, lookup, PROFILES};

    fn bordered(profile: &MarkerProfile, value: u64) -> BitMatrix {
        let payload = encode_payload(profile, value).expect("encode").to_bits();
        let b = profile.border;
        BitMatrix::from_fn(profile.marker_cols(), profile.marker_rows(), |c, r| {
            let inside = (b..b + profile.width).contains(&c) && (b..b + profile.height).contains(&r);
            if inside {
                payload.get(c - b, r - b).unwrap_or(false)
            } else {
                true
            }
        })
    }

    #[test]
    fn every_value_round_trips() {
        for p in PROFILES.iter().filter(|p| p.payload_bits <= 11) {
            for v in 0..p.value_limit() {
                let decoded = decode_matrix(p, &bordered(p, v)).expect("decode");
                assert_eq!(decoded, DecodedMarker { value: v, corrected: false }, "{} {v}", p.name);
            }
        }
    }

    #[test]
    fn large_profiles_round_trip_samples() {
        for p in PROFILES.iter().filter(|p| p.payload_bits > 11) {
            let limit = p.value_limit();
            for v in [0, 1, limit / 3, limit / 2 + 7, limit - 1] {
                let bare = encode_payload(p, v).expect("encode").to_bits();
                assert_eq!(decode_matrix(p, &bare).expect("decode").value, v);
            }
        }
    }

    #[test]
    fn single_flip_is_corrected() {
        let p = lookup("44O").expect("44O");
        let mut m = bordered(&p, 300);
        // payload cell (1, 0) is the first data cell
        m.toggle(p.border + 1, p.border);
        let decoded = decode_matrix(&p, &m).expect("decode");
        assert_eq!(decoded, DecodedMarker { value: 300, corrected: true });
    }

    #[test]
    fn double_flip_past_codeword_is_uncorrectable() {
        let p = lookup("44O").expect("44O");
        let mut m = encode_payload(&p, 0).expect("encode").to_bits();
        // codeword positions 6 and 8 live in payload cells 6 and 8
        m.toggle(2, 1);
        m.toggle(0, 2);
        assert_eq!(
            decode_matrix(&p, &m),
            Err(CodecError::UncorrectableData { syndrome: 14 })
        );
    }

    #[test]
    fn orientation_sentinels() {
        let p = lookup("33O").expect("33O");
        let mut m = bordered(&p, 5);
        assert_eq!(orientation_matches(&p, &m), Ok(true));
        m.toggle(p.border + 2, p.border + 2);
        assert_eq!(orientation_matches(&p, &m), Ok(false));
        // the sentinel carries no payload
        assert_eq!(decode_matrix(&p, &m).expect("decode").value, 5);
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let p = lookup("44O").expect("44O");
        let m = BitMatrix::from_fn(5, 5, |_, _| false);
        assert!(matches!(
            decode_matrix(&p, &m),
            Err(CodecError::MatrixShape { got_cols: 5, .. })
        ));
    }
}
