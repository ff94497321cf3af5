//! Payload validation, codeword placement and marker painting.

use cvmark_core::Color;
use serde::Serialize;

use crate::{CellMatrix, CellState, CodecError, Digits, ErrorCorrectingCode, MarkerProfile};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Validate an integer payload against the profile's value range.
pub fn check_value(profile: &MarkerProfile, value: i128) -> Result<u64, CodecError> {
    let limit = profile.value_limit();
    if value < 0 || value >= i128::from(limit) {
        return Err(CodecError::DataOutOfRange { value, limit });
    }
    Ok(value as u64)
}

/// Validate a floating point payload. It must be finite and integral.
pub fn value_from_f64(profile: &MarkerProfile, value: f64) -> Result<u64, CodecError> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(CodecError::InvalidData {
            input: value.to_string(),
            reason: "payload must be an integer",
        });
    }
    // Saturating cast keeps huge values out of range instead of wrapping.
    check_value(profile, value as i128)
}

/// Parse numeric payload text such as `"300"`, `"-1"` or `"2.0"`.
pub fn parse_value(input: &str, profile: &MarkerProfile) -> Result<u64, CodecError> {
    let text = input.trim();
    if let Ok(v) = text.parse::<i128>() {
        return check_value(profile, v);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => value_from_f64(profile, v).map_err(|err| match err {
            CodecError::InvalidData { reason, .. } => CodecError::InvalidData {
                input: input.to_string(),
                reason,
            },
            other => other,
        }),
        _ => Err(CodecError::InvalidData {
            input: input.to_string(),
            reason: "payload must be numeric",
        }),
    }
}

/// Build the payload grid for `value`.
///
/// Orientation sentinels are reserved first, then the codeword fills the
/// remaining cells in scan order. Cells past the codeword stay `Unset`.
pub fn encode_payload(profile: &MarkerProfile, value: u64) -> Result<CellMatrix, CodecError> {
    let value = check_value(profile, i128::from(value))?;
    let mut matrix = CellMatrix::new(profile.width, profile.height);

    if let Some([a, b, c]) = profile.orientation_indices() {
        matrix.cells[a] = CellState::Reserved(true);
        matrix.cells[b] = CellState::Reserved(true);
        matrix.cells[c] = CellState::Reserved(false);
    }

    let payload = Digits::from_value(value, profile.payload_bits);
    let codeword = profile.code().encode(&payload)?;

    let mut free = matrix
        .cells
        .iter_mut()
        .filter(|cell| !cell.is_reserved());
    for bit in codeword.iter() {
        let cell = free.next().ok_or(CodecError::CodewordLength {
            expected: profile.data_cells(),
            got: codeword.len(),
        })?;
        *cell = if bit { CellState::Set } else { CellState::Unset };
    }
    Ok(matrix)
}

/// Logical tone of a painted cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Background,
    Foreground,
}

/// Colors used for the two tones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Color,
    pub background: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            foreground: Color::BLACK,
            background: Color::Transparent,
        }
    }
}

impl Palette {
    #[inline]
    pub fn color(&self, tone: Tone) -> Color {
        match tone {
            Tone::Background => self.background,
            Tone::Foreground => self.foreground,
        }
    }
}

/// Paint primitive driven by [`paint_marker`]. Coordinates are in cells,
/// origin at the top-left of the quiet zone.
pub trait CellPainter {
    /// Transparent colors must leave the canvas untouched.
    fn paint_cell(&mut self, x: usize, y: usize, color: Color);
}

/// Drive `painter` over the complete marker for `value`.
///
/// Outer `margin` rings are background, the `border` rings inside them are
/// foreground, then the payload grid is painted at offset `margin + border`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(palette, painter), fields(profile = profile.name))
)]
pub fn paint_marker<P: CellPainter + ?Sized>(
    profile: &MarkerProfile,
    value: u64,
    palette: &Palette,
    painter: &mut P,
) -> Result<(), CodecError> {
    let matrix = encode_payload(profile, value)?;
    log::debug!("painting {} marker for value {value}", profile.name);
    paint_tones(profile, &matrix, &mut |x, y, tone| {
        painter.paint_cell(x, y, palette.color(tone))
    });
    Ok(())
}

fn paint_tones(
    profile: &MarkerProfile,
    matrix: &CellMatrix,
    set: &mut dyn FnMut(usize, usize, Tone),
) {
    let (w, h) = profile.extent();
    let rings = profile.margin + profile.border;

    for k in 0..rings {
        let tone = if k < profile.margin {
            Tone::Background
        } else {
            Tone::Foreground
        };
        for i in k..w - k {
            set(i, k, tone);
            set(i, h - k - 1, tone);
        }
        for i in k + 1..h - k - 1 {
            set(k, i, tone);
            set(w - k - 1, i, tone);
        }
    }

    for (i, cell) in matrix.cells.iter().enumerate() {
        let tone = if cell.is_dark() {
            Tone::Foreground
        } else {
            Tone::Background
        };
        set(rings + i % matrix.width, rings + i / matrix.width, tone);
    }
}

/// Fully resolved tone grid of a marker, quiet zone included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MarkerLayout {
    pub width: usize,
    pub height: usize,
    pub tones: Vec<Tone>,
}

impl MarkerLayout {
    pub fn new(profile: &MarkerProfile, value: u64) -> Result<Self, CodecError> {
        let matrix = encode_payload(profile, value)?;
        let (width, height) = profile.extent();
        let mut tones = vec![Tone::Background; width * height];
        paint_tones(profile, &matrix, &mut |x, y, tone| tones[y * width + x] = tone);
        Ok(Self {
            width,
            height,
            tones,
        })
    }

    #[inline]
    pub fn tone(&self, x: usize, y: usize) -> Option<Tone> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tones.get(y * self.width + x).copied()
    }
}
