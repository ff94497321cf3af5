//! Marker profiles, error correction, and cell-matrix encoding/decoding.
//!
//! This crate focuses on:
//! - the built-in catalog of named [`MarkerProfile`]s,
//! - MSB-first [`Digits`] and the [`ErrorCorrectingCode`] service contract
//!   (implemented by [`HammingCode`]),
//! - building the payload [`CellMatrix`] for a value and driving a
//!   [`CellPainter`] over the complete marker,
//! - decoding a classified [`BitMatrix`] back into a value.
//!
//! It does **not** read pixels. Locating markers in a bitmap and
//! classifying their cells lives in `cvmark-detect`.

mod decode;
mod digits;
mod ecc;
mod encode;
mod error;
mod matrix;
mod profile;

pub use decode::{decode_digits, decode_matrix, extract_codeword, orientation_matches, DecodedMarker};
pub use digits::Digits;
pub use ecc::{ErrorCorrectingCode, HammingCode};
pub use encode::{
    check_value, encode_payload, paint_marker, parse_value, value_from_f64, CellPainter,
    MarkerLayout, Palette, Tone,
};
pub use error::CodecError;
pub use matrix::{BitMatrix, CellMatrix, CellState};
pub use profile::{lookup, profile_names, MarkerProfile, PROFILES};
