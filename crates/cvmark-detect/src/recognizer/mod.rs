//! Recognition pipeline.
//!
//! This module wires together the luminosity pass, the row/column run
//! search, per-region sampling and codeword decoding.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::RecognizeError;
pub use params::{RecognizerParams, ScanWindow};
pub use pipeline::{Recognizer, ScanBitmap};
pub use result::{MarkerResult, RecognizeOutput, RejectReason, RejectedRegion, Timing};
