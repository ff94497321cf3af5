//! Marker recognition in raster images.
//!
//! The pipeline is:
//! - optional darkest/lightest luminosity pass over the scan window,
//! - row scan with a light/dark/light automaton, then a column scan over
//!   the columns where row runs started,
//! - intersection of row and column runs into candidate [`Area`]s,
//! - center-weighted sampling of each area into a [`BitMatrix`],
//! - border validation and error-corrected decoding.
//!
//! Markers are assumed axis-aligned and unrotated.
//!
//! [`Area`]: cvmark_core::Area
//! [`BitMatrix`]: cvmark_codec::BitMatrix

mod io;
mod locate;
mod recognizer;
mod sample;

pub use io::{ConfigIoError, RecognizeConfig, RecognizeReport};
pub use locate::{
    horizontal_runs, intersect_runs, lengths_agree, locate, luminance_range, run_columns,
    vertical_runs, LumaRange, Run, ScanState,
};
pub use recognizer::{
    MarkerResult, RecognizeError, RecognizeOutput, Recognizer, RecognizerParams, RejectReason,
    RejectedRegion, ScanBitmap, ScanWindow, Timing,
};
pub use sample::{sample_region, slices, weighted_mean, GridCell, GridImage, SampledRegion};
