//! Square computer vision markers: encode a number into a printable cell
//! pattern and recognize it again in raster images.
//!
//! This crate provides:
//! - re-exports of the underlying crates,
//! - (feature `image`) helpers that run the recognizer on `image` buffers,
//! - (feature `cli`) the `cvmark` command-line tool.
//!
//! ## Quickstart
//!
//! ```no_run
//! use cvmark::detect;
//! use cvmark::detect::RecognizerParams;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("scan.png")?.to_rgba8();
//! let out = detect::recognize_image(&img, RecognizerParams::for_profile("44O"))?;
//! println!("values: {:?}", out.values());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `cvmark::core`: bitmaps, colors, areas, luminosity.
//! - `cvmark::codec`: marker profiles, Hamming code, encoding and decoding.
//! - `cvmark::recognize`: locating, sampling and decoding markers in bitmaps.
//! - `cvmark::print`: SVG and PNG rendering.
//! - `cvmark::detect` (feature `image`): end-to-end helpers from `image::RgbaImage`.

pub use cvmark_codec as codec;
pub use cvmark_core as core;
pub use cvmark_detect as recognize;
pub use cvmark_print as print;

pub use cvmark_codec::{lookup, MarkerProfile, PROFILES};
pub use cvmark_detect::{RecognizeOutput, Recognizer, RecognizerParams};
pub use cvmark_print::{render_marker, RenderParams, Rendered};

#[cfg(feature = "image")]
pub mod detect;
