//! Core types shared by the marker encoder and recognizer.
//!
//! This crate is intentionally small. It knows nothing about marker
//! geometry or error correction; it only provides:
//! - a [`Bitmap`] abstraction over raw RGBA pixel access,
//! - owned and borrowed RGBA buffers implementing it,
//! - [`Color`] values for painters (including the transparent sentinel),
//! - [`Area`] rectangles in pixel space,
//! - relative luminosity and the two luminosity caches used while scanning,
//! - a minimal logger (and an optional `tracing` subscriber).

mod area;
mod color;
mod image;
mod logger;
mod luma;

pub use area::Area;
pub use color::{Color, ColorParseError, Rgba};
pub use image::{Bitmap, GrayImageView, RgbaImage, RgbaImageView};
pub use luma::{relative_luminance, ColorLumaTable, LumaCache};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_for_verbosity, tracing_directives};
