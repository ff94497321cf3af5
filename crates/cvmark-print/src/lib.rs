//! Marker rendering: SVG and PNG output with physical units.
//!
//! [`render_marker`] resolves a [`RenderParams`] into a canvas, places the
//! marker using one of four corner [`Handle`]s and drives a painter over it.
//! The painters can also be used directly with
//! [`cvmark_codec::paint_marker`]:
//!
//! - [`SvgPainter`] emits one `<rect>` per painted cell, in points,
//! - [`RasterPainter`] fills pixel rectangles on an RGBA canvas.
//!
//! Transparent cells are never painted.
//!
//! ```
//! use cvmark_print::{render_marker, OutputFormat, Rendered, RenderParams};
//!
//! let params = RenderParams {
//!     format: OutputFormat::Svg,
//!     ..RenderParams::default()
//! };
//! let Rendered::Svg(svg) = render_marker(&params, 300).unwrap() else {
//!     unreachable!()
//! };
//! assert!(svg.starts_with("<?xml"));
//! ```

mod error;
mod raster;
mod render;
mod svg;
pub mod units;

pub use error::RenderError;
pub use raster::{encode_png, render_bitmap, write_png, RasterPainter};
pub use render::{render_marker, Handle, OutputFormat, Placement, RenderParams, Rendered};
pub use svg::SvgPainter;
pub use units::{Length, Unit};
