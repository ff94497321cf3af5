//! Render parameters, canvas placement and output dispatch.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use cvmark_codec::{lookup, paint_marker, MarkerProfile, Palette};
use cvmark_core::{Color, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::units::{Length, Unit};
use crate::{encode_png, RasterPainter, RenderError, SvgPainter};

/// Marker corner that `position_x`/`position_y` refer to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    #[default]
    Tl,
    Tr,
    Bl,
    Br,
}

impl FromStr for Handle {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tl" => Ok(Handle::Tl),
            "tr" => Ok(Handle::Tr),
            "bl" => Ok(Handle::Bl),
            "br" => Ok(Handle::Br),
            _ => Err(RenderError::InvalidHandle {
                input: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            _ => Err(RenderError::InvalidFormat {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

fn default_profile() -> String {
    "44O".to_string()
}

fn default_cell_size() -> Length {
    Length::new(0.1, Unit::Cm)
}

/// Rendering configuration.
///
/// A zero canvas size means "just the marker". Negative positions are
/// measured from the right/bottom canvas edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderParams {
    #[serde(default = "default_profile")]
    pub profile: String,
    pub format: OutputFormat,
    pub canvas_width: Length,
    pub canvas_height: Length,
    pub position_x: Length,
    pub position_y: Length,
    pub handle: Handle,
    #[serde(default = "default_cell_size")]
    pub cell_size: Length,
    pub color_bg: Color,
    pub color_fg: Color,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            format: OutputFormat::Svg,
            canvas_width: Length::ZERO,
            canvas_height: Length::ZERO,
            position_x: Length::ZERO,
            position_y: Length::ZERO,
            handle: Handle::Tl,
            cell_size: default_cell_size(),
            color_bg: Color::Transparent,
            color_fg: Color::BLACK,
        }
    }
}

/// Canvas size and marker origin, in one unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Placement {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell: f64,
}

impl RenderParams {
    pub fn palette(&self) -> Palette {
        Palette {
            foreground: self.color_fg,
            background: self.color_bg,
        }
    }

    /// Resolve canvas and marker placement for `profile`, in `unit`.
    pub fn placement(&self, profile: &MarkerProfile, unit: Unit) -> Result<Placement, RenderError> {
        let (w_cells, h_cells) = profile.extent();
        let cell = self.cell_size.to(unit);
        let marker_w = w_cells as f64 * cell;
        let marker_h = h_cells as f64 * cell;

        let or_marker = |len: Length, marker: f64| {
            let v = len.to(unit);
            if v > 0.0 {
                v
            } else {
                marker
            }
        };
        let canvas_width = or_marker(self.canvas_width, marker_w);
        let canvas_height = or_marker(self.canvas_height, marker_h);
        if cell <= 0.0 || canvas_width <= 0.0 || canvas_height <= 0.0 {
            return Err(RenderError::EmptyCanvas {
                width: canvas_width,
                height: canvas_height,
                cell,
            });
        }

        let from_edge = |len: Length, extent: f64| {
            let v = len.to(unit);
            if v < 0.0 {
                extent + v
            } else {
                v
            }
        };
        let mut origin_x = from_edge(self.position_x, canvas_width);
        let mut origin_y = from_edge(self.position_y, canvas_height);
        if matches!(self.handle, Handle::Tr | Handle::Br) {
            origin_x -= marker_w;
        }
        if matches!(self.handle, Handle::Bl | Handle::Br) {
            origin_y -= marker_h;
        }

        Ok(Placement {
            canvas_width,
            canvas_height,
            origin_x,
            origin_y,
            cell,
        })
    }
}

/// Rendered artifact.
#[derive(Clone, Debug, PartialEq)]
pub enum Rendered {
    Svg(String),
    Png { image: RgbaImage, bytes: Vec<u8> },
}

impl Rendered {
    pub fn format(&self) -> OutputFormat {
        match self {
            Rendered::Svg(_) => OutputFormat::Svg,
            Rendered::Png { .. } => OutputFormat::Png,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Rendered::Svg(s) => s.as_bytes(),
            Rendered::Png { bytes, .. } => bytes,
        }
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        std::fs::write(path, self.as_bytes())?;
        Ok(())
    }
}

/// Render `value` with `params`.
///
/// SVG output is sized in points. PNG output converts every length to
/// pixels and starts from white paper; transparent cells leave it visible.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(params), fields(profile = %params.profile, format = %params.format))
)]
pub fn render_marker(params: &RenderParams, value: u64) -> Result<Rendered, RenderError> {
    let profile = lookup(&params.profile)?;
    let palette = params.palette();

    match params.format {
        OutputFormat::Svg => {
            let pl = params.placement(&profile, Unit::Pt)?;
            let mut painter = SvgPainter::new(
                pl.canvas_width,
                pl.canvas_height,
                (pl.origin_x, pl.origin_y),
                pl.cell,
            );
            paint_marker(&profile, value, &palette, &mut painter)?;
            log::debug!(
                "svg canvas {:.2}x{:.2}pt, {} rects",
                pl.canvas_width,
                pl.canvas_height,
                painter.rect_count()
            );
            Ok(Rendered::Svg(painter.finish()))
        }
        OutputFormat::Png => {
            let pl = params.placement(&profile, Unit::Px)?;
            let (w, h) = (
                pl.canvas_width.round().max(1.0) as usize,
                pl.canvas_height.round().max(1.0) as usize,
            );
            let mut painter =
                RasterPainter::new(w, h, Rgba::WHITE, (pl.origin_x, pl.origin_y), pl.cell);
            paint_marker(&profile, value, &palette, &mut painter)?;
            log::debug!("png canvas {w}x{h}px, cell {:.2}px", pl.cell);
            let image = painter.into_image();
            let bytes = encode_png(&image)?;
            Ok(Rendered::Png { image, bytes })
        }
    }
}
