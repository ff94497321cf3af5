//! Vector output.

use std::fmt::Write;

use cvmark_codec::CellPainter;
use cvmark_core::Color;

/// Collects one `<rect>` per painted cell. Units are points.
#[derive(Clone, Debug)]
pub struct SvgPainter {
    width: f64,
    height: f64,
    origin: (f64, f64),
    cell: f64,
    body: String,
}

impl SvgPainter {
    /// Empty `width × height` canvas; cell `(0, 0)` is placed at `origin`.
    pub fn new(width: f64, height: f64, origin: (f64, f64), cell: f64) -> Self {
        Self {
            width,
            height,
            origin,
            cell,
            body: String::new(),
        }
    }

    /// Number of `<rect>` elements emitted so far.
    pub fn rect_count(&self) -> usize {
        self.body.matches("<rect").count()
    }

    /// Complete SVG document.
    pub fn finish(self) -> String {
        let mut svg = String::with_capacity(self.body.len() + 256);
        let _ = write!(
            svg,
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
                "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" ",
                "width=\"{w}pt\" height=\"{h}pt\" viewBox=\"0 0 {w} {h}\" ",
                "shape-rendering=\"crispEdges\">\n"
            ),
            w = fmt_num(self.width),
            h = fmt_num(self.height),
        );
        svg.push_str(&self.body);
        svg.push_str("</svg>\n");
        svg
    }
}

/// Shortest decimal form with at most four fractional digits.
fn fmt_num(v: f64) -> String {
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

impl CellPainter for SvgPainter {
    fn paint_cell(&mut self, x: usize, y: usize, color: Color) {
        let Some(rgba) = color.rgba() else {
            return;
        };
        let opacity = if rgba.a == 255 {
            String::new()
        } else {
            format!(" fill-opacity=\"{}\"", fmt_num(f64::from(rgba.a) / 255.0))
        };
        let _ = writeln!(
            self.body,
            "<rect x=\"{}\" y=\"{}\" width=\"{c}\" height=\"{c}\" fill=\"#{:02x}{:02x}{:02x}\"{opacity}/>",
            fmt_num(self.origin.0 + x as f64 * self.cell),
            fmt_num(self.origin.1 + y as f64 * self.cell),
            rgba.r,
            rgba.g,
            rgba.b,
            c = fmt_num(self.cell),
        );
    }
}
