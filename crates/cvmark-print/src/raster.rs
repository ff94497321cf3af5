//! Raster output.

use std::path::Path;

use cvmark_codec::{paint_marker, CellPainter, CodecError, MarkerProfile, Palette};
use cvmark_core::{Area, Color, Rgba, RgbaImage};

use crate::RenderError;

/// Paints cells as pixel rectangles onto an RGBA canvas.
///
/// Cell edges are rounded to whole pixels, so fractional cell sizes give
/// cells that differ by at most one pixel.
#[derive(Clone, Debug)]
pub struct RasterPainter {
    image: RgbaImage,
    origin: (f64, f64),
    cell: f64,
}

fn blend(dst: Rgba, src: Rgba) -> Rgba {
    if src.a == 255 {
        return src;
    }
    let a = f32::from(src.a) / 255.0;
    let mix = |s: u8, d: u8| (f32::from(s) * a + f32::from(d) * (1.0 - a)).round() as u8;
    Rgba {
        r: mix(src.r, dst.r),
        g: mix(src.g, dst.g),
        b: mix(src.b, dst.b),
        a: (f32::from(src.a) + f32::from(dst.a) * (1.0 - a)).round() as u8,
    }
}

fn edge(v: f64, limit: usize) -> usize {
    v.round().clamp(0.0, limit as f64) as usize
}

impl RasterPainter {
    /// `width × height` canvas filled with `paper`; cell `(0, 0)` is
    /// placed at `origin` (pixels).
    pub fn new(width: usize, height: usize, paper: Rgba, origin: (f64, f64), cell: f64) -> Self {
        Self {
            image: RgbaImage::filled(width, height, paper),
            origin,
            cell,
        }
    }

    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl CellPainter for RasterPainter {
    fn paint_cell(&mut self, x: usize, y: usize, color: Color) {
        let Some(src) = color.rgba() else {
            return;
        };
        let (w, h) = (self.image.width, self.image.height);
        let x0 = edge(self.origin.0 + x as f64 * self.cell, w);
        let x1 = edge(self.origin.0 + (x + 1) as f64 * self.cell, w);
        let y0 = edge(self.origin.1 + y as f64 * self.cell, h);
        let y1 = edge(self.origin.1 + (y + 1) as f64 * self.cell, h);
        if src.a == 255 {
            self.image
                .fill_area(Area::new(x0, y0, x1 - x0, y1 - y0), src);
            return;
        }
        for py in y0..y1 {
            for px in x0..x1 {
                let idx = (py * w + px) * 4;
                let dst = Rgba {
                    r: self.image.data[idx],
                    g: self.image.data[idx + 1],
                    b: self.image.data[idx + 2],
                    a: self.image.data[idx + 3],
                };
                self.image.put_pixel(px, py, blend(dst, src));
            }
        }
    }
}

/// Marker on white paper, `cell_px` pixels per cell, no extra canvas.
pub fn render_bitmap(
    profile: &MarkerProfile,
    value: u64,
    cell_px: usize,
    palette: &Palette,
) -> Result<RgbaImage, CodecError> {
    let (w, h) = profile.extent();
    let mut painter = RasterPainter::new(
        w * cell_px,
        h * cell_px,
        Rgba::WHITE,
        (0.0, 0.0),
        cell_px as f64,
    );
    paint_marker(profile, value, palette, &mut painter)?;
    Ok(painter.into_image())
}

/// Encode an RGBA image as 8-bit PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width as u32, image.height as u32);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&image.data)?;
        writer.finish()?;
    }
    Ok(out)
}

/// Encode `image` as PNG and write it to `path`.
pub fn write_png(image: &RgbaImage, path: impl AsRef<Path>) -> Result<(), RenderError> {
    std::fs::write(path, encode_png(image)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvmark_codec::lookup;
    use cvmark_core::Bitmap;

    #[test]
    fn bitmap_has_quiet_zone_and_frame() {
        let p = lookup("44O").expect("44O");
        let img = render_bitmap(&p, 300, 5, &Palette::default()).expect("render");
        assert_eq!((img.width, img.height), (60, 60));
        // margin: 2 cells of paper, then the frame
        assert_eq!(img.pixel(9, 9), Rgba::WHITE);
        assert_eq!(img.pixel(10, 10), Rgba::BLACK);
        assert_eq!(img.pixel(49, 30), Rgba::BLACK);
        assert_eq!(img.pixel(50, 30), Rgba::WHITE);
        // first orientation cell is set, the last one unset
        assert_eq!(img.pixel(22, 22), Rgba::BLACK);
        assert_eq!(img.pixel(37, 37), Rgba::WHITE);
    }

    #[test]
    fn fractional_cells_cover_canvas() {
        let mut painter = RasterPainter::new(10, 1, Rgba::WHITE, (0.0, 0.0), 2.5);
        for x in 0..4 {
            painter.paint_cell(x, 0, Color::BLACK);
        }
        let img = painter.into_image();
        assert!((0..10).all(|x| img.pixel(x, 0) == Rgba::BLACK));
    }

    #[test]
    fn translucent_paint_blends() {
        let mut painter = RasterPainter::new(1, 1, Rgba::WHITE, (0.0, 0.0), 1.0);
        painter.paint_cell(0, 0, Color::Solid(Rgba { r: 0, g: 0, b: 0, a: 128 }));
        let px = painter.image().pixel(0, 0);
        assert_eq!(px.a, 255);
        assert!((126..=128).contains(&px.r));
    }

    #[test]
    fn png_signature() {
        let img = RgbaImage::filled(3, 2, Rgba::BLACK);
        let bytes = encode_png(&img).expect("png");
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
