use crate::{Area, Rgba};

/// Synchronous pixel access over an in-memory raster.
///
/// Reads outside the bitmap return [`Rgba::TRANSPARENT`].
pub trait Bitmap {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn pixel(&self, x: usize, y: usize) -> Rgba;

    /// Full bitmap as an [`Area`].
    #[inline]
    fn bounds(&self) -> Area {
        Area::new(0, 0, self.width(), self.height())
    }

    /// Visit every pixel of `area` (clipped to the bitmap) in row-major order.
    fn scan_area(&self, area: Area, visit: &mut dyn FnMut(usize, usize, Rgba)) {
        let Some(area) = area.intersection(&self.bounds()) else {
            return;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                visit(x, y, self.pixel(x, y));
            }
        }
    }

    /// Copy `area` into an owned image; pixels outside the bitmap stay transparent.
    fn crop(&self, area: Area) -> RgbaImage {
        let mut out = RgbaImage::new(area.w, area.h);
        for yy in 0..area.h {
            for xx in 0..area.w {
                out.put_pixel(xx, yy, self.pixel(area.x + xx, area.y + yy));
            }
        }
        out
    }
}

/// Borrowed RGBA8 buffer.
#[derive(Clone, Copy, Debug)]
pub struct RgbaImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h*4
}

/// Owned RGBA8 buffer.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Borrowed 8-bit grayscale buffer, read as opaque gray RGB.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[inline]
fn rgba_at(data: &[u8], width: usize, height: usize, x: usize, y: usize) -> Rgba {
    if x >= width || y >= height {
        return Rgba::TRANSPARENT;
    }
    let idx = (y * width + x) * 4;
    match data.get(idx..idx + 4) {
        Some(&[r, g, b, a]) => Rgba { r, g, b, a },
        _ => Rgba::TRANSPARENT,
    }
}

impl RgbaImage {
    /// Fully transparent image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 4],
        }
    }

    pub fn filled(width: usize, height: usize, color: Rgba) -> Self {
        let data = std::iter::repeat_n(color.to_array(), width * height)
            .flatten()
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn view(&self) -> RgbaImageView<'_> {
        RgbaImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) * 4;
        self.data[idx..idx + 4].copy_from_slice(&color.to_array());
    }

    /// Fill the clipped rectangle with an opaque or translucent color (no blending).
    pub fn fill_area(&mut self, area: Area, color: Rgba) {
        let bounds = Area::new(0, 0, self.width, self.height);
        let Some(area) = area.intersection(&bounds) else {
            return;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.put_pixel(x, y, color);
            }
        }
    }
}

impl Bitmap for RgbaImage {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn pixel(&self, x: usize, y: usize) -> Rgba {
        rgba_at(&self.data, self.width, self.height, x, y)
    }
}

impl Bitmap for RgbaImageView<'_> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn pixel(&self, x: usize, y: usize) -> Rgba {
        rgba_at(self.data, self.width, self.height, x, y)
    }
}

impl Bitmap for GrayImageView<'_> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn pixel(&self, x: usize, y: usize) -> Rgba {
        if x >= self.width || y >= self.height {
            return Rgba::TRANSPARENT;
        }
        match self.data.get(y * self.width + x) {
            Some(&v) => Rgba::rgb(v, v, v),
            None => Rgba::TRANSPARENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_area_clips_to_bounds() {
        let img = RgbaImage::filled(4, 3, Rgba::WHITE);
        let mut visited = Vec::new();
        img.scan_area(Area::new(2, 1, 10, 10), &mut |x, y, _| visited.push((x, y)));
        assert_eq!(visited, vec![(2, 1), (3, 1), (2, 2), (3, 2)]);
    }

    #[test]
    fn out_of_bounds_reads_are_transparent() {
        let img = RgbaImage::filled(2, 2, Rgba::WHITE);
        assert_eq!(img.pixel(2, 0), Rgba::TRANSPARENT);
        assert_eq!(img.pixel(1, 1), Rgba::WHITE);
    }

    #[test]
    fn crop_copies_sub_image() {
        let mut img = RgbaImage::filled(5, 5, Rgba::WHITE);
        img.fill_area(Area::new(1, 1, 2, 2), Rgba::BLACK);
        let sub = img.crop(Area::new(1, 1, 3, 3));
        assert_eq!(sub.width, 3);
        assert_eq!(sub.pixel(0, 0), Rgba::BLACK);
        assert_eq!(sub.pixel(2, 2), Rgba::WHITE);
    }

    #[test]
    fn gray_view_reads_as_gray_rgb() {
        let data = [0u8, 128, 255, 7];
        let view = GrayImageView {
            width: 2,
            height: 2,
            data: &data,
        };
        assert_eq!(view.pixel(1, 0), Rgba::rgb(128, 128, 128));
        assert_eq!(view.pixel(0, 2), Rgba::TRANSPARENT);
    }
}
