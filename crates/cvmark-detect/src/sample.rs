//! Per-region cell sampling.

use cvmark_codec::BitMatrix;
use cvmark_core::{Area, Bitmap, LumaCache, RgbaImage};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Weight of the block's center pixel relative to the other pixels.
const CENTER_WEIGHT: f32 = 5.0;

/// Split `len` pixels into `parts` near-equal slices.
///
/// Returns `parts + 1` boundaries: `0`, `round(i * len / parts)` for
/// `i in 1..parts`, then `len`.
pub fn slices(len: usize, parts: usize) -> Vec<usize> {
    if parts == 0 {
        return vec![0, len];
    }
    let step = len as f64 / parts as f64;
    let mut out = Vec::with_capacity(parts + 1);
    out.push(0);
    out.extend((1..parts).map(|i| (i as f64 * step).round() as usize));
    out.push(len);
    out
}

/// Center-weighted mean luminosity of `block`.
///
/// The pixel at `(x + w/2, y + h/2)` counts [`CENTER_WEIGHT`] times. Empty
/// blocks read as light.
pub fn weighted_mean<B: Bitmap + ?Sized>(bitmap: &B, block: Area, cache: &LumaCache<'_>) -> f32 {
    let (cx, cy) = (block.x + block.w / 2, block.y + block.h / 2);
    let mut sum = 0.0f32;
    let mut weight = 0.0f32;
    for y in block.y..block.bottom() {
        for x in block.x..block.right() {
            let w = if (x, y) == (cx, cy) { CENTER_WEIGHT } else { 1.0 };
            sum += w * cache.peek(bitmap, x, y);
            weight += w;
        }
    }
    if weight > 0.0 {
        sum / weight
    } else {
        1.0
    }
}

/// Pixels of one sampling cell, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    /// Cell column.
    pub i: usize,
    /// Cell row.
    pub j: usize,
    /// Block origin relative to the region.
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
    pub image: RgbaImage,
}

/// All sampling cells of one region.
///
/// `width`/`height` leave a one pixel gutter between neighboring cells.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridImage {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<GridCell>,
}

impl GridImage {
    /// Paste the cells into one image with transparent gutters.
    pub fn compose(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.width, self.height);
        for cell in &self.cells {
            for yy in 0..cell.h {
                for xx in 0..cell.w {
                    out.put_pixel(
                        cell.x + cell.i + xx,
                        cell.y + cell.j + yy,
                        cell.image.pixel(xx, yy),
                    );
                }
            }
        }
        out
    }
}

/// Classified cells of one region, plus the optional grid export.
#[derive(Clone, Debug)]
pub struct SampledRegion {
    pub bits: BitMatrix,
    pub grid: Option<GridImage>,
}

/// Sample `area` as a `cells × cells` grid. A cell is set when its
/// weighted mean is below `threshold`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "trace", skip(bitmap, cache), fields(x = area.x, y = area.y))
)]
pub fn sample_region<B: Bitmap + ?Sized>(
    bitmap: &B,
    area: Area,
    cells: usize,
    threshold: f32,
    cache: &LumaCache<'_>,
    with_grid: bool,
) -> SampledRegion {
    let dx = slices(area.w, cells);
    let dy = slices(area.h, cells);

    let mut grid = with_grid.then(|| GridImage {
        width: area.w + cells.saturating_sub(1),
        height: area.h + cells.saturating_sub(1),
        cells: Vec::with_capacity(cells * cells),
    });

    let mut bits = Vec::with_capacity(cells * cells);
    for j in 0..cells {
        for i in 0..cells {
            let block = Area::new(
                area.x + dx[i],
                area.y + dy[j],
                dx[i + 1] - dx[i],
                dy[j + 1] - dy[j],
            );
            if let Some(grid) = grid.as_mut() {
                grid.cells.push(GridCell {
                    i,
                    j,
                    x: dx[i],
                    y: dy[j],
                    w: block.w,
                    h: block.h,
                    image: bitmap.crop(block),
                });
            }
            bits.push(weighted_mean(bitmap, block, cache) < threshold);
        }
    }

    SampledRegion {
        bits: BitMatrix {
            cols: cells,
            rows: cells,
            bits,
        },
        grid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvmark_core::{ColorLumaTable, Rgba};

    #[test]
    fn slices_cover_the_length() {
        assert_eq!(slices(8, 8), (0..=8).collect::<Vec<_>>());
        assert_eq!(slices(10, 4), vec![0, 3, 5, 8, 10]);
        assert_eq!(slices(17, 8), vec![0, 2, 4, 6, 9, 11, 13, 15, 17]);
    }

    #[test]
    fn center_pixel_dominates() {
        // 3x3 block: only the center is dark
        let mut img = RgbaImage::filled(3, 3, Rgba::WHITE);
        img.put_pixel(1, 1, Rgba::BLACK);
        let table = ColorLumaTable::new();
        let cache = LumaCache::new(&table);
        let mean = weighted_mean(&img, img.bounds(), &cache);
        // 8 white pixels against weight 5 of black
        assert!((mean - 8.0 / 13.0).abs() < 1e-4);
    }

    #[test]
    fn samples_checkerboard() {
        let mut img = RgbaImage::filled(12, 12, Rgba::WHITE);
        for j in 0..4 {
            for i in 0..4 {
                if (i + j) % 2 == 0 {
                    img.fill_area(Area::new(i * 3, j * 3, 3, 3), Rgba::BLACK);
                }
            }
        }
        let table = ColorLumaTable::new();
        let cache = LumaCache::new(&table);
        let region = sample_region(&img, img.bounds(), 4, 0.5, &cache, true);
        let expected = BitMatrix::from_fn(4, 4, |i, j| (i + j) % 2 == 0);
        assert_eq!(region.bits, expected);

        let grid = region.grid.expect("grid");
        assert_eq!((grid.width, grid.height), (15, 15));
        assert_eq!(grid.cells.len(), 16);
        let composed = grid.compose();
        assert_eq!(composed.pixel(0, 0), Rgba::BLACK);
        assert_eq!(composed.pixel(3, 0), Rgba::TRANSPARENT);
        assert_eq!(composed.pixel(4, 0), Rgba::WHITE);
    }
}
