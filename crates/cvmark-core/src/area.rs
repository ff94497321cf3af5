use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in source-image pixel coordinates.
///
/// Areas are only meaningful for the bitmap they were computed from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Area {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Area {
    #[inline]
    pub const fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Self { x, y, w, h }
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> usize {
        self.x + self.w
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> usize {
        self.y + self.h
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.w * self.h
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether `other` lies entirely inside `self`.
    #[inline]
    pub fn encloses(&self, other: &Area) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Overlapping part of two areas, `None` if they are disjoint.
    pub fn intersection(&self, other: &Area) -> Option<Area> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        (x1 > x0 && y1 > y0).then(|| Area::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Intersection over union in `[0, 1]`.
    pub fn iou(&self, other: &Area) -> f32 {
        let Some(inter) = self.intersection(other) else {
            return 0.0;
        };
        let inter = inter.pixel_count() as f32;
        let union = (self.pixel_count() + other.pixel_count()) as f32 - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}
