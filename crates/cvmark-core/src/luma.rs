//! Relative luminosity and the caches used while scanning a bitmap.
//!
//! Two caches cooperate:
//! - [`ColorLumaTable`] maps packed RGB to luminosity. It is a pure function
//!   of the color, so it may live as long as the recognizer that owns it.
//! - [`LumaCache`] maps pixel coordinates to luminosity for one scan run.
//!   It keeps new color entries locally and merges them back into the
//!   shared table when dropped.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::{Bitmap, Rgba};

#[inline]
fn linear_channel(v: u8) -> f32 {
    let c = v as f32 / 255.0;
    if c <= 0.039_28 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG 2.0 relative luminance: 0 is black, 1 is white. Alpha is ignored.
#[inline]
pub fn relative_luminance(c: Rgba) -> f32 {
    0.2126 * linear_channel(c.r) + 0.7152 * linear_channel(c.g) + 0.0722 * linear_channel(c.b)
}

/// Shared, thread-safe color to luminosity memo.
#[derive(Debug, Default)]
pub struct ColorLumaTable {
    table: RwLock<HashMap<u32, f32>>,
}

impl ColorLumaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized colors.
    pub fn len(&self) -> usize {
        self.table.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn get(&self, key: u32) -> Option<f32> {
        self.table.read().ok()?.get(&key).copied()
    }

    /// Luminosity of `c`, memoized.
    pub fn luminance(&self, c: Rgba) -> f32 {
        let key = c.packed_rgb();
        if let Some(v) = self.get(key) {
            return v;
        }
        let v = relative_luminance(c);
        if let Ok(mut t) = self.table.write() {
            t.insert(key, v);
        }
        v
    }

    fn merge(&self, entries: &mut HashMap<u32, f32>) {
        if entries.is_empty() {
            return;
        }
        if let Ok(mut t) = self.table.write() {
            t.extend(entries.drain());
        }
    }
}

#[inline]
fn pixel_key(x: usize, y: usize) -> u64 {
    (y as u64) << 32 | x as u64
}

/// Per-run pixel luminosity cache.
#[derive(Debug)]
pub struct LumaCache<'t> {
    colors: &'t ColorLumaTable,
    new_colors: HashMap<u32, f32>,
    pixels: HashMap<u64, f32>,
}

impl<'t> LumaCache<'t> {
    pub fn new(colors: &'t ColorLumaTable) -> Self {
        Self {
            colors,
            new_colors: HashMap::new(),
            pixels: HashMap::new(),
        }
    }

    /// Number of cached pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    fn color_luminance(&mut self, c: Rgba) -> f32 {
        let key = c.packed_rgb();
        if let Some(&v) = self.new_colors.get(&key) {
            return v;
        }
        if let Some(v) = self.colors.get(key) {
            return v;
        }
        let v = relative_luminance(c);
        self.new_colors.insert(key, v);
        v
    }

    /// Luminosity of pixel `(x, y)`, reading and filling the cache.
    pub fn luminance<B: Bitmap + ?Sized>(&mut self, bitmap: &B, x: usize, y: usize) -> f32 {
        if let Some(&v) = self.pixels.get(&pixel_key(x, y)) {
            return v;
        }
        self.record(x, y, bitmap.pixel(x, y))
    }

    /// Store the luminosity of an already-read pixel and return it.
    pub fn record(&mut self, x: usize, y: usize, c: Rgba) -> f32 {
        let v = self.color_luminance(c);
        self.pixels.insert(pixel_key(x, y), v);
        v
    }

    /// Read-only variant: cached value if present, otherwise computed without caching.
    pub fn peek<B: Bitmap + ?Sized>(&self, bitmap: &B, x: usize, y: usize) -> f32 {
        if let Some(&v) = self.pixels.get(&pixel_key(x, y)) {
            return v;
        }
        let c = bitmap.pixel(x, y);
        let key = c.packed_rgb();
        self.new_colors
            .get(&key)
            .copied()
            .or_else(|| self.colors.get(key))
            .unwrap_or_else(|| relative_luminance(c))
    }
}

impl Drop for LumaCache<'_> {
    fn drop(&mut self) {
        self.colors.merge(&mut self.new_colors);
    }
}
