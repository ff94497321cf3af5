use cvmark_core::Area;
use serde::{Deserialize, Serialize};

/// Part of the bitmap to scan, in pixels.
///
/// Negative `x`/`y` are measured from the right/bottom edge. A zero
/// `width`/`height` extends to the bitmap size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanWindow {
    pub x: i64,
    pub y: i64,
    pub width: usize,
    pub height: usize,
}

fn resolve_offset(offset: i64, extent: usize) -> usize {
    let extent_i = i64::try_from(extent).unwrap_or(i64::MAX);
    let pos = if offset < 0 {
        extent_i.saturating_add(offset)
    } else {
        offset
    };
    pos.clamp(0, extent_i) as usize
}

impl ScanWindow {
    /// Whole bitmap.
    pub const FULL: ScanWindow = ScanWindow {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    /// Pixel area of this window on a `width × height` bitmap, clipped to
    /// the bitmap. `None` when nothing is left.
    pub fn resolve(&self, width: usize, height: usize) -> Option<Area> {
        let x = resolve_offset(self.x, width);
        let y = resolve_offset(self.y, height);
        let w = if self.width > 0 { self.width } else { width };
        let h = if self.height > 0 { self.height } else { height };
        Area::new(x, y, w, h).intersection(&Area::new(0, 0, width, height))
    }
}

fn default_profile() -> String {
    "44O".to_string()
}

/// Recognizer configuration.
///
/// All diagnostics are off by default; disabled fields are omitted from
/// the serialized output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerParams {
    /// Marker profile name, e.g. `"44O"`.
    #[serde(default = "default_profile")]
    pub profile: String,
    pub scan_window: ScanWindow,
    /// Measure the darkest/lightest luminosity of the window instead of
    /// assuming the full `0..1` range.
    pub detect_dark_light: bool,
    pub provide_area: bool,
    pub provide_matrix: bool,
    /// Report whether the codeword needed correction, and list rejected
    /// regions.
    pub provide_errors: bool,
    pub provide_grid: bool,
    pub provide_timing: bool,
    /// Drop regions whose orientation cells do not read `set, set, unset`.
    pub check_orientation: bool,
    /// Collapse overlapping regions that decode to the same value.
    ///
    /// Regions lying inside another framed region are always dropped; this
    /// only controls merging of partially overlapping ones.
    pub merge_overlapping: bool,
}

impl Default for RecognizerParams {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            scan_window: ScanWindow::FULL,
            detect_dark_light: false,
            provide_area: false,
            provide_matrix: false,
            provide_errors: false,
            provide_grid: false,
            provide_timing: false,
            check_orientation: false,
            merge_overlapping: false,
        }
    }
}

impl RecognizerParams {
    /// Default parameters for `profile`.
    pub fn for_profile(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            ..Self::default()
        }
    }

    /// Enable every diagnostic output.
    pub fn with_diagnostics(mut self) -> Self {
        self.provide_area = true;
        self.provide_matrix = true;
        self.provide_errors = true;
        self.provide_grid = true;
        self.provide_timing = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_window() {
        assert_eq!(ScanWindow::FULL.resolve(64, 48), Some(Area::new(0, 0, 64, 48)));
    }

    #[test]
    fn negative_offsets_count_from_far_edge() {
        let w = ScanWindow {
            x: -20,
            y: -10,
            width: 0,
            height: 0,
        };
        assert_eq!(w.resolve(64, 48), Some(Area::new(44, 38, 20, 10)));
    }

    #[test]
    fn window_is_clipped() {
        let w = ScanWindow {
            x: 50,
            y: 0,
            width: 100,
            height: 10,
        };
        assert_eq!(w.resolve(64, 48), Some(Area::new(50, 0, 14, 10)));
        let outside = ScanWindow {
            x: 64,
            ..ScanWindow::FULL
        };
        assert_eq!(outside.resolve(64, 48), None);
    }

    #[test]
    fn params_json_defaults() {
        let p: RecognizerParams = serde_json::from_str(r#"{ "provide_area": true }"#).expect("json");
        assert_eq!(p.profile, "44O");
        assert!(p.provide_area);
        assert!(!p.detect_dark_light);
        assert_eq!(p.scan_window, ScanWindow::FULL);
    }
}
