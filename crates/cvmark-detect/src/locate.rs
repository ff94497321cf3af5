//! Candidate region search.
//!
//! Every scan line is fed through the same four-state automaton. A marker
//! cross-section reads light (quiet zone), dark (body), light again; the
//! body run is recorded when the second light sample arrives. Rows are
//! scanned first, then only the columns where a row run started. A region
//! is confirmed where a row run and a column run share their start pixel
//! and have comparable lengths.

use std::collections::{BTreeSet, HashMap};

use cvmark_codec::MarkerProfile;
use cvmark_core::{Area, Bitmap, LumaCache};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Edge automaton state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScanState {
    #[default]
    Other,
    Prolog,
    Body,
    Epilog,
}

impl ScanState {
    /// Pure transition, shared by row and column scans.
    #[inline]
    pub fn transition(self, is_dark: bool, is_light: bool) -> Self {
        match self {
            ScanState::Other if is_light => ScanState::Prolog,
            ScanState::Prolog if is_dark => ScanState::Body,
            ScanState::Body if is_light => ScanState::Epilog,
            ScanState::Epilog if !is_light => ScanState::Other,
            s => s,
        }
    }
}

/// Darkest and lightest luminosity seen in a window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LumaRange {
    pub darkest: f32,
    pub lightest: f32,
}

impl LumaRange {
    /// Assumed range when dark/light detection is off.
    pub const FULL: LumaRange = LumaRange {
        darkest: 0.0,
        lightest: 1.0,
    };

    /// Dark/light decision threshold: `(lightest - darkest) / 2`.
    #[inline]
    pub fn threshold(&self) -> f32 {
        (self.lightest - self.darkest) / 2.0
    }
}

/// Scan `window` once, recording every pixel in the run cache.
///
/// An empty window yields [`LumaRange::FULL`].
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(bitmap, cache)))]
pub fn luminance_range<B: Bitmap + ?Sized>(
    bitmap: &B,
    window: Area,
    cache: &mut LumaCache<'_>,
) -> LumaRange {
    let mut range = LumaRange {
        darkest: 1.0,
        lightest: 0.0,
    };
    let mut seen = false;
    bitmap.scan_area(window, &mut |x, y, c| {
        let v = cache.record(x, y, c);
        range.darkest = range.darkest.min(v);
        range.lightest = range.lightest.max(v);
        seen = true;
    });
    if seen {
        range
    } else {
        LumaRange::FULL
    }
}

/// One dark body run along a scan line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Run {
    pub x: usize,
    pub y: usize,
    /// Dark samples in the body.
    pub len: usize,
}

/// Drives [`ScanState`] along one scan line and reports accepted runs.
#[derive(Clone, Copy, Debug)]
struct RunTracker {
    state: ScanState,
    current: Option<Run>,
    threshold: f32,
    min_len: usize,
}

impl RunTracker {
    fn new(threshold: f32, min_len: usize) -> Self {
        Self {
            state: ScanState::Other,
            current: None,
            threshold,
            min_len,
        }
    }

    fn push(&mut self, x: usize, y: usize, luma: f32) -> Option<Run> {
        let is_dark = luma < self.threshold;
        let next = self.state.transition(is_dark, !is_dark);
        if next == self.state {
            if let Some(run) = self.current.as_mut() {
                run.len += 1;
            }
            return None;
        }
        self.state = next;
        match next {
            ScanState::Body => {
                self.current = Some(Run { x, y, len: 1 });
                None
            }
            ScanState::Epilog => self.current.take().filter(|r| r.len >= self.min_len),
            _ => None,
        }
    }
}

/// Body runs of every row `window.y .. window.bottom() - min_len`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(bitmap, cache), fields(rows = window.h))
)]
pub fn horizontal_runs<B: Bitmap + ?Sized>(
    bitmap: &B,
    window: Area,
    min_len: usize,
    threshold: f32,
    cache: &mut LumaCache<'_>,
) -> Vec<Run> {
    let mut runs = Vec::new();
    for y in window.y..window.bottom().saturating_sub(min_len) {
        let mut tracker = RunTracker::new(threshold, min_len);
        for x in window.x..window.right() {
            if let Some(run) = tracker.push(x, y, cache.luminance(bitmap, x, y)) {
                log::trace!("row run at ({}, {}) len {}", run.x, run.y, run.len);
                runs.push(run);
            }
        }
    }
    runs
}

/// Body runs of the given columns, scanned over the full window height.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(bitmap, columns, cache), fields(columns = columns.len()))
)]
pub fn vertical_runs<B: Bitmap + ?Sized>(
    bitmap: &B,
    window: Area,
    columns: &[usize],
    min_len: usize,
    threshold: f32,
    cache: &mut LumaCache<'_>,
) -> Vec<Run> {
    let mut runs = Vec::new();
    for &x in columns {
        let mut tracker = RunTracker::new(threshold, min_len);
        for y in window.y..window.bottom() {
            if let Some(run) = tracker.push(x, y, cache.luminance(bitmap, x, y)) {
                log::trace!("column run at ({}, {}) len {}", run.x, run.y, run.len);
                runs.push(run);
            }
        }
    }
    runs
}

/// Distinct start columns of `runs`, ascending.
pub fn run_columns(runs: &[Run]) -> Vec<usize> {
    runs.iter()
        .map(|r| r.x)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Whether two run lengths agree within 10% of their mean (at least 1 px).
#[inline]
pub fn lengths_agree(a: usize, b: usize) -> bool {
    let diff = a.abs_diff(b) as f64;
    let tolerance = ((a + b) as f64 / 2.0 * 0.10).max(1.0);
    diff < tolerance
}

/// Confirm regions where a row run and a column run start at the same pixel.
///
/// Output order follows the row runs. Duplicates are kept.
pub fn intersect_runs(rows: &[Run], cols: &[Run]) -> Vec<Area> {
    let mut by_start: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for c in cols {
        by_start.entry((c.x, c.y)).or_default().push(c.len);
    }

    let mut areas = Vec::new();
    for r in rows {
        let Some(lens) = by_start.get(&(r.x, r.y)) else {
            continue;
        };
        for &h in lens {
            if lengths_agree(r.len, h) {
                areas.push(Area::new(r.x, r.y, r.len, h));
            }
        }
    }
    areas
}

/// Confirmed candidate regions for `profile` inside `window`.
///
/// `on_step` runs after the row pass, the column pass and the
/// intersection. Zero regions is a valid outcome.
pub fn locate<B: Bitmap + ?Sized>(
    bitmap: &B,
    window: Area,
    profile: &MarkerProfile,
    threshold: f32,
    cache: &mut LumaCache<'_>,
    mut on_step: impl FnMut(),
) -> Vec<Area> {
    let min_len = profile.marker_size();
    let rows = horizontal_runs(bitmap, window, min_len, threshold, cache);
    on_step();

    let columns = run_columns(&rows);
    let cols = vertical_runs(bitmap, window, &columns, min_len, threshold, cache);
    on_step();

    let areas = intersect_runs(&rows, &cols);
    log::debug!(
        "{} row runs over {} columns, {} column runs, {} regions",
        rows.len(),
        columns.len(),
        cols.len(),
        areas.len()
    );
    on_step();
    areas
}
