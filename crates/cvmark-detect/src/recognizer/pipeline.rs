use std::time::Instant;

use cvmark_codec::{decode_matrix, lookup, orientation_matches, BitMatrix, DecodedMarker, MarkerProfile};
use cvmark_core::{Area, Bitmap, ColorLumaTable, LumaCache};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{
    MarkerResult, RecognizeError, RecognizeOutput, RecognizerParams, RejectReason,
    RejectedRegion, Timing,
};
use crate::locate::{locate, luminance_range, LumaRange};
use crate::sample::{sample_region, SampledRegion};

/// Bitmaps the recognizer accepts. With the `rayon` feature regions are
/// sampled in parallel, so the bitmap must also be `Sync`.
#[cfg(feature = "rayon")]
pub trait ScanBitmap: Bitmap + Sync {}
#[cfg(feature = "rayon")]
impl<T: Bitmap + Sync + ?Sized> ScanBitmap for T {}

/// Bitmaps the recognizer accepts.
#[cfg(not(feature = "rayon"))]
pub trait ScanBitmap: Bitmap {}
#[cfg(not(feature = "rayon"))]
impl<T: Bitmap + ?Sized> ScanBitmap for T {}

struct StepTimer {
    enabled: bool,
    lap: Instant,
    steps: Vec<f64>,
}

impl StepTimer {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            lap: Instant::now(),
            steps: Vec::new(),
        }
    }

    fn lap(&mut self) {
        if self.enabled {
            let now = Instant::now();
            self.steps
                .push(now.duration_since(self.lap).as_secs_f64() * 1000.0);
            self.lap = now;
        }
    }

    fn finish(self) -> Option<Timing> {
        self.enabled.then(|| Timing {
            total: self.steps.iter().sum(),
            steps: self.steps,
        })
    }
}

/// Result of examining one confirmed region.
enum Candidate {
    Decoded {
        area: Area,
        sampled: SampledRegion,
        marker: DecodedMarker,
    },
    Rejected {
        rejected: RejectedRegion,
        framed: bool,
    },
}

impl Candidate {
    fn area(&self) -> Area {
        match self {
            Candidate::Decoded { area, .. } => *area,
            Candidate::Rejected { rejected, .. } => rejected.area,
        }
    }

    /// Border rings sampled as foreground.
    fn framed(&self) -> bool {
        match self {
            Candidate::Decoded { .. } => true,
            Candidate::Rejected { framed, .. } => *framed,
        }
    }
}

/// Whether every cell outside the payload grid is set.
fn border_is_set(profile: &MarkerProfile, bits: &BitMatrix) -> bool {
    let b = profile.border;
    let payload_cols = b..b + profile.width;
    let payload_rows = b..b + profile.height;
    (0..bits.rows).all(|r| {
        (0..bits.cols).all(|c| {
            (payload_cols.contains(&c) && payload_rows.contains(&r)) || bits.get(c, r) == Some(true)
        })
    })
}

/// Marker recognizer for one profile.
///
/// The color luminosity table lives as long as the recognizer; all
/// per-pixel state is scoped to a single [`Recognizer::recognize`] call.
#[derive(Debug)]
pub struct Recognizer {
    profile: MarkerProfile,
    params: RecognizerParams,
    colors: ColorLumaTable,
}

impl Recognizer {
    /// Validate the profile name and build a recognizer.
    pub fn new(params: RecognizerParams) -> Result<Self, RecognizeError> {
        let profile = lookup(&params.profile)?;
        Ok(Self {
            profile,
            params,
            colors: ColorLumaTable::new(),
        })
    }

    #[inline]
    pub fn profile(&self) -> &MarkerProfile {
        &self.profile
    }

    #[inline]
    pub fn params(&self) -> &RecognizerParams {
        &self.params
    }

    /// Number of memoized colors.
    pub fn known_colors(&self) -> usize {
        self.colors.len()
    }

    /// Find and decode all markers in `bitmap`.
    ///
    /// Regions that fail to decode are skipped; with `provide_errors` they
    /// are listed in [`RecognizeOutput::rejected`].
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, bitmap),
            fields(profile = self.profile.name, width = bitmap.width(), height = bitmap.height())
        )
    )]
    pub fn recognize<B: ScanBitmap + ?Sized>(
        &self,
        bitmap: &B,
    ) -> Result<RecognizeOutput, RecognizeError> {
        let (width, height) = (bitmap.width(), bitmap.height());
        let window = self.params.scan_window.resolve(width, height).ok_or(
            RecognizeError::EmptyScanWindow {
                window: self.params.scan_window,
                width,
                height,
            },
        )?;

        let mut timer = StepTimer::new(self.params.provide_timing);
        let mut cache = LumaCache::new(&self.colors);

        let range = if self.params.detect_dark_light {
            luminance_range(bitmap, window, &mut cache)
        } else {
            LumaRange::FULL
        };
        let threshold = range.threshold();
        log::debug!(
            "scan window {window:?}, luminosity {:.3}..{:.3}, threshold {threshold:.3}",
            range.darkest,
            range.lightest
        );
        timer.lap();

        let areas = locate(
            bitmap,
            window,
            &self.profile,
            threshold,
            &mut cache,
            || timer.lap(),
        );

        let cache = &cache;
        let examine = |&area: &Area| self.examine(bitmap, area, threshold, cache);
        #[cfg(feature = "rayon")]
        let candidates: Vec<Candidate> = areas.par_iter().map(examine).collect();
        #[cfg(not(feature = "rayon"))]
        let candidates: Vec<Candidate> = areas.iter().map(examine).collect();

        let mut output = self.assemble(candidates);
        timer.lap();

        output.timing = timer.finish();
        Ok(output)
    }

    fn examine<B: Bitmap + ?Sized>(
        &self,
        bitmap: &B,
        area: Area,
        threshold: f32,
        cache: &LumaCache<'_>,
    ) -> Candidate {
        let profile = &self.profile;
        let sampled = sample_region(
            bitmap,
            area,
            profile.marker_size(),
            threshold,
            cache,
            self.params.provide_grid,
        );

        let reject = |reason: RejectReason, framed: bool| {
            log::debug!("region {area:?} rejected: {reason:?}");
            Candidate::Rejected {
                rejected: RejectedRegion { area, reason },
                framed,
            }
        };

        if !border_is_set(profile, &sampled.bits) {
            return reject(RejectReason::Border, false);
        }
        if self.params.check_orientation
            && !orientation_matches(profile, &sampled.bits).unwrap_or(false)
        {
            return reject(RejectReason::Orientation, true);
        }
        match decode_matrix(profile, &sampled.bits) {
            Ok(marker) => Candidate::Decoded {
                area,
                sampled,
                marker,
            },
            Err(err) => {
                log::debug!("region {area:?}: {err}");
                reject(RejectReason::Uncorrectable, true)
            }
        }
    }

    /// Turn candidates into results: drop regions nested in another framed
    /// region and optionally merge overlapping duplicates.
    fn assemble(&self, candidates: Vec<Candidate>) -> RecognizeOutput {
        let frames: Vec<Area> = candidates
            .iter()
            .filter(|c| c.framed())
            .map(Candidate::area)
            .collect();

        let mut markers: Vec<MarkerResult> = Vec::new();
        let mut kept: Vec<(Area, u64)> = Vec::new();
        let mut rejected = Vec::new();

        for candidate in candidates {
            let (area, sampled, marker) = match candidate {
                Candidate::Rejected { rejected: r, .. } => {
                    rejected.push(r);
                    continue;
                }
                Candidate::Decoded {
                    area,
                    sampled,
                    marker,
                } => (area, sampled, marker),
            };

            if frames.iter().any(|f| *f != area && f.encloses(&area)) {
                rejected.push(RejectedRegion {
                    area,
                    reason: RejectReason::Nested,
                });
                continue;
            }
            if self.params.merge_overlapping
                && kept
                    .iter()
                    .any(|&(a, v)| v == marker.value && a.iou(&area) > 0.5)
            {
                rejected.push(RejectedRegion {
                    area,
                    reason: RejectReason::Duplicate,
                });
                continue;
            }

            kept.push((area, marker.value));
            markers.push(MarkerResult {
                value: marker.value,
                area: self.params.provide_area.then_some(area),
                matrix: self.params.provide_matrix.then_some(sampled.bits),
                grid: sampled.grid,
                errors: self.params.provide_errors.then_some(marker.corrected),
            });
        }

        log::debug!(
            "{} markers decoded, {} regions rejected",
            markers.len(),
            rejected.len()
        );
        if !self.params.provide_errors {
            rejected.clear();
        }

        RecognizeOutput {
            markers,
            rejected,
            timing: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvmark_codec::CodecError;
    use cvmark_core::{Rgba, RgbaImage};

    #[test]
    fn unknown_profile_fails_before_scanning() {
        let err = Recognizer::new(RecognizerParams::for_profile("99X")).unwrap_err();
        assert!(matches!(
            err,
            RecognizeError::Codec(CodecError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn empty_window_is_an_error() {
        let mut params = RecognizerParams::default();
        params.scan_window.x = 100;
        let rec = Recognizer::new(params).expect("recognizer");
        let img = RgbaImage::filled(10, 10, Rgba::WHITE);
        assert!(matches!(
            rec.recognize(&img),
            Err(RecognizeError::EmptyScanWindow { width: 10, .. })
        ));
    }

    #[test]
    fn border_check_ignores_payload() {
        let p = lookup("33N").expect("33N");
        let framed = BitMatrix::from_fn(7, 7, |c, r| !(2..5).contains(&c) || !(2..5).contains(&r));
        assert!(border_is_set(&p, &framed));
        let mut broken = framed.clone();
        broken.toggle(0, 3);
        assert!(!border_is_set(&p, &broken));
    }

    #[test]
    fn timing_has_five_steps() {
        let params = RecognizerParams {
            provide_timing: true,
            detect_dark_light: true,
            ..RecognizerParams::default()
        };
        let rec = Recognizer::new(params).expect("recognizer");
        let img = RgbaImage::filled(32, 32, Rgba::rgb(90, 90, 90));
        let out = rec.recognize(&img).expect("recognize");
        assert!(out.markers.is_empty());
        let timing = out.timing.expect("timing");
        assert_eq!(timing.steps.len(), 5);
        assert!((timing.total - timing.steps.iter().sum::<f64>()).abs() < 1e-9);
        assert_eq!(rec.known_colors(), 1);
    }

    fn decoded(area: Area, value: u64) -> Candidate {
        Candidate::Decoded {
            area,
            sampled: SampledRegion {
                bits: BitMatrix::from_fn(8, 8, |_, _| true),
                grid: None,
            },
            marker: DecodedMarker {
                value,
                corrected: false,
            },
        }
    }

    #[test]
    fn enclosed_regions_are_dropped_without_merging() {
        let params = RecognizerParams {
            provide_errors: true,
            ..RecognizerParams::default()
        };
        let rec = Recognizer::new(params).expect("recognizer");
        let outer = Area::new(20, 20, 80, 80);
        let inner = Area::new(40, 40, 20, 20);
        let shifted = Area::new(22, 20, 80, 80);
        let out = rec.assemble(vec![
            decoded(outer, 300),
            decoded(inner, 7),
            decoded(shifted, 300),
        ]);
        // partial overlap survives while merging is off
        assert_eq!(out.values(), vec![300, 300]);
        assert_eq!(
            out.rejected,
            vec![RejectedRegion {
                area: inner,
                reason: RejectReason::Nested,
            }]
        );
    }

    #[test]
    fn merging_collapses_overlapping_duplicates() {
        let params = RecognizerParams {
            provide_errors: true,
            merge_overlapping: true,
            ..RecognizerParams::default()
        };
        let rec = Recognizer::new(params).expect("recognizer");
        let out = rec.assemble(vec![
            decoded(Area::new(20, 20, 80, 80), 300),
            decoded(Area::new(22, 20, 80, 80), 300),
            decoded(Area::new(200, 20, 80, 80), 300),
        ]);
        assert_eq!(out.values(), vec![300, 300]);
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].reason, RejectReason::Duplicate);
    }
}
