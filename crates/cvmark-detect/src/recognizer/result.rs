use cvmark_codec::BitMatrix;
use cvmark_core::Area;
use serde::{Deserialize, Serialize};

use crate::GridImage;

/// One decoded marker. Diagnostic fields are present only when requested.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerResult {
    pub value: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<Area>,
    /// Classified cells including the border rings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<BitMatrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridImage>,
    /// `true` when error correction repaired the codeword.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<bool>,
}

/// Why a confirmed region produced no marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Border rings did not sample as foreground.
    Border,
    /// Region lies inside another framed region.
    Nested,
    /// Orientation cells did not read `set, set, unset`.
    Orientation,
    /// Codeword had more errors than the code can repair.
    Uncorrectable,
    /// Overlaps an earlier region with the same value.
    Duplicate,
}

/// Confirmed region that was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRegion {
    pub area: Area,
    pub reason: RejectReason,
}

/// Step durations in milliseconds.
///
/// Steps: luminosity range, row scan, column scan, intersection,
/// sampling and decoding.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub total: f64,
    pub steps: Vec<f64>,
}

/// Output of one recognition run. An empty `markers` list is a valid result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizeOutput {
    pub markers: Vec<MarkerResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedRegion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
}

impl RecognizeOutput {
    /// Decoded values in result order.
    pub fn values(&self) -> Vec<u64> {
        self.markers.iter().map(|m| m.value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_diagnostics_are_absent() {
        let out = RecognizeOutput {
            markers: vec![MarkerResult {
                value: 300,
                area: None,
                matrix: None,
                grid: None,
                errors: None,
            }],
            rejected: Vec::new(),
            timing: None,
        };
        let json = serde_json::to_string(&out).expect("json");
        assert_eq!(json, r#"{"markers":[{"value":300}]}"#);
    }

    #[test]
    fn rejected_regions_serialize_reason() {
        let out = RecognizeOutput {
            rejected: vec![RejectedRegion {
                area: Area::new(1, 2, 3, 4),
                reason: RejectReason::Uncorrectable,
            }],
            ..RecognizeOutput::default()
        };
        let json = serde_json::to_string(&out).expect("json");
        assert!(json.contains(r#""reason":"uncorrectable""#));
        let back: RecognizeOutput = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, out);
    }
}
