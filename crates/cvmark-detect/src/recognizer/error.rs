use cvmark_codec::CodecError;

use super::ScanWindow;

/// Errors returned by the recognizer.
///
/// Per-region decode failures are not errors; they only show up in
/// [`RecognizeOutput::rejected`](super::RecognizeOutput::rejected).
#[derive(thiserror::Error, Debug)]
pub enum RecognizeError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("scan window {window:?} does not intersect the {width}x{height} bitmap")]
    EmptyScanWindow {
        window: ScanWindow,
        width: usize,
        height: usize,
    },
}
