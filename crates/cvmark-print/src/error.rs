use cvmark_codec::CodecError;

/// Errors returned while rendering a marker.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("invalid length {input:?} (expected a number with optional cm, in, px or pt suffix)")]
    InvalidLength { input: String },
    #[error("invalid color {input:?}")]
    InvalidColor { input: String },
    #[error("invalid position handle {input:?} (expected tl, tr, bl or br)")]
    InvalidHandle { input: String },
    #[error("invalid output format {input:?} (expected svg or png)")]
    InvalidFormat { input: String },
    #[error("canvas {width}x{height} or cell size {cell} is not positive")]
    EmptyCanvas { width: f64, height: f64, cell: f64 },
    #[error(transparent)]
    Png(#[from] png::EncodingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<cvmark_core::ColorParseError> for RenderError {
    fn from(err: cvmark_core::ColorParseError) -> Self {
        RenderError::InvalidColor { input: err.input }
    }
}
