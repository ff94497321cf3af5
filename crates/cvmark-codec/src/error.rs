/// Errors produced while looking up profiles, encoding, or decoding markers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid marker profile {name:?}")]
    InvalidProfile { name: String },

    #[error("invalid marker data {input:?}: {reason}")]
    InvalidData { input: String, reason: &'static str },

    #[error("marker data {value} out of range [0, {limit})")]
    DataOutOfRange { value: i128, limit: u64 },

    #[error("uncorrectable codeword (syndrome {syndrome})")]
    UncorrectableData { syndrome: usize },

    #[error("codeword has {got} digits, expected {expected}")]
    CodewordLength { expected: usize, got: usize },

    #[error("cell matrix is {got_cols}x{got_rows}, expected {expected_cols}x{expected_rows}")]
    MatrixShape {
        expected_cols: usize,
        expected_rows: usize,
        got_cols: usize,
        got_rows: usize,
    },
}
