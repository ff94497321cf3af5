//! Built-in marker profiles.

use serde::Serialize;

use crate::{CodecError, ErrorCorrectingCode, HammingCode};

/// Named marker geometry and redundancy layout.
///
/// All sizes are in cells. A rendered marker is
/// `width + 2 * (border + margin)` cells wide: an outer light quiet zone of
/// `margin` rings, a dark frame of `border` rings, and the `width × height`
/// payload grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MarkerProfile {
    /// Catalog identifier, e.g. `"44O"`.
    pub name: &'static str,
    /// Light quiet-zone rings around the border.
    pub margin: usize,
    /// Dark frame rings around the payload grid.
    pub border: usize,
    /// Payload grid columns.
    pub width: usize,
    /// Payload grid rows.
    pub height: usize,
    /// Number of orientation sentinel cells (0 or 3).
    pub orientation: usize,
    /// Redundancy class column `h` of the catalog.
    ///
    /// The effective codeword length is [`MarkerProfile::codeword_bits`].
    pub codeword_class: usize,
    /// Payload cells left over after the codeword (catalog column `s`).
    pub spare_cells: usize,
    /// Raw data bits; valid values are `0..2^payload_bits`.
    pub payload_bits: usize,
}

const fn profile(
    name: &'static str,
    orientation: usize,
    side: usize,
    codeword_class: usize,
    spare_cells: usize,
    payload_bits: usize,
) -> MarkerProfile {
    MarkerProfile {
        name,
        margin: 2,
        border: 2,
        width: side,
        height: side,
        orientation,
        codeword_class,
        spare_cells,
        payload_bits,
    }
}

/// The nine predefined profiles. `O` variants carry orientation cells, `N` do not.
pub const PROFILES: [MarkerProfile; 9] = [
    profile("22N", 0, 2, 2, 1, 1),
    profile("33O", 3, 3, 3, 0, 3),
    profile("33N", 0, 3, 4, 0, 5),
    profile("44O", 3, 4, 4, 0, 9),
    profile("44N", 0, 4, 4, 1, 11),
    profile("55O", 3, 5, 5, 0, 17),
    profile("55N", 0, 5, 5, 0, 20),
    profile("66O", 3, 6, 6, 0, 27),
    profile("66N", 0, 6, 6, 0, 30),
];

/// Look up a profile by name. Unknown names are a hard error.
pub fn lookup(name: &str) -> Result<MarkerProfile, CodecError> {
    PROFILES
        .iter()
        .find(|p| p.name == name)
        .copied()
        .ok_or_else(|| CodecError::InvalidProfile {
            name: name.to_string(),
        })
}

/// Names of all built-in profiles in catalog order.
pub fn profile_names() -> impl Iterator<Item = &'static str> {
    PROFILES.iter().map(|p| p.name)
}

impl MarkerProfile {
    /// Exclusive upper bound for payload values.
    #[inline]
    pub fn value_limit(&self) -> u64 {
        1u64 << self.payload_bits
    }

    /// Payload cells (`width * height`), orientation cells included.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Cells across the dark body horizontally: `2 * border + width`.
    #[inline]
    pub fn marker_cols(&self) -> usize {
        2 * self.border + self.width
    }

    /// Cells across the dark body vertically: `2 * border + height`.
    #[inline]
    pub fn marker_rows(&self) -> usize {
        2 * self.border + self.height
    }

    /// Minimum run length (in pixels) of a dark body along either axis.
    #[inline]
    pub fn marker_size(&self) -> usize {
        self.marker_cols().min(self.marker_rows())
    }

    /// Full rendered extent in cells, quiet zone included.
    #[inline]
    pub fn extent(&self) -> (usize, usize) {
        let ring = self.border + self.margin;
        (self.width + 2 * ring, self.height + 2 * ring)
    }

    /// Payload-grid indices of the orientation sentinels: `[set, set, unset]`.
    pub fn orientation_indices(&self) -> Option<[usize; 3]> {
        (self.orientation > 0).then(|| {
            [
                0,
                self.width * (self.height - 1),
                self.width * self.height - 1,
            ]
        })
    }

    #[inline]
    pub fn is_orientation_index(&self, idx: usize) -> bool {
        self.orientation_indices()
            .is_some_and(|ids| ids.contains(&idx))
    }

    /// Payload cells available for the codeword.
    #[inline]
    pub fn data_cells(&self) -> usize {
        self.cell_count() - if self.orientation > 0 { 3 } else { 0 }
    }

    /// Error-correcting code protecting this profile's payload.
    #[inline]
    pub fn code(&self) -> HammingCode {
        HammingCode::new(self.payload_bits)
    }

    /// Codeword length in bits.
    #[inline]
    pub fn codeword_bits(&self) -> usize {
        self.code().codeword_len()
    }
}
