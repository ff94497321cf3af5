use std::fmt;

use serde::{Deserialize, Serialize};

/// State of one payload cell while a marker is being built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum CellState {
    /// Not assigned, painted as background.
    #[default]
    Unset,
    Set,
    /// Orientation sentinel with its fixed value.
    Reserved(bool),
}

impl CellState {
    /// Whether the cell is painted in the foreground color.
    #[inline]
    pub fn is_dark(self) -> bool {
        matches!(self, CellState::Set | CellState::Reserved(true))
    }

    #[inline]
    pub fn is_reserved(self) -> bool {
        matches!(self, CellState::Reserved(_))
    }
}

/// Row-major `width × height` payload grid produced by the encoder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CellMatrix {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<CellState>,
}

impl CellMatrix {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![CellState::Unset; width * height],
        }
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<CellState> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells.get(row * self.width + col).copied()
    }

    /// Classification view: dark cells become `true`.
    pub fn to_bits(&self) -> BitMatrix {
        BitMatrix {
            cols: self.width,
            rows: self.height,
            bits: self.cells.iter().map(|c| c.is_dark()).collect(),
        }
    }
}

/// Row-major grid of classified cells; `true` means set (dark).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitMatrix {
    pub cols: usize,
    pub rows: usize,
    pub bits: Vec<bool>,
}

impl BitMatrix {
    pub fn from_fn(cols: usize, rows: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut bits = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                bits.push(f(col, row));
            }
        }
        Self { cols, rows, bits }
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<bool> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.bits.get(row * self.cols + col).copied()
    }

    /// Flip one cell in place. Out-of-range coordinates are ignored.
    pub fn toggle(&mut self, col: usize, row: usize) {
        if col < self.cols && row < self.rows {
            let idx = row * self.cols + col;
            self.bits[idx] = !self.bits[idx];
        }
    }

    /// One string per row, `'1'` for set cells.
    pub fn rows_as_strings(&self) -> Vec<String> {
        self.bits
            .chunks(self.cols.max(1))
            .map(|row| row.iter().map(|&b| if b { '1' } else { '0' }).collect())
            .collect()
    }
}

impl fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows_as_strings().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(row)?;
        }
        Ok(())
    }
}
