// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Translation between logical pad numbering and display order.
//!
//! Logical indices follow hardware convention: pad 0 is bottom-left and numbering runs
//! left to right, bottom row first. Display indices follow rendering convention: index 0
//! is top-left and rows run top to bottom. Keyboard legends and MIDI notes are expressed
//! logically, pads are drawn in display order.

/// Default number of pad rows.
pub const DEFAULT_ROWS: usize = 4;

/// Default number of pad columns.
pub const DEFAULT_COLS: usize = 4;

/// A pad grid of `rows` x `cols`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    rows: usize,
    cols: usize,
}

impl GridLayout {
    /// Creates a grid layout. Zero-sized dimensions are raised to one.
    pub fn new(rows: usize, cols: usize) -> GridLayout {
        GridLayout {
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The number of pads in the grid.
    pub fn pad_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Maps a logical pad index to its display position.
    pub fn logical_to_display(&self, pad_index: usize) -> Option<usize> {
        self.flip(pad_index)
    }

    /// Maps a display position back to its logical pad index.
    pub fn display_to_logical(&self, display_index: usize) -> Option<usize> {
        // Flipping the rows is an involution, so the same formula inverts itself.
        self.flip(display_index)
    }

    fn flip(&self, index: usize) -> Option<usize> {
        if index >= self.pad_count() {
            return None;
        }
        let row = index / self.cols;
        let col = index % self.cols;
        Some((self.rows - 1 - row) * self.cols + col)
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        GridLayout::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

/// Maps a logical pad index to its display position on the default 4x4 grid.
pub fn logical_to_display(pad_index: usize) -> Option<usize> {
    GridLayout::default().logical_to_display(pad_index)
}

/// Maps a display position to its logical pad index on the default 4x4 grid.
pub fn display_to_logical(display_index: usize) -> Option<usize> {
    GridLayout::default().display_to_logical(display_index)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        for pad in 0..16 {
            let display = logical_to_display(pad).expect("pad should be in range");
            assert_eq!(Some(pad), display_to_logical(display));
        }
    }

    #[test]
    fn test_corners() {
        // Bottom-left logical pad is drawn in the last row.
        assert_eq!(Some(12), logical_to_display(0));
        assert_eq!(Some(15), logical_to_display(3));
        // Top-right logical pad is drawn first row, last column.
        assert_eq!(Some(3), logical_to_display(15));
        assert_eq!(Some(0), logical_to_display(12));
    }

    #[test]
    fn test_bijection() {
        let mut seen = [false; 16];
        for pad in 0..16 {
            let display = logical_to_display(pad).unwrap();
            assert!(!seen[display], "display index {} produced twice", display);
            seen[display] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(None, logical_to_display(16));
        assert_eq!(None, display_to_logical(100));
    }

    #[test]
    fn test_non_square_grid() {
        let layout = GridLayout::new(2, 3);
        assert_eq!(6, layout.pad_count());
        assert_eq!(Some(3), layout.logical_to_display(0));
        assert_eq!(Some(2), layout.logical_to_display(5));
        for pad in 0..6 {
            let display = layout.logical_to_display(pad).unwrap();
            assert_eq!(Some(pad), layout.display_to_logical(display));
        }
    }
}
