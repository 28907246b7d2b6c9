//! Tuning knobs for the generic sparse-by-dense kernel.
//!
//! This module provides the `KernelHints` struct, which carries the tiling,
//! threading, and loop-order parameters consumed by the generic fallback
//! kernel. Leaving the three numeric hints at their zero sentinel selects
//! the auto-tuned kernel instead; the dispatcher never passes hints to any
//! other combination.

/// Tiling/threading parameters and a loop-order flag.
#[derive(Clone, Debug)]
pub struct KernelHints {
    /// Row-tile extent for the destination (0 = unset).
    pub tile_rows: usize,

    /// Column-tile extent for the destination (0 = unset).
    pub tile_cols: usize,

    /// Worker thread count (0 = unset; kernel picks).
    pub threads: usize,

    /// Traverse row tiles in the outer loop when true, column tiles when
    /// false. Ignored by the auto-tuned kernel.
    pub row_major: bool,
}

impl Default for KernelHints {
    fn default() -> Self {
        Self {
            tile_rows: 0,
            tile_cols: 0,
            threads: 0,
            row_major: true,
        }
    }
}

impl KernelHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every numeric hint is still at its unset sentinel; the
    /// dispatcher then routes to the auto-tuned kernel.
    pub fn is_auto(&self) -> bool {
        self.tile_rows == 0 && self.tile_cols == 0 && self.threads == 0
    }

    pub fn with_tile_rows(mut self, rows: usize) -> Self {
        self.tile_rows = rows;
        self
    }

    pub fn with_tile_cols(mut self, cols: usize) -> Self {
        self.tile_cols = cols;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_row_major(mut self, row_major: bool) -> Self {
        self.row_major = row_major;
        self
    }
}
