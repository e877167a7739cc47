// mapping/grid.rs

// Square occupancy grid. The file lists the top row first, so the first value
// read lands in row SIZE-1 and the last line of the file is row 0. Rendering
// reverses this, so a printed grid looks like the file.

use log::info;
use std::fmt::Write as _;
use std::path::Path;

use super::plan::PlanError;
use crate::RoamerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    size: usize,
    // row-major, row 0 at the bottom
    cells: Vec<bool>,
}

impl OccupancyGrid {
    /// All cells free
    pub fn empty(size: usize) -> Result<Self, PlanError> {
        let count = size.checked_mul(size).ok_or(PlanError::MapTooLarge(size))?;
        Ok(OccupancyGrid {
            size,
            cells: vec![false; count],
        })
    }

    /// Parse `size * size` whitespace-separated integers. Non-zero is occupied.
    pub fn parse(text: &str, size: usize) -> Result<Self, PlanError> {
        let expected = size.checked_mul(size).ok_or(PlanError::MapTooLarge(size))?;
        // read the values before sizing the grid, so a bad size fails on the text
        let mut values = Vec::new();
        for token in text.split_whitespace().take(expected) {
            let value: i64 = token
                .parse()
                .map_err(|_| PlanError::Malformed(token.to_string()))?;
            values.push(value != 0);
        }
        if values.len() < expected {
            return Err(PlanError::Truncated { expected, found: values.len() });
        }

        let mut grid = OccupancyGrid::empty(size)?;
        for (i, occupied) in values.into_iter().enumerate() {
            let row = size - 1 - i / size;
            let col = i % size;
            grid.cells[row * size + col] = occupied;
        }
        Ok(grid)
    }

    pub fn load(path: impl AsRef<Path>, size: usize) -> Result<Self, RoamerError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let grid = OccupancyGrid::parse(&text, size)?;
        info!(
            "Loaded {}x{} map from {} ({} occupied cells)",
            size,
            size,
            path.display(),
            grid.occupied_count()
        );
        Ok(grid)
    }

    /// Grid as text, top row first, one row per line
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() * 2 + self.size);
        for row in (0..self.size).rev() {
            for col in 0..self.size {
                let _ = write!(out, "{} ", u8::from(self.cells[row * self.size + col]));
            }
            out.push('\n');
        }
        out
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size
    }

    /// Occupied, or outside the grid
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        !self.contains(row, col) || self.cells[row * self.size + col]
    }

    pub fn set_occupied(&mut self, row: usize, col: usize, occupied: bool) {
        if self.contains(row, col) {
            self.cells[row * self.size + col] = occupied;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}
