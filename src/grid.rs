//! The 32×32 pixel grid that mirrors what the physical display shows.

use crate::{BACKGROUND, Color, GRID_SIZE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cell ({row}, {col}) is outside the {size}x{size} grid", size = GRID_SIZE)]
pub struct GridError {
    pub row: usize,
    pub col: usize,
}

/// A fixed-size matrix of opaque colors, indexed `(row, col)` with row 0 at
/// the top.
///
/// The dimensions are part of the type (a `[[Color; 32]; 32]`), so no
/// operation can ever produce a grid of a different shape.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PixelGrid {
    cells: [[Color; GRID_SIZE]; GRID_SIZE],
}

impl PixelGrid {
    /// A grid with every cell set to [`BACKGROUND`].
    pub fn new() -> Self {
        Self::filled(BACKGROUND)
    }

    pub fn filled(color: Color) -> Self {
        Self {
            cells: [[color; GRID_SIZE]; GRID_SIZE],
        }
    }

    /// Build a grid by calling `f(row, col)` for every cell.
    pub fn from_fn(mut f: impl FnMut(usize, usize) -> Color) -> Self {
        let mut grid = Self::new();
        for (r, row) in grid.cells.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = f(r, c);
            }
        }
        grid
    }

    pub fn get(&self, row: usize, col: usize) -> Result<Color, GridError> {
        Self::check(row, col)?;
        Ok(self.cells[row][col])
    }

    /// Set exactly one cell. Returns `Ok(false)` when the cell already held
    /// `color` and nothing was written.
    pub fn paint(&mut self, row: usize, col: usize, color: Color) -> Result<bool, GridError> {
        Self::check(row, col)?;
        let cell = &mut self.cells[row][col];
        if *cell == color {
            return Ok(false);
        }
        *cell = color;
        Ok(true)
    }

    /// Reset every cell to [`BACKGROUND`].
    pub fn clear(&mut self) {
        self.cells = [[BACKGROUND; GRID_SIZE]; GRID_SIZE];
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Color; GRID_SIZE]> {
        self.cells.iter()
    }

    /// Every cell as `(row, col, color)`, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Color)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, &color)| (r, c, color)))
    }

    /// Number of cells that differ from the background.
    pub fn lit_count(&self) -> usize {
        self.cells().filter(|&(_, _, c)| c != BACKGROUND).count()
    }

    fn check(row: usize, col: usize) -> Result<(), GridError> {
        if row < GRID_SIZE && col < GRID_SIZE {
            Ok(())
        } else {
            Err(GridError { row, col })
        }
    }
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PixelGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PixelGrid({GRID_SIZE}x{GRID_SIZE}, {} lit)", self.lit_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const RED: Color = Color::new(255, 0, 0);

    #[test]
    fn new_grid_is_all_background() {
        let grid = PixelGrid::new();
        assert_eq!(grid.rows().count(), GRID_SIZE);
        assert!(grid.rows().all(|row| row.len() == GRID_SIZE));
        assert!(grid.cells().all(|(_, _, c)| c == BACKGROUND));
        assert_eq!(grid.lit_count(), 0);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(0, 31)]
    #[case(31, 0)]
    #[case(31, 31)]
    #[case(15, 7)]
    fn paint_sets_exactly_one_cell(#[case] row: usize, #[case] col: usize) {
        let mut grid = PixelGrid::new();
        assert!(grid.paint(row, col, RED).unwrap());
        assert_eq!(grid.get(row, col).unwrap(), RED);

        for (r, c, color) in grid.cells() {
            if (r, c) != (row, col) {
                assert_eq!(color, BACKGROUND, "cell ({r}, {c}) changed");
            }
        }
        assert_eq!(grid.lit_count(), 1);
    }

    #[test]
    fn repainting_same_color_is_a_noop() {
        let mut grid = PixelGrid::new();
        assert!(grid.paint(3, 4, RED).unwrap());
        assert!(!grid.paint(3, 4, RED).unwrap());
        assert_eq!(grid.get(3, 4).unwrap(), RED);
    }

    #[rstest]
    #[case(32, 0)]
    #[case(0, 32)]
    #[case(100, 100)]
    fn out_of_bounds_is_rejected(#[case] row: usize, #[case] col: usize) {
        let mut grid = PixelGrid::new();
        assert_eq!(grid.paint(row, col, RED), Err(GridError { row, col }));
        assert_eq!(grid.get(row, col), Err(GridError { row, col }));
        assert_eq!(grid, PixelGrid::new());
    }

    #[test]
    fn clear_resets_every_cell() {
        let mut grid = PixelGrid::filled(RED);
        grid.clear();
        for (r, c, color) in grid.cells() {
            assert_eq!(color, BACKGROUND, "cell ({r}, {c})");
        }
    }

    #[test]
    fn from_fn_visits_row_major() {
        let grid = PixelGrid::from_fn(|r, c| Color::new(r as u8, c as u8, 0));
        assert_eq!(grid.get(2, 9).unwrap(), Color::new(2, 9, 0));
        assert_eq!(grid.get(31, 0).unwrap(), Color::new(31, 0, 0));
    }

    #[test]
    fn serializes_as_nested_hex_rows() {
        let mut grid = PixelGrid::new();
        grid.paint(0, 1, RED).unwrap();

        let value = serde_json::to_value(&grid).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), GRID_SIZE);
        assert_eq!(rows[0][0], "#000000");
        assert_eq!(rows[0][1], "#FF0000");

        let back: PixelGrid = serde_json::from_value(value).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn deserialize_rejects_wrong_shape() {
        let short = serde_json::json!([["#000000"]]);
        assert!(serde_json::from_value::<PixelGrid>(short).is_err());
    }
}
