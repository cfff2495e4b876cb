//! Pencil/eraser editing and drag-paint on top of a [`PixelGrid`].
//!
//! A drag is a pointer-down on one cell followed by pointer-enter events on
//! others; every entered cell is painted until pointer-up or the pointer
//! leaves the grid. Cells skipped by a fast pointer are not interpolated.

use crate::grid::{GridError, PixelGrid};
use crate::{BACKGROUND, Color, DEFAULT_PENCIL_COLOR};
use serde::{Deserialize, Serialize};

/// What a write puts into a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Pencil,
    Eraser,
}

/// A grid plus the tool state used to edit it.
#[derive(Debug, Clone)]
pub struct Editor {
    grid: PixelGrid,
    tool: Tool,
    color: Color,
    drawing: bool,
}

impl Editor {
    pub fn new() -> Self {
        Self {
            grid: PixelGrid::new(),
            tool: Tool::Pencil,
            color: DEFAULT_PENCIL_COLOR,
            drawing: false,
        }
    }

    pub fn grid(&self) -> &PixelGrid {
        &self.grid
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// The pencil color, kept even while the eraser is active.
    pub fn selected_color(&self) -> Color {
        self.color
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Picking a color always switches back to the pencil.
    pub fn select_color(&mut self, color: Color) {
        self.color = color;
        self.tool = Tool::Pencil;
    }

    /// The color the current tool writes.
    pub fn active_color(&self) -> Color {
        match self.tool {
            Tool::Pencil => self.color,
            Tool::Eraser => BACKGROUND,
        }
    }

    /// Paint one cell with the active tool.
    pub fn apply(&mut self, row: usize, col: usize) -> Result<bool, GridError> {
        let color = self.active_color();
        self.grid.paint(row, col, color)
    }

    /// Start a stroke: paint the cell under the pointer and begin drawing.
    ///
    /// An out-of-bounds cell leaves the session untouched.
    pub fn pointer_down(&mut self, row: usize, col: usize) -> Result<bool, GridError> {
        let changed = self.apply(row, col)?;
        self.drawing = true;
        Ok(changed)
    }

    /// Continue a stroke. Does nothing unless a stroke is in progress.
    pub fn pointer_enter(&mut self, row: usize, col: usize) -> Result<bool, GridError> {
        if !self.drawing {
            return Ok(false);
        }
        self.apply(row, col)
    }

    pub fn pointer_up(&mut self) {
        self.drawing = false;
    }

    pub fn pointer_leave(&mut self) {
        self.drawing = false;
    }

    pub fn clear(&mut self) {
        self.grid.clear();
        self.drawing = false;
    }

    /// Replace the grid wholesale, e.g. with a rasterized image. Any stroke
    /// in progress ends.
    pub fn load(&mut self, grid: PixelGrid) {
        self.grid = grid;
        self.drawing = false;
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
