//! Uniform grid broad phase
//!
//! Maps obstacle bounding boxes to ids so a ball only runs narrow-phase tests
//! against the few obstacles sharing its cells.
//!
//! ## Cell Size Choice
//!
//! The cell size is fixed at construction. Roughly one block is a good
//! default: much smaller and a wide paddle touches many cells per insert,
//! much larger and every query degenerates toward brute force.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use crate::config::WorldConfig;

/// Upper bound on grid cells; larger fields get coarser cells
pub const MAX_CELLS: usize = 1 << 20;

/// Occupancy numbers for tuning the cell size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    /// Ids currently stored
    pub objects: usize,
    /// Cells holding at least one id
    pub occupied_cells: usize,
    pub total_cells: usize,
    /// Mean ids per occupied cell
    pub average_occupancy: f64,
}

/// Inclusive cell coordinate range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    min_col: usize,
    max_col: usize,
    min_row: usize,
    max_row: usize,
}

/// Uniform grid over the play field
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    width: f64,
    height: f64,
    cols: usize,
    rows: usize,
    /// Row-major cells, ids kept sorted
    cells: Vec<Vec<u32>>,
    /// Last inserted bounds per id
    entries: HashMap<u32, Rect>,
}

impl SpatialIndex {
    /// Grid covering `width` x `height` with square cells of `cell_size`
    pub fn new(width: f64, height: f64, cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            log::warn!("Invalid cell size {}, using {}", cell_size, crate::consts::CELL_SIZE);
            crate::consts::CELL_SIZE
        };
        let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        let height = if height.is_finite() { height.max(0.0) } else { 0.0 };
        let cell_size = Self::capped_cell_size(width, height, cell_size);
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);

        log::debug!(
            "Spatial index {}x{} cells ({}x{} field, cell {})",
            cols,
            rows,
            width,
            height,
            cell_size
        );

        Self {
            cell_size,
            width,
            height,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
            entries: HashMap::new(),
        }
    }

    /// Grow `cell_size` until the grid fits in [`MAX_CELLS`]
    fn capped_cell_size(width: f64, height: f64, cell_size: f64) -> f64 {
        let cell_count = |size: f64| (width / size).ceil().max(1.0) * (height / size).ceil().max(1.0);
        let mut size = cell_size;
        while cell_count(size) > MAX_CELLS as f64 {
            size *= 2.0;
        }
        if size != cell_size {
            log::warn!(
                "Spatial index: {}x{} field needs too many cells at size {}, using {}",
                width,
                height,
                cell_size,
                size
            );
        }
        size
    }

    /// Grid sized for a world config
    pub fn for_config(config: &WorldConfig) -> Self {
        Self::new(config.field_width, config.field_height, config.cell_size)
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// (columns, rows)
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of stored ids
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    /// Bounds recorded for `id`
    pub fn bounds(&self, id: u32) -> Option<Rect> {
        self.entries.get(&id).copied()
    }

    /// The whole grid area
    pub fn extent(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    fn col_of(&self, x: f64) -> usize {
        ((x / self.cell_size).floor().max(0.0) as usize).min(self.cols - 1)
    }

    fn row_of(&self, y: f64) -> usize {
        ((y / self.cell_size).floor().max(0.0) as usize).min(self.rows - 1)
    }

    /// Cells overlapped by `rect`, clamped to the grid
    fn cell_range(&self, rect: &Rect) -> CellRange {
        CellRange {
            min_col: self.col_of(rect.left()),
            max_col: self.col_of(rect.right()),
            min_row: self.row_of(rect.top()),
            max_row: self.row_of(rect.bottom()),
        }
    }

    fn cell_indices(&self, range: CellRange) -> impl Iterator<Item = usize> + '_ {
        (range.min_row..=range.max_row)
            .flat_map(move |row| (range.min_col..=range.max_col).map(move |col| row * self.cols + col))
    }

    /// Insert or move `id` to cover `rect`
    ///
    /// Rectangles outside the grid are kept in the nearest edge cells.
    pub fn insert(&mut self, id: u32, rect: Rect) {
        if !rect.is_finite() {
            log::warn!("Spatial index: non-finite bounds for {} ignored", id);
            return;
        }
        self.remove(id);

        let range = self.cell_range(&rect);
        let indices: Vec<usize> = self.cell_indices(range).collect();
        for index in indices {
            let cell = &mut self.cells[index];
            if let Err(pos) = cell.binary_search(&id) {
                cell.insert(pos, id);
            }
        }
        self.entries.insert(id, rect);
    }

    /// Alias for [`SpatialIndex::insert`] for moving obstacles
    pub fn update(&mut self, id: u32, rect: Rect) {
        self.insert(id, rect);
    }

    /// Remove `id`; false if it was not present
    pub fn remove(&mut self, id: u32) -> bool {
        let Some(rect) = self.entries.remove(&id) else {
            return false;
        };
        let range = self.cell_range(&rect);
        let indices: Vec<usize> = self.cell_indices(range).collect();
        for index in indices {
            let cell = &mut self.cells[index];
            if let Ok(pos) = cell.binary_search(&id) {
                cell.remove(pos);
            }
        }
        true
    }

    /// Ids whose bounds overlap `region`, sorted ascending
    ///
    /// Regions outside the grid still find objects clamped into the edge cells.
    pub fn query(&self, region: &Rect) -> Vec<u32> {
        if !region.is_finite() {
            return Vec::new();
        }

        let range = self.cell_range(region);
        let mut ids: Vec<u32> = self
            .cell_indices(range)
            .flat_map(|index| self.cells[index].iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.retain(|id| self.entries.get(id).is_some_and(|rect| rect.overlaps(region)));
        ids
    }

    /// Drop every id (grid size unchanged)
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.entries.clear();
    }

    pub fn stats(&self) -> GridStats {
        let (occupied_cells, total_refs) = self
            .cells
            .iter()
            .filter(|cell| !cell.is_empty())
            .fold((0, 0), |(n, refs), cell| (n + 1, refs + cell.len()));
        GridStats {
            objects: self.entries.len(),
            occupied_cells,
            total_cells: self.cells.len(),
            average_occupancy: if occupied_cells == 0 {
                0.0
            } else {
                total_refs as f64 / occupied_cells as f64
            },
        }
    }
}
