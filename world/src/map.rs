//! Dense terrain storage and canvas projection for the world map.

use glam::Vec2;
use pointwalk_core::{CellCoord, Terrain};

/// Largest number of cells a map may hold.
pub(crate) const MAX_CELLS: u64 = 1 << 24;

/// Row-major terrain grid plus the viewport offset used for canvas lookups.
#[derive(Clone, Debug, Default)]
pub(crate) struct TileMap {
    columns: u32,
    rows: u32,
    tile_length: f32,
    display_origin: Vec2,
    terrain: Vec<Terrain>,
}

impl TileMap {
    /// Creates an all-floor map with the provided dimensions.
    ///
    /// Returns `None` when the map would hold more than [`MAX_CELLS`] cells.
    pub(crate) fn new(columns: u32, rows: u32, tile_length: f32) -> Option<Self> {
        let cells = u64::from(columns) * u64::from(rows);
        if cells > MAX_CELLS {
            return None;
        }
        let capacity = usize::try_from(cells).ok()?;
        Some(Self {
            columns,
            rows,
            tile_length,
            display_origin: Vec2::ZERO,
            terrain: vec![Terrain::Floor; capacity],
        })
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    pub(crate) fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Terrain of the cell, or `None` outside the map.
    pub(crate) fn terrain(&self, cell: CellCoord) -> Option<Terrain> {
        self.index(cell)
            .and_then(|index| self.terrain.get(index).copied())
    }

    /// Overwrites the terrain of the cell, reporting whether it lay inside the map.
    pub(crate) fn set_terrain(&mut self, cell: CellCoord, terrain: Terrain) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };
        match self.terrain.get_mut(index) {
            Some(slot) => {
                *slot = terrain;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_display_origin(&mut self, origin: Vec2) {
        self.display_origin = origin;
    }

    /// Cell drawn under the canvas position.
    ///
    /// The result may lie outside the map; only positions left of or above
    /// the map origin, non-finite positions and degenerate tile lengths
    /// produce `None`.
    pub(crate) fn canvas_to_cell(&self, position: Vec2) -> Option<CellCoord> {
        if !(self.tile_length.is_finite() && self.tile_length > 0.0) {
            return None;
        }

        let scaled = ((position + self.display_origin) / self.tile_length).floor();
        Some(CellCoord::new(to_index(scaled.x)?, to_index(scaled.y)?))
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

fn to_index(value: f32) -> Option<u32> {
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f32 {
        return None;
    }
    Some(value as u32)
}
