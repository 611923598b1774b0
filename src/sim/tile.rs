//! Static tile colliders
//!
//! A tile layer only has to answer one question: which tiles overlap this
//! rectangle. The answer starts with a layer-level sentinel entry when asked
//! for one; the dispatcher skips index 0.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::Edges;
use super::rect::Rect;

/// A static grid cell; never moved, never given velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Tile index in the map data (0 = empty)
    pub index: u32,
    /// World-space bounds
    pub bounds: Rect,
    /// Edges that stop bodies
    pub collide: Edges,
}

impl Tile {
    pub fn new(index: u32, bounds: Rect, collide: Edges) -> Self {
        Self {
            index,
            bounds,
            collide,
        }
    }

    /// Layer-level placeholder placed ahead of the real tiles
    pub fn sentinel(area: Rect) -> Self {
        Self::new(0, area, Edges::NONE)
    }

    #[inline]
    pub fn collides(&self) -> bool {
        self.collide.any()
    }
}

/// Source of tiles for the dispatcher
pub trait TileLayer {
    /// Tiles overlapping `area` in scan order, preceded by a sentinel if `with_sentinel`
    fn get_tiles(&self, area: Rect, with_sentinel: bool) -> Vec<Tile>;

    /// A hidden or destroyed layer takes part in no collision
    fn exists(&self) -> bool {
        true
    }
}

/// Row-major tile map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    /// World position of the top-left tile
    pub origin: Vec2,
    pub tile_width: f32,
    pub tile_height: f32,
    columns: usize,
    rows: usize,
    indices: Vec<u32>,
    /// Collision flags per cell, derived from `colliding` and neighbours
    collide: Vec<Edges>,
    /// Tile indices that collide
    colliding: Vec<u32>,
    pub exists: bool,
}

impl TileGrid {
    pub fn new(columns: usize, rows: usize, tile_width: f32, tile_height: f32) -> Self {
        Self {
            origin: Vec2::ZERO,
            tile_width,
            tile_height,
            columns,
            rows,
            indices: vec![0; columns * rows],
            collide: vec![Edges::NONE; columns * rows],
            colliding: Vec::new(),
            exists: true,
        }
    }

    /// Build from rows of tile indices; short rows are padded with empty tiles
    pub fn from_rows(rows: &[Vec<u32>], tile_width: f32, tile_height: f32) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Self::new(columns, rows.len(), tile_width, tile_height);
        for (ty, row) in rows.iter().enumerate() {
            for (tx, &index) in row.iter().enumerate() {
                grid.indices[ty * columns + tx] = index;
            }
        }
        grid
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn cell(&self, tx: usize, ty: usize) -> Option<usize> {
        (tx < self.columns && ty < self.rows).then(|| ty * self.columns + tx)
    }

    fn tile_bounds(&self, tx: usize, ty: usize) -> Rect {
        Rect::new(
            self.origin.x + tx as f32 * self.tile_width,
            self.origin.y + ty as f32 * self.tile_height,
            self.tile_width,
            self.tile_height,
        )
    }

    /// Tile at grid coordinates, if any
    pub fn tile_at(&self, tx: usize, ty: usize) -> Option<Tile> {
        let cell = self.cell(tx, ty)?;
        let index = self.indices[cell];
        (index != 0).then(|| Tile::new(index, self.tile_bounds(tx, ty), self.collide[cell]))
    }

    /// Place a tile (0 clears the cell)
    pub fn put_tile(&mut self, index: u32, tx: usize, ty: usize) {
        if let Some(cell) = self.cell(tx, ty) {
            self.indices[cell] = index;
            self.calculate_faces();
        }
    }

    /// Mark a tile index as solid (or not)
    pub fn set_collision(&mut self, index: u32, collides: bool) {
        self.set_collision_between(index, index, collides);
    }

    /// Mark every tile index in `start..=end` as solid (or not)
    pub fn set_collision_between(&mut self, start: u32, end: u32, collides: bool) {
        for index in start..=end {
            if index == 0 {
                continue;
            }
            let known = self.colliding.contains(&index);
            if collides && !known {
                self.colliding.push(index);
            } else if !collides && known {
                self.colliding.retain(|&i| i != index);
            }
        }
        self.calculate_faces();
    }

    fn is_solid(&self, tx: isize, ty: isize) -> bool {
        if tx < 0 || ty < 0 {
            return false;
        }
        self.cell(tx as usize, ty as usize)
            .is_some_and(|cell| self.colliding.contains(&self.indices[cell]))
    }

    /// Recompute per-edge collision, disabling edges shared by two solid tiles
    ///
    /// Interior seams must not stop a body sliding along a row of tiles.
    pub fn calculate_faces(&mut self) {
        for ty in 0..self.rows {
            for tx in 0..self.columns {
                let (x, y) = (tx as isize, ty as isize);
                let edges = if self.is_solid(x, y) {
                    Edges {
                        up: !self.is_solid(x, y - 1),
                        down: !self.is_solid(x, y + 1),
                        left: !self.is_solid(x - 1, y),
                        right: !self.is_solid(x + 1, y),
                    }
                } else {
                    Edges::NONE
                };
                self.collide[ty * self.columns + tx] = edges;
            }
        }
    }
}

impl TileLayer for TileGrid {
    fn get_tiles(&self, area: Rect, with_sentinel: bool) -> Vec<Tile> {
        let mut tiles = Vec::new();
        if with_sentinel {
            tiles.push(Tile::sentinel(area));
        }
        if self.columns == 0 || self.rows == 0 || area.is_empty() {
            return tiles;
        }

        // Grid cell range covering the area, clamped to the map
        let to_cell = |v: f32, origin: f32, size: f32, count: usize| -> Option<usize> {
            let c = ((v - origin) / size).floor();
            if c.is_nan() {
                None
            } else {
                Some(c.clamp(0.0, (count - 1) as f32) as usize)
            }
        };
        let (Some(x0), Some(x1), Some(y0), Some(y1)) = (
            to_cell(area.x, self.origin.x, self.tile_width, self.columns),
            to_cell(area.right(), self.origin.x, self.tile_width, self.columns),
            to_cell(area.y, self.origin.y, self.tile_height, self.rows),
            to_cell(area.bottom(), self.origin.y, self.tile_height, self.rows),
        ) else {
            return tiles;
        };

        for ty in y0..=y1 {
            for tx in x0..=x1 {
                if let Some(tile) = self.tile_at(tx, ty) {
                    if tile.collides() && tile.bounds.intersects(&area) {
                        tiles.push(tile);
                    }
                }
            }
        }
        tiles
    }

    fn exists(&self) -> bool {
        self.exists
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> TileGrid {
        // Three-tile floor on row 2, one floating block at (1, 0)
        let mut grid = TileGrid::from_rows(&[vec![0, 2, 0], vec![0, 0, 0], vec![1, 1, 1]], 16.0, 16.0);
        grid.set_collision_between(1, 2, true);
        grid
    }

    #[test]
    fn test_sentinel_leads_results() {
        let grid = floor();
        let area = Rect::new(0.0, 30.0, 48.0, 10.0);

        let tiles = grid.get_tiles(area, true);
        assert_eq!(tiles[0], Tile::sentinel(area));
        assert_eq!(tiles.len(), 4);

        let tiles = grid.get_tiles(area, false);
        assert_eq!(tiles.len(), 3);
        assert!(tiles.iter().all(|t| t.index == 1));
    }

    #[test]
    fn test_interior_faces_are_culled() {
        let grid = floor();

        let left = grid.tile_at(0, 2).unwrap();
        let middle = grid.tile_at(1, 2).unwrap();
        let right = grid.tile_at(2, 2).unwrap();

        assert!(left.collide.left && !left.collide.right);
        assert!(!middle.collide.left && !middle.collide.right);
        assert!(middle.collide.up && middle.collide.down);
        assert!(right.collide.right && !right.collide.left);

        let block = grid.tile_at(1, 0).unwrap();
        assert_eq!(block.collide, Edges::ALL);
    }

    #[test]
    fn test_non_colliding_tiles_are_skipped() {
        let mut grid = floor();
        grid.set_collision(2, false);

        let tiles = grid.get_tiles(Rect::new(0.0, 0.0, 48.0, 48.0), false);
        assert_eq!(tiles.len(), 3);
        assert!(grid.tile_at(1, 0).is_some_and(|t| !t.collides()));
    }

    #[test]
    fn test_area_outside_map_is_clamped() {
        let grid = floor();
        let tiles = grid.get_tiles(Rect::new(-100.0, -100.0, 1000.0, 1000.0), true);
        assert_eq!(tiles.len(), 5);

        let none = grid.get_tiles(Rect::new(0.0, 0.0, 0.0, 0.0), true);
        assert_eq!(none.len(), 1);
    }
}
