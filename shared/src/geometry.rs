use serde::{Deserialize, Serialize};

use crate::camera::Camera;

/// Inverse transforms snap values this close to a tile edge onto the edge,
/// so projecting a tile anchor and picking it back is exact.
const SNAP_EPSILON: f64 = 1e-9;

/// Logical grid cell. Rows and columns are named so call sites can't swap them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub row: u32,
    pub col: u32,
}

impl TileCoord {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Authored extent of the tile grid. Both ranges are inclusive: `[0, row_count] × [0, col_count]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub row_count: u32,
    pub col_count: u32,
    /// World-space size of one tile at zoom 1.
    pub base_tile_size: f64,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self::square(5_000, 50.0)
    }
}

impl MapBounds {
    /// A grid with twice as many columns as rows, which keeps the diamond layout square in world space.
    pub fn square(row_count: u32, base_tile_size: f64) -> Self {
        Self {
            row_count,
            col_count: row_count.saturating_mul(2),
            base_tile_size,
        }
    }

    pub fn contains(&self, row: i64, col: i64) -> bool {
        (0..=self.row_count as i64).contains(&row) && (0..=self.col_count as i64).contains(&col)
    }

    /// Bounds-checked conversion of a raw pick result.
    pub fn tile_at(&self, row: i64, col: i64) -> Option<TileCoord> {
        self.contains(row, col)
            .then(|| TileCoord::new(row as u32, col as u32))
    }

    /// World width of the map at zoom 1.
    pub fn world_width(&self) -> f64 {
        self.col_count as f64 * self.base_tile_size
    }

    /// World height of the map at zoom 1.
    pub fn world_height(&self) -> f64 {
        self.row_count as f64 * self.base_tile_size
    }
}

pub fn is_odd(col: i64) -> bool {
    col.rem_euclid(2) == 1
}

/// Half-tile vertical stagger applied to odd columns.
fn stagger(col: i64, tile_size: f64) -> f64 {
    if is_odd(col) { tile_size / 2.0 } else { 0.0 }
}

/// Anchor (left vertex of the diamond) of a tile in world space.
pub fn tile_to_world(row: i64, col: i64, base_tile_size: f64) -> (f64, f64) {
    (
        col as f64 * base_tile_size,
        row as f64 * base_tile_size + stagger(col, base_tile_size),
    )
}

pub fn world_to_screen(wx: f64, wy: f64, camera: &Camera) -> (f64, f64) {
    (
        wx * camera.zoom + camera.offset_x,
        wy * camera.zoom + camera.offset_y,
    )
}

pub fn screen_to_world(sx: f64, sy: f64, camera: &Camera) -> (f64, f64) {
    (
        (sx - camera.offset_x) / camera.zoom,
        (sy - camera.offset_y) / camera.zoom,
    )
}

/// Screen anchor of a tile. Same as `world_to_screen(tile_to_world(..))`,
/// written in terms of the zoomed tile size.
pub fn tile_to_screen(row: i64, col: i64, base_tile_size: f64, camera: &Camera) -> (f64, f64) {
    let ts = base_tile_size * camera.zoom;
    (
        col as f64 * ts + camera.offset_x,
        row as f64 * ts + stagger(col, ts) + camera.offset_y,
    )
}

/// Raw `(row, col)` under a screen point. May lie outside the map; see [`MapBounds::tile_at`].
pub fn screen_to_tile(sx: f64, sy: f64, camera: &Camera, base_tile_size: f64) -> (i64, i64) {
    let ts = base_tile_size * camera.zoom;
    let col = snap_floor((sx - camera.offset_x) / ts);
    let row = snap_floor((sy - camera.offset_y - stagger(col, ts)) / ts);
    (row, col)
}

fn snap_floor(v: f64) -> i64 {
    (v + SNAP_EPSILON).floor() as i64
}

/// Four vertices of a tile's diamond outline, clockwise from the anchor.
pub fn diamond(x: f64, y: f64, tile_size: f64) -> [(f64, f64); 4] {
    [
        (x, y),
        (x + tile_size, y - tile_size / 2.0),
        (x + tile_size * 2.0, y),
        (x + tile_size, y + tile_size / 2.0),
    ]
}

/// Axis-aligned rectangle in screen or image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// Where a tile sprite lands: two tiles wide and tall, rising 1.5 tiles above the anchor.
pub fn sprite_rect(x: f64, y: f64, tile_size: f64) -> Rect {
    Rect::new(x, y - tile_size * 1.5, tile_size * 2.0, tile_size * 2.0)
}
