use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::geometry::{MapBounds, tile_to_screen};

/// Overscan in tile rows above and below the viewport.
const ROW_OVERSCAN: f64 = 1.0;
/// Overscan in columns left and right. A diamond spans two columns, so this is one tile.
const COL_OVERSCAN: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Per-frame record for one tile that may intersect the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleTile {
    pub row: u32,
    pub col: u32,
    pub screen_x: f64,
    pub screen_y: f64,
}

/// Inclusive row/col index ranges already intersected with the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRange {
    pub rows: RangeInclusive<u32>,
    pub cols: RangeInclusive<u32>,
}

impl TileRange {
    pub fn len(&self) -> usize {
        span(&self.rows) * span(&self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn span(r: &RangeInclusive<u32>) -> usize {
    if r.is_empty() {
        0
    } else {
        (*r.end() - *r.start()) as usize + 1
    }
}

/// Index range covering the viewport plus overscan, or `None` if nothing of the map is in view.
pub fn visible_range(camera: &Camera, map: &MapBounds, viewport: ViewportSize) -> Option<TileRange> {
    if viewport.is_empty() {
        return None;
    }
    let ts = camera.tile_size(map);
    if !(ts.is_finite() && ts > 0.0) {
        return None;
    }

    let row_start = ((-camera.offset_y - ts * ROW_OVERSCAN) / ts).floor();
    let row_end = ((-camera.offset_y + viewport.height + ts * ROW_OVERSCAN) / ts).floor();
    let col_start = ((-camera.offset_x - ts * COL_OVERSCAN) / ts).floor();
    let col_end = ((-camera.offset_x + viewport.width + ts * COL_OVERSCAN) / ts).floor();

    let rows = intersect(row_start, row_end, map.row_count)?;
    let cols = intersect(col_start, col_end, map.col_count)?;
    Some(TileRange { rows, cols })
}

fn intersect(start: f64, end: f64, max: u32) -> Option<RangeInclusive<u32>> {
    let start = start.max(0.0);
    let end = end.min(max as f64);
    if start > end {
        return None;
    }
    Some(start as u32..=end as u32)
}

/// Enumerate every tile in [`visible_range`] with its screen anchor.
///
/// Work is proportional to the tiles in view, never to the map size.
pub fn visible_tiles(camera: &Camera, map: &MapBounds, viewport: ViewportSize) -> Vec<VisibleTile> {
    let Some(range) = visible_range(camera, map, viewport) else {
        return Vec::new();
    };

    let mut tiles = Vec::with_capacity(range.len());
    for row in range.rows.clone() {
        for col in range.cols.clone() {
            let (screen_x, screen_y) =
                tile_to_screen(row as i64, col as i64, map.base_tile_size, camera);
            tiles.push(VisibleTile {
                row,
                col,
                screen_x,
                screen_y,
            });
        }
    }
    tiles
}
