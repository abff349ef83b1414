use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;
use crate::geometry::MapBounds;

/// World-to-screen transform: `screen = world * zoom + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub offset_x: f64,
    pub offset_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Zoomed size of one tile in screen pixels.
    pub fn tile_size(&self, map: &MapBounds) -> f64 {
        map.base_tile_size * self.zoom
    }
}

/// How a wheel delta turns into a zoom candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "step", rename_all = "snake_case")]
pub enum ZoomStep {
    /// `zoom - delta_y * step`
    Additive(f64),
    /// `zoom * exp(-delta_y * step)`
    Multiplicative(f64),
}

impl Default for ZoomStep {
    fn default() -> Self {
        ZoomStep::Additive(0.003)
    }
}

impl ZoomStep {
    pub fn apply(self, zoom: f64, delta_y: f64) -> f64 {
        match self {
            ZoomStep::Additive(step) => zoom - delta_y * step,
            ZoomStep::Multiplicative(step) => zoom * (-delta_y * step).exp(),
        }
    }
}

/// Camera plus the policy that keeps it over the map.
///
/// Every mutator clamps before returning and reports whether anything moved,
/// so hosts can skip redraws for no-op input.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    camera: Camera,
    map: MapBounds,
    zoom_min: f64,
    zoom_max: f64,
    margin_tiles: f64,
}

impl CameraState {
    pub fn new(map: MapBounds, config: &CameraConfig) -> Self {
        let zoom = config.initial_zoom.clamp(config.zoom_min, config.zoom_max);
        let (offset_x, offset_y) = config.initial_offset.unwrap_or((
            -(map.world_width() / 2.0) * zoom,
            -(map.world_height() / 2.0) * zoom,
        ));
        let mut state = Self {
            camera: Camera {
                offset_x,
                offset_y,
                zoom,
            },
            map,
            zoom_min: config.zoom_min,
            zoom_max: config.zoom_max,
            margin_tiles: config.margin_tiles,
        };
        let (x, y) = state.clamp(offset_x, offset_y);
        state.camera.offset_x = x;
        state.camera.offset_y = y;
        state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn map(&self) -> &MapBounds {
        &self.map
    }

    /// Allowed offset range per axis at the current zoom, as `((min_x, max_x), (min_y, max_y))`.
    pub fn offset_limits(&self) -> ((f64, f64), (f64, f64)) {
        let ts = self.camera.tile_size(&self.map);
        let margin = self.margin_tiles * ts;
        let x = (
            -(self.map.col_count as f64 * ts - margin * 2.0),
            -margin,
        );
        let y = (-(self.map.row_count as f64 * ts - margin), -margin);
        (x, y)
    }

    pub fn clamp(&self, offset_x: f64, offset_y: f64) -> (f64, f64) {
        let (x, y) = self.offset_limits();
        (clamp_axis(offset_x, x), clamp_axis(offset_y, y))
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.set_offset(self.camera.offset_x + dx, self.camera.offset_y + dy)
    }

    /// Absolute positioning through the clamp policy.
    pub fn set_offset(&mut self, offset_x: f64, offset_y: f64) -> bool {
        let (x, y) = self.clamp(offset_x, offset_y);
        if x == self.camera.offset_x && y == self.camera.offset_y {
            return false;
        }
        self.camera.offset_x = x;
        self.camera.offset_y = y;
        true
    }

    /// Zoom so the world point under `(focal_x, focal_y)` stays put.
    pub fn zoom_at(&mut self, focal_x: f64, focal_y: f64, new_zoom: f64) -> bool {
        if !new_zoom.is_finite() {
            return false;
        }
        let zoom = new_zoom.clamp(self.zoom_min, self.zoom_max);
        let old = self.camera;
        if zoom == old.zoom {
            return false;
        }

        let offset_x = (old.offset_x - focal_x) / old.zoom * zoom + focal_x;
        let offset_y = (old.offset_y - focal_y) / old.zoom * zoom + focal_y;
        self.camera.zoom = zoom;
        let (x, y) = self.clamp(offset_x, offset_y);
        self.camera.offset_x = x;
        self.camera.offset_y = y;
        tracing::debug!(from = old.zoom, to = zoom, "zoom changed");
        true
    }
}

/// Clamp into `[min, max]`; an inverted range (map smaller than twice the margin) pins to its midpoint.
fn clamp_axis(value: f64, (min, max): (f64, f64)) -> f64 {
    if min > max {
        return (min + max) / 2.0;
    }
    value.clamp(min, max)
}
