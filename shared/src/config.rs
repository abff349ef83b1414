use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::ZoomStep;
use crate::geometry::{MapBounds, TileCoord};
use crate::ledger::ArgumentOrder;

pub const DEFAULT_BASE_SPRITE_SRC: &str = "/sprites/tile.png";
pub const DEFAULT_SPECIAL_SPRITE_SRC: &str = "/sprites/town.png";
pub const DEFAULT_RPC_URL: &str = "https://api.s0.b.hmny.io";
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x55d78cEe175B17e70d29bdaeD3176c1E24c2576d";
/// `getTileOccupied(uint256,uint256)`
pub const QUERY_SELECTOR: &str = "0xa8f3f7ca";
/// `occupyTile(uint256,uint256)`
pub const OCCUPY_SELECTOR: &str = "0x017d9a34";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("map must have at least one row and column (got {rows}x{cols})")]
    EmptyMap { rows: u32, cols: u32 },
    #[error("base tile size must be positive and finite (got {0})")]
    TileSize(f64),
    #[error("zoom range [{min}, {max}] is invalid")]
    ZoomRange { min: f64, max: f64 },
    #[error("zoom step must be positive and finite")]
    ZoomStep,
    #[error("margin must be non-negative (got {0})")]
    Margin(f64),
    #[error("animation needs at least one frame and a non-zero interval")]
    Animation,
    #[error("navigator size must be positive (got {w}x{h})")]
    NavigatorSize { w: f64, h: f64 },
    #[error("special tile ({}, {}) lies outside the map", .0.row, .0.col)]
    SpecialTileOutOfBounds(TileCoord),
    #[error("invalid function selector {0:?}")]
    Selector(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub initial_zoom: f64,
    pub zoom_step: ZoomStep,
    /// How far, in tiles, the view may stop short of each map edge.
    pub margin_tiles: f64,
    /// Starting offset; `None` centres the map on the viewport origin.
    pub initial_offset: Option<(f64, f64)>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            zoom_min: 1.0,
            zoom_max: 5.0,
            initial_zoom: 1.0,
            zoom_step: ZoomStep::default(),
            margin_tiles: 100.0,
            initial_offset: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// A click further than this from the press point is treated as the end of a drag.
    pub drag_threshold_px: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub base_sprite_src: String,
    pub special_sprite_src: String,
    pub special_tiles: Vec<TileCoord>,
    pub animation_frames: u32,
    pub animation_interval_ms: u32,
    pub outline_color: String,
    pub background_color: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_sprite_src: DEFAULT_BASE_SPRITE_SRC.to_string(),
            special_sprite_src: DEFAULT_SPECIAL_SPRITE_SRC.to_string(),
            special_tiles: vec![TileCoord::new(20, 20)],
            animation_frames: 1,
            animation_interval_ms: 500,
            outline_color: "#000000".to_string(),
            background_color: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub width: f64,
    pub height: f64,
    pub marker_size: f64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            width: 360.0,
            height: 180.0,
            marker_size: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub contract_address: String,
    /// Order the contract expects its two coordinate arguments in.
    pub argument_order: ArgumentOrder,
    pub query_selector: String,
    pub occupy_selector: String,
    pub receipt_poll_attempts: u32,
    pub receipt_poll_interval_ms: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            argument_order: ArgumentOrder::ColRow,
            query_selector: QUERY_SELECTOR.to_string(),
            occupy_selector: OCCUPY_SELECTOR.to_string(),
            receipt_poll_attempts: 30,
            receipt_poll_interval_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub map: MapBounds,
    pub camera: CameraConfig,
    pub input: InputConfig,
    pub render: RenderConfig,
    pub navigator: NavigatorConfig,
    pub ledger: LedgerConfig,
    /// `tracing` filter directive, e.g. `"info"` or `"isomap_shared=debug"`.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            map: MapBounds::default(),
            camera: CameraConfig::default(),
            input: InputConfig::default(),
            render: RenderConfig::default(),
            navigator: NavigatorConfig::default(),
            ledger: LedgerConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let map = &self.map;
        if map.row_count == 0 || map.col_count == 0 {
            return Err(ConfigError::EmptyMap {
                rows: map.row_count,
                cols: map.col_count,
            });
        }
        if !(map.base_tile_size.is_finite() && map.base_tile_size > 0.0) {
            return Err(ConfigError::TileSize(map.base_tile_size));
        }

        let cam = &self.camera;
        if !(cam.zoom_min.is_finite() && cam.zoom_max.is_finite())
            || cam.zoom_min <= 0.0
            || cam.zoom_min > cam.zoom_max
        {
            return Err(ConfigError::ZoomRange {
                min: cam.zoom_min,
                max: cam.zoom_max,
            });
        }
        let step = match cam.zoom_step {
            ZoomStep::Additive(s) | ZoomStep::Multiplicative(s) => s,
        };
        if !(step.is_finite() && step > 0.0) {
            return Err(ConfigError::ZoomStep);
        }
        if !(cam.margin_tiles.is_finite() && cam.margin_tiles >= 0.0) {
            return Err(ConfigError::Margin(cam.margin_tiles));
        }

        if self.render.animation_frames == 0 || self.render.animation_interval_ms == 0 {
            return Err(ConfigError::Animation);
        }
        if let Some(tile) = self
            .render
            .special_tiles
            .iter()
            .find(|t| !map.contains(t.row as i64, t.col as i64))
        {
            return Err(ConfigError::SpecialTileOutOfBounds(*tile));
        }

        let nav = &self.navigator;
        if nav.width <= 0.0 || nav.height <= 0.0 {
            return Err(ConfigError::NavigatorSize {
                w: nav.width,
                h: nav.height,
            });
        }

        for selector in [&self.ledger.query_selector, &self.ledger.occupy_selector] {
            if !is_selector(selector) {
                return Err(ConfigError::Selector(selector.clone()));
            }
        }
        Ok(())
    }
}

/// `0x` followed by exactly eight hex digits.
fn is_selector(s: &str) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
