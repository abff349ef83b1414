pub mod camera;
pub mod config;
pub mod geometry;
pub mod input;
pub mod ledger;
pub mod navigator;
pub mod render;
pub mod selection;
pub mod visible;

pub use camera::{Camera, CameraState, ZoomStep};
pub use config::AppConfig;
pub use geometry::{MapBounds, Rect, TileCoord};
pub use input::{InteractionController, PointerInput, Response};
pub use ledger::{AccountId, ArgumentOrder, Ledger, LedgerError};
pub use navigator::{Navigator, NavigatorPlan};
pub use render::{AssetState, DrawCommand, FrameInput, FramePlan, SpriteId, Surface};
pub use selection::{Notice, Occupancy, SelectionError, SelectionFlow, TileSelection};
pub use visible::{ViewportSize, VisibleTile};
