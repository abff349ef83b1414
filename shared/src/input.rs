use crate::camera::{CameraState, ZoomStep};
use crate::config::{AppConfig, InputConfig};
use crate::geometry::{TileCoord, screen_to_tile};
use crate::navigator::Navigator;
use crate::visible::ViewportSize;

/// Pointer and viewport events in surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up,
    Leave,
    Wheel { x: f64, y: f64, delta_y: f64 },
    Click { x: f64, y: f64 },
    Resize { width: f64, height: f64 },
}

/// What the host should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    None,
    Redraw,
    Pick(TileCoord),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        last: (f64, f64),
    },
}

/// Idle/Dragging state machine shared by the main view and the navigator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragTracker {
    state: DragState,
    press_origin: Option<(f64, f64)>,
    /// Furthest the pointer has strayed from the press origin, per axis.
    max_travel: f64,
}

impl DragTracker {
    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn press(&mut self, x: f64, y: f64) {
        self.state = DragState::Dragging { last: (x, y) };
        self.press_origin = Some((x, y));
        self.max_travel = 0.0;
    }

    /// Delta since the last recorded position, or `None` when idle.
    pub fn drag_to(&mut self, x: f64, y: f64) -> Option<(f64, f64)> {
        let DragState::Dragging { last } = self.state else {
            return None;
        };
        self.state = DragState::Dragging { last: (x, y) };
        if let Some(travel) = self.travel_from_origin(x, y) {
            self.max_travel = self.max_travel.max(travel);
        }
        Some((x - last.0, y - last.1))
    }

    pub fn release(&mut self) {
        self.state = DragState::Idle;
    }

    fn travel_from_origin(&self, x: f64, y: f64) -> Option<f64> {
        self.press_origin
            .map(|(ox, oy)| (x - ox).abs().max((y - oy).abs()))
    }

    /// A click counts only if the pointer never strayed `threshold` or more
    /// from where the press began, including on the way back.
    pub fn is_click(&self, x: f64, y: f64, threshold: f64) -> bool {
        if self.is_dragging() || self.max_travel >= threshold {
            return false;
        }
        self.travel_from_origin(x, y)
            .is_none_or(|travel| travel < threshold)
    }
}

/// Turns raw pointer input into camera moves and tile picks.
///
/// Sole owner of the camera; other views get read access or go through
/// [`InteractionController::navigate`].
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionController {
    camera: CameraState,
    drag: DragTracker,
    viewport: ViewportSize,
    zoom_step: ZoomStep,
    input: InputConfig,
}

impl InteractionController {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            camera: CameraState::new(config.map, &config.camera),
            drag: DragTracker::default(),
            viewport: ViewportSize::default(),
            zoom_step: config.camera.zoom_step,
            input: config.input.clone(),
        }
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn drag(&self) -> &DragTracker {
        &self.drag
    }

    pub fn handle(&mut self, input: PointerInput) -> Response {
        match input {
            PointerInput::Down { x, y } => {
                self.drag.press(x, y);
                Response::None
            }
            PointerInput::Move { x, y } => match self.drag.drag_to(x, y) {
                Some((dx, dy)) if self.camera.pan(dx, dy) => Response::Redraw,
                _ => Response::None,
            },
            PointerInput::Up | PointerInput::Leave => {
                self.drag.release();
                Response::None
            }
            PointerInput::Wheel { x, y, delta_y } => {
                let zoom = self.camera.camera().zoom;
                let candidate = self.zoom_step.apply(zoom, delta_y);
                if self.camera.zoom_at(x, y, candidate) {
                    Response::Redraw
                } else {
                    Response::None
                }
            }
            PointerInput::Click { x, y } => {
                if !self.drag.is_click(x, y, self.input.drag_threshold_px) {
                    return Response::None;
                }
                self.pick(x, y).map_or(Response::None, Response::Pick)
            }
            PointerInput::Resize { width, height } => {
                let size = ViewportSize::new(width, height);
                if size == self.viewport {
                    return Response::None;
                }
                self.viewport = size;
                Response::Redraw
            }
        }
    }

    /// Tile under a screen point, if it lies on the map.
    pub fn pick(&self, x: f64, y: f64) -> Option<TileCoord> {
        let map = self.camera.map();
        let (row, col) = screen_to_tile(x, y, self.camera.camera(), map.base_tile_size);
        map.tile_at(row, col)
    }

    /// Route navigator input; the navigator moves this controller's camera.
    pub fn navigate(&mut self, navigator: &mut Navigator, input: PointerInput) -> Response {
        navigator.handle(input, &mut self.camera)
    }
}
