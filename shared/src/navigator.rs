use crate::camera::{Camera, CameraState};
use crate::config::NavigatorConfig;
use crate::geometry::{MapBounds, Rect};
use crate::input::{DragTracker, PointerInput, Response};
use crate::visible::ViewportSize;

/// Fixed-size miniature of the whole map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigatorLayout {
    pub width: f64,
    pub height: f64,
    pub marker_size: f64,
    /// Navigator pixels per world unit (zoom 1).
    pub mini_scale: f64,
}

impl NavigatorLayout {
    pub fn new(config: &NavigatorConfig, map: &MapBounds) -> Self {
        Self {
            width: config.width,
            height: config.height,
            marker_size: config.marker_size,
            mini_scale: config.width / map.world_width(),
        }
    }

    /// World position at the main viewport's origin, in navigator pixels.
    pub fn marker_position(&self, camera: &Camera) -> (f64, f64) {
        (
            -(camera.offset_x / camera.zoom) * self.mini_scale,
            -(camera.offset_y / camera.zoom) * self.mini_scale,
        )
    }

    pub fn marker(&self, camera: &Camera) -> Rect {
        let (x, y) = self.marker_position(camera);
        let half = self.marker_size / 2.0;
        Rect::new(x - half, y - half, self.marker_size, self.marker_size)
    }

    /// Footprint of the main viewport on the navigator.
    pub fn viewport_indicator(&self, camera: &Camera, viewport: ViewportSize) -> Rect {
        let (x, y) = self.marker_position(camera);
        Rect::new(
            x,
            y,
            viewport.width / camera.zoom * self.mini_scale,
            viewport.height / camera.zoom * self.mini_scale,
        )
    }

    pub fn to_world(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.mini_scale, y / self.mini_scale)
    }

    /// Move the main camera so the navigator point sits at the viewport origin.
    pub fn jump(&self, x: f64, y: f64, camera: &mut CameraState) -> bool {
        let (wx, wy) = self.to_world(x, y);
        let zoom = camera.camera().zoom;
        camera.set_offset(-wx * zoom, -wy * zoom)
    }
}

/// Everything the navigator panel draws for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigatorPlan {
    pub background: Rect,
    pub indicator: Rect,
    pub marker: Rect,
}

/// Navigator panel state: layout plus its own drag tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigator {
    layout: NavigatorLayout,
    drag: DragTracker,
}

impl Navigator {
    pub fn new(config: &NavigatorConfig, map: &MapBounds) -> Self {
        Self {
            layout: NavigatorLayout::new(config, map),
            drag: DragTracker::default(),
        }
    }

    pub fn layout(&self) -> &NavigatorLayout {
        &self.layout
    }

    pub fn plan(&self, camera: &Camera, viewport: ViewportSize) -> NavigatorPlan {
        NavigatorPlan {
            background: Rect::new(0.0, 0.0, self.layout.width, self.layout.height),
            indicator: self.layout.viewport_indicator(camera, viewport),
            marker: self.layout.marker(camera),
        }
    }

    pub(crate) fn handle(&mut self, input: PointerInput, camera: &mut CameraState) -> Response {
        let moved = match input {
            PointerInput::Down { x, y } => {
                self.drag.press(x, y);
                self.layout.jump(x, y, camera)
            }
            PointerInput::Move { x, y } => {
                self.drag.drag_to(x, y).is_some() && self.layout.jump(x, y, camera)
            }
            PointerInput::Up | PointerInput::Leave => {
                self.drag.release();
                false
            }
            PointerInput::Click { x, y } => self.layout.jump(x, y, camera),
            PointerInput::Wheel { .. } | PointerInput::Resize { .. } => false,
        };
        if moved { Response::Redraw } else { Response::None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::input::InteractionController;

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-6,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    fn setup() -> (InteractionController, Navigator) {
        let config = AppConfig::default();
        let controller = InteractionController::new(&config);
        let navigator = Navigator::new(&config.navigator, &config.map);
        (controller, navigator)
    }

    #[test]
    fn scale_maps_world_width_onto_panel() {
        let (_, nav) = setup();
        // 360 px across a 10 000 column × 50 px map.
        assert_close(nav.layout().mini_scale, 360.0 / 500_000.0);
        assert_close(nav.layout().mini_scale * 250_000.0, 180.0);
    }

    #[test]
    fn marker_tracks_camera_offset() {
        let (c, nav) = setup();
        let (x, y) = nav.layout().marker_position(c.camera().camera());
        assert_close(x, 180.0);
        assert_close(y, 90.0);
        let marker = nav.layout().marker(c.camera().camera());
        assert_eq!(marker, Rect::new(x - 5.0, y - 5.0, 10.0, 10.0));
    }

    #[test]
    fn click_and_marker_are_reciprocal() {
        let (mut c, mut nav) = setup();
        let r = c.navigate(&mut nav, PointerInput::Click { x: 90.0, y: 60.0 });
        assert_eq!(r, Response::Redraw);
        let (x, y) = nav.layout().marker_position(c.camera().camera());
        assert_close(x, 90.0);
        assert_close(y, 60.0);
    }

    #[test]
    fn reciprocal_at_higher_zoom() {
        let (mut c, mut nav) = setup();
        c.handle(PointerInput::Wheel {
            x: 0.0,
            y: 0.0,
            delta_y: -300.0,
        });
        c.navigate(&mut nav, PointerInput::Click { x: 200.0, y: 100.0 });
        let (x, y) = nav.layout().marker_position(c.camera().camera());
        assert_close(x, 200.0);
        assert_close(y, 100.0);
    }

    #[test]
    fn navigator_jump_goes_through_clamp() {
        let (mut c, mut nav) = setup();
        c.navigate(&mut nav, PointerInput::Click { x: 0.0, y: 0.0 });
        let cam = c.camera().camera();
        let ((_, max_x), (_, max_y)) = c.camera().offset_limits();
        assert_close(cam.offset_x, max_x);
        assert_close(cam.offset_y, max_y);
    }

    #[test]
    fn drag_moves_only_while_pressed() {
        let (mut c, mut nav) = setup();
        assert_eq!(
            c.navigate(&mut nav, PointerInput::Move { x: 50.0, y: 50.0 }),
            Response::None
        );
        c.navigate(&mut nav, PointerInput::Down { x: 100.0, y: 50.0 });
        assert_eq!(
            c.navigate(&mut nav, PointerInput::Move { x: 120.0, y: 70.0 }),
            Response::Redraw
        );
        let (x, y) = nav.layout().marker_position(c.camera().camera());
        assert_close(x, 120.0);
        assert_close(y, 70.0);
        c.navigate(&mut nav, PointerInput::Up);
        assert_eq!(
            c.navigate(&mut nav, PointerInput::Move { x: 10.0, y: 10.0 }),
            Response::None
        );
    }

    #[test]
    fn navigator_drag_is_independent_of_main_drag() {
        let (mut c, mut nav) = setup();
        c.navigate(&mut nav, PointerInput::Down { x: 100.0, y: 50.0 });
        assert!(!c.drag().is_dragging());
    }

    #[test]
    fn indicator_scales_with_zoom() {
        let (c, nav) = setup();
        let cam = c.camera().camera();
        let r = nav.layout().viewport_indicator(cam, ViewportSize::new(1_000.0, 500.0));
        assert_close(r.w, 1_000.0 * nav.layout().mini_scale);
        assert_close(r.h, 500.0 * nav.layout().mini_scale);
    }
}
