use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};

use isomap_shared::render::{FrameStatus, SpriteAssets, SpriteSheet, draw_frame, plan_frame};
use isomap_shared::{
    FrameInput, InteractionController, PointerInput, Rect, Response, SelectionFlow, SpriteId,
    Surface, TileCoord,
};

use crate::app::{AnimationFrame, LedgerHandle, Settings, window_size};
use crate::assets::{self, SpriteImages};
use crate::render_loop::FrameScheduler;
use crate::selection_panel;

/// Canvas 2D backend for the frame planner.
struct CanvasSurface<'a> {
    ctx: &'a CanvasRenderingContext2d,
    images: &'a SpriteImages,
    outline: &'a str,
    background: &'a str,
}

impl Surface for CanvasSurface<'_> {
    fn clear(&mut self, width: f64, height: f64) {
        self.ctx.set_fill_style_str(self.background);
        self.ctx.fill_rect(0.0, 0.0, width, height);
    }

    fn stroke_polygon(&mut self, points: &[(f64, f64)]) {
        let Some((&(x0, y0), rest)) = points.split_first() else {
            return;
        };
        let ctx = self.ctx;
        ctx.begin_path();
        ctx.move_to(x0, y0);
        for &(x, y) in rest {
            ctx.line_to(x, y);
        }
        ctx.close_path();
        ctx.set_stroke_style_str(self.outline);
        ctx.stroke();
    }

    fn draw_sprite(&mut self, sprite: SpriteId, source: Option<Rect>, dest: Rect) {
        let Some(image) = self.images.get(sprite) else {
            return;
        };
        match source {
            Some(src) => {
                self.ctx
                    .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                        image, src.x, src.y, src.w, src.h, dest.x, dest.y, dest.w, dest.h,
                    )
                    .ok();
            }
            None => {
                self.ctx
                    .draw_image_with_html_image_element_and_dw_and_dh(
                        image, dest.x, dest.y, dest.w, dest.h,
                    )
                    .ok();
            }
        }
    }
}

/// Cached 2D context for `canvas`; the cache must be cleared whenever the canvas is resized.
pub(crate) fn context_2d(
    canvas: &HtmlCanvasElement,
    cache: &RefCell<Option<CanvasRenderingContext2d>>,
) -> Option<CanvasRenderingContext2d> {
    let mut slot = cache.borrow_mut();
    if slot.is_none() {
        *slot = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
    }
    slot.clone()
}

/// Pointer position relative to the canvas' top-left corner.
fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, e: &MouseEvent) -> (f64, f64) {
    canvas_ref
        .get_untracked()
        .map(|el| {
            let rect = el.get_bounding_client_rect();
            (
                e.client_x() as f64 - rect.left(),
                e.client_y() as f64 - rect.top(),
            )
        })
        .unwrap_or((e.offset_x() as f64, e.offset_y() as f64))
}

/// Feed one event to the controller; subscribers are notified only when the view moved.
pub(crate) fn dispatch(controller: RwSignal<InteractionController>, input: PointerInput) -> Response {
    let mut response = Response::None;
    controller.maybe_update(|c| {
        response = c.handle(input);
        response == Response::Redraw
    });
    response
}

fn set_cursor(e: &PointerEvent, cursor: &str) {
    if let Some(target) = e.target()
        && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
    {
        el.style().set_property("cursor", cursor).ok();
    }
}

/// Main isometric view.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let controller: RwSignal<InteractionController> = expect_context();
    let selection: RwSignal<SelectionFlow> = expect_context();
    let assets: RwSignal<SpriteAssets> = expect_context();
    let AnimationFrame(frame) = expect_context();
    let Settings(settings) = expect_context();
    let LedgerHandle(ledger) = expect_context();

    let render = settings.with_value(|c| c.render.clone());
    let special_tiles: HashSet<TileCoord> = render.special_tiles.iter().copied().collect();
    let sheet = SpriteSheet {
        total_frames: render.animation_frames,
    };

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let cached_ctx: Rc<RefCell<Option<CanvasRenderingContext2d>>> = Rc::new(RefCell::new(None));
    let images: Rc<RefCell<SpriteImages>> = Rc::new(RefCell::new(SpriteImages::default()));
    assets::load_sprites(&render, images.clone(), assets);

    let scheduler = FrameScheduler::new(move || {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let canvas: &HtmlCanvasElement = &canvas;

        let viewport = controller.with_untracked(|c| c.viewport());
        let w = viewport.width.round().max(0.0) as u32;
        let h = viewport.height.round().max(0.0) as u32;
        if canvas.width() != w || canvas.height() != h {
            canvas.set_width(w);
            canvas.set_height(h);
            // Resizing resets 2D context state.
            *cached_ctx.borrow_mut() = None;
        }
        let Some(ctx) = context_2d(canvas, &cached_ctx) else {
            return;
        };

        let plan = controller.with_untracked(|c| {
            plan_frame(FrameInput {
                camera: c.camera().camera(),
                map: c.camera().map(),
                viewport,
                assets: assets.get_untracked(),
                special_tiles: &special_tiles,
                sheet,
                frame: frame.get_untracked(),
            })
        });
        if plan.status == FrameStatus::AwaitingAssets {
            return;
        }

        let images = images.borrow();
        let mut surface = CanvasSurface {
            ctx: &ctx,
            images: &images,
            outline: &render.outline_color,
            background: &render.background_color,
        };
        draw_frame(&mut surface, &plan);
    });

    // Camera, viewport, asset readiness and animation frame all feed the same paint.
    Effect::new(move || {
        controller.track();
        assets.track();
        frame.track();
        scheduler.request();
    });

    let (width, height) = window_size();
    dispatch(controller, PointerInput::Resize { width, height });
    let resize = window_event_listener(ev::resize, move |_| {
        let (width, height) = window_size();
        dispatch(controller, PointerInput::Resize { width, height });
    });
    on_cleanup(move || resize.remove());

    // --- Input handlers ---

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let (x, y) = local_point(canvas_ref, &e);
        dispatch(
            controller,
            PointerInput::Wheel {
                x,
                y,
                delta_y: e.delta_y(),
            },
        );
    };

    let on_pointer_down = move |e: PointerEvent| {
        let (x, y) = local_point(canvas_ref, &e);
        dispatch(controller, PointerInput::Down { x, y });
        if let Some(target) = e.target()
            && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
        {
            el.set_pointer_capture(e.pointer_id()).ok();
        }
        set_cursor(&e, "grabbing");
    };

    let on_pointer_move = move |e: PointerEvent| {
        let (x, y) = local_point(canvas_ref, &e);
        dispatch(controller, PointerInput::Move { x, y });
    };

    let on_pointer_up = move |e: PointerEvent| {
        dispatch(controller, PointerInput::Up);
        set_cursor(&e, "grab");
    };

    let on_pointer_leave = move |e: PointerEvent| {
        dispatch(controller, PointerInput::Leave);
        set_cursor(&e, "grab");
    };

    let on_click = move |e: MouseEvent| {
        let (x, y) = local_point(canvas_ref, &e);
        if let Response::Pick(tile) = dispatch(controller, PointerInput::Click { x, y }) {
            selection_panel::pick_tile(selection, ledger.get_value(), tile);
        }
    };

    view! {
        <canvas
            node_ref=canvas_ref
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
            on:click=on_click
            on:contextmenu=|e: MouseEvent| e.prevent_default()
            style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
        />
    }
}
