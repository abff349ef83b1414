use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent};

use isomap_shared::{InteractionController, Navigator, NavigatorPlan, PointerInput, Response};

use crate::app::Settings;
use crate::canvas::context_2d;
use crate::render_loop::FrameScheduler;

const BACKGROUND: &str = "green";
const ACCENT: &str = "red";

fn paint(ctx: &CanvasRenderingContext2d, plan: &NavigatorPlan) {
    let bg = plan.background;
    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(bg.x, bg.y, bg.w, bg.h);

    let vp = plan.indicator;
    ctx.set_stroke_style_str(ACCENT);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(vp.x, vp.y, vp.w, vp.h);

    let m = plan.marker;
    ctx.set_fill_style_str(ACCENT);
    ctx.fill_rect(m.x, m.y, m.w, m.h);
}

/// Overview of the whole map; click or drag to move the main view.
#[component]
pub fn Minimap() -> impl IntoView {
    let controller: RwSignal<InteractionController> = expect_context();
    let Settings(settings) = expect_context();

    let (config, map) = settings.with_value(|c| (c.navigator.clone(), c.map));
    let navigator = Rc::new(RefCell::new(Navigator::new(&config, &map)));

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let cached_ctx: Rc<RefCell<Option<CanvasRenderingContext2d>>> = Rc::new(RefCell::new(None));

    let nav_paint = navigator.clone();
    let (panel_w, panel_h) = (config.width, config.height);
    let scheduler = FrameScheduler::new(move || {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let canvas: &HtmlCanvasElement = &canvas;
        let (w, h) = (panel_w as u32, panel_h as u32);
        if canvas.width() != w || canvas.height() != h {
            canvas.set_width(w);
            canvas.set_height(h);
            *cached_ctx.borrow_mut() = None;
        }

        let Some(ctx) = context_2d(canvas, &cached_ctx) else {
            return;
        };

        let plan = controller.with_untracked(|c| {
            nav_paint.borrow().plan(c.camera().camera(), c.viewport())
        });
        paint(&ctx, &plan);
    });

    Effect::new(move || {
        controller.track();
        scheduler.request();
    });

    let route = move |input: PointerInput| {
        let mut nav = navigator.borrow_mut();
        controller.maybe_update(|c| c.navigate(&mut nav, input) == Response::Redraw);
    };
    let route = Rc::new(route);

    let point = |e: &MouseEvent| (e.offset_x() as f64, e.offset_y() as f64);

    let on_pointer_down = {
        let route = route.clone();
        move |e: PointerEvent| {
            let (x, y) = point(&e);
            route(PointerInput::Down { x, y });
        }
    };
    let on_pointer_move = {
        let route = route.clone();
        move |e: PointerEvent| {
            let (x, y) = point(&e);
            route(PointerInput::Move { x, y });
        }
    };
    let on_pointer_up = {
        let route = route.clone();
        move |_: PointerEvent| route(PointerInput::Up)
    };
    let on_pointer_leave = {
        let route = route.clone();
        move |_: PointerEvent| route(PointerInput::Leave)
    };
    let on_click = move |e: MouseEvent| {
        let (x, y) = point(&e);
        route(PointerInput::Click { x, y });
    };

    view! {
        <div style="position: absolute; left: 16px; bottom: 16px; z-index: 5; border: 2px solid red; line-height: 0;">
            <canvas
                node_ref=canvas_ref
                on:pointerdown=on_pointer_down
                on:pointermove=on_pointer_move
                on:pointerup=on_pointer_up
                on:pointerleave=on_pointer_leave
                on:click=on_click
                style:width=format!("{panel_w}px")
                style:height=format!("{panel_h}px")
                style="display: block; cursor: pointer; touch-action: none;"
            />
        </div>
    }
}
