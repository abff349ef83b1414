mod animation;
mod app;
mod assets;
mod canvas;
mod ledger;
mod logging;
mod minimap;
mod render_loop;
mod selection_panel;

use leptos::mount::mount_to;
use leptos::prelude::*;
use std::any::Any;
use std::cell::RefCell;
use wasm_bindgen::JsCast;

use isomap_shared::AppConfig;

use crate::app::App;

thread_local! {
    static APP_MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

fn main() {
    console_error_panic_hook::set_once();
    let (config, load_error) = match app::load_config() {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    logging::init(&config.log_level);
    if let Some(err) = load_error {
        tracing::warn!(error = %err, "falling back to default config");
    }
    tracing::info!(
        rows = config.map.row_count,
        cols = config.map.col_count,
        rpc = %config.ledger.rpc_url,
        "starting isometric map"
    );

    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    let mount_target = document
        .get_element_by_id("app")
        .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| document.body());
    let Some(target) = mount_target else {
        tracing::error!("no mount target");
        return;
    };

    APP_MOUNT_HANDLE.with(move |slot| {
        // Drop any earlier mount so its effects stop touching shared state.
        let _old = slot.borrow_mut().take();
        let handle = mount_to(target, move || view! { <App config=config /> });
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}
