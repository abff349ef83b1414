use gloo_storage::Storage;
use leptos::prelude::*;
use thiserror::Error;

use isomap_shared::render::{AnimationClock, SpriteAssets};
use isomap_shared::config::ConfigError;
use isomap_shared::{AppConfig, InteractionController, SelectionFlow};

use crate::animation;
use crate::canvas::MapCanvas;
use crate::ledger::JsonRpcLedger;
use crate::minimap::Minimap;
use crate::selection_panel::SelectionPanel;

pub(crate) const CONFIG_STORAGE_KEY: &str = "isomap_config";

/// Newtype wrappers so each context value has a distinct type.
#[derive(Clone, Copy)]
pub(crate) struct Settings(pub StoredValue<AppConfig>);
#[derive(Clone, Copy)]
pub(crate) struct AnimationFrame(pub RwSignal<u32>);
#[derive(Clone, Copy)]
pub(crate) struct LedgerHandle(pub StoredValue<JsonRpcLedger>);

pub(crate) fn window_size() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

#[derive(Debug, Error)]
pub(crate) enum ConfigLoadError {
    #[error("unreadable stored config: {0}")]
    Storage(#[from] gloo_storage::errors::StorageError),
    #[error("invalid stored config: {0}")]
    Invalid(#[from] ConfigError),
}

/// Config from LocalStorage, or the defaults when nothing is stored.
pub(crate) fn load_config() -> Result<AppConfig, ConfigLoadError> {
    match gloo_storage::LocalStorage::get::<AppConfig>(CONFIG_STORAGE_KEY) {
        Ok(config) => checked(Some(config)),
        Err(gloo_storage::errors::StorageError::KeyNotFound(_)) => checked(None),
        Err(err) => Err(err.into()),
    }
}

fn checked(stored: Option<AppConfig>) -> Result<AppConfig, ConfigLoadError> {
    let config = stored.unwrap_or_default();
    config.validate()?;
    Ok(config)
}

/// Root component. Owns the camera, selection and asset state and shares them via context.
#[component]
pub fn App(config: AppConfig) -> impl IntoView {
    let controller: RwSignal<InteractionController> =
        RwSignal::new(InteractionController::new(&config));
    let selection: RwSignal<SelectionFlow> = RwSignal::new(SelectionFlow::default());
    let assets: RwSignal<SpriteAssets> = RwSignal::new(SpriteAssets::default());
    let frame: RwSignal<u32> = RwSignal::new(0);
    let ledger = StoredValue::new(JsonRpcLedger::new(config.ledger.clone()));

    let clock = AnimationClock {
        interval_ms: config.render.animation_interval_ms,
        total_frames: config.render.animation_frames,
    };

    provide_context(controller);
    provide_context(selection);
    provide_context(assets);
    provide_context(AnimationFrame(frame));
    provide_context(LedgerHandle(ledger));
    provide_context(Settings(StoredValue::new(config)));

    Effect::new(move || {
        animation::start(clock, frame);
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative; overflow: hidden;">
            <MapCanvas />
            <Minimap />
            <SelectionPanel />
        </div>
    }
}
