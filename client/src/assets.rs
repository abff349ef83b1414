use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use thiserror::Error;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlImageElement;

use isomap_shared::config::RenderConfig;
use isomap_shared::render::SpriteAssets;
use isomap_shared::{AssetState, SpriteId};

#[derive(Debug, Clone, Error)]
pub enum AssetError {
    #[error("failed to create image element")]
    Create,
    #[error("failed to decode {src}: {reason}")]
    Decode { src: String, reason: String },
}

/// Decoded sprite images. Lives beside the canvas; only readiness goes into signals.
#[derive(Default)]
pub struct SpriteImages {
    base: Option<HtmlImageElement>,
    special: Option<HtmlImageElement>,
}

impl SpriteImages {
    pub fn get(&self, id: SpriteId) -> Option<&HtmlImageElement> {
        match id {
            SpriteId::Base => self.base.as_ref(),
            SpriteId::Special => self.special.as_ref(),
        }
    }

    fn set(&mut self, id: SpriteId, image: HtmlImageElement) {
        match id {
            SpriteId::Base => self.base = Some(image),
            SpriteId::Special => self.special = Some(image),
        }
    }
}

pub async fn load_image(src: &str) -> Result<HtmlImageElement, AssetError> {
    let image = HtmlImageElement::new().map_err(|_| AssetError::Create)?;
    image.set_src(src);
    JsFuture::from(image.decode())
        .await
        .map_err(|err| AssetError::Decode {
            src: src.to_string(),
            reason: format!("{err:?}"),
        })?;
    Ok(image)
}

fn ready_state(image: &HtmlImageElement) -> AssetState {
    AssetState::Ready {
        width: image.natural_width() as f64,
        height: image.natural_height() as f64,
    }
}

/// Start loading the base and special sprites. Readiness is published to `assets`.
pub fn load_sprites(
    config: &RenderConfig,
    images: Rc<RefCell<SpriteImages>>,
    assets: RwSignal<SpriteAssets>,
) {
    let sources = [
        (SpriteId::Base, config.base_sprite_src.clone()),
        (SpriteId::Special, config.special_sprite_src.clone()),
    ];
    for (id, src) in sources {
        let images = images.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let state = match load_image(&src).await {
                Ok(image) => {
                    let state = ready_state(&image);
                    images.borrow_mut().set(id, image);
                    tracing::info!(?id, %src, "sprite ready");
                    state
                }
                Err(err) => {
                    tracing::warn!(?id, error = %err, "sprite unavailable; drawing outlines instead");
                    AssetState::Failed
                }
            };
            assets.update(|a| a.set(id, state));
        });
    }
}
