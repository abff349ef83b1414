use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces redraw requests into at most one paint per animation frame.
///
/// Every source of change (input, resize, asset readiness, animation tick)
/// calls [`FrameScheduler::request`]; the paint closure runs once on the next
/// `requestAnimationFrame`.
pub struct FrameScheduler {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    pending: Cell<bool>,
    raf_id: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Inner {
    fn schedule(&self) {
        if self.pending.replace(true) {
            return;
        }
        let callback = self.callback.borrow();
        let (Some(window), Some(cb)) = (self.window.as_ref(), callback.as_ref()) else {
            self.pending.set(false);
            return;
        };
        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => self.raf_id.set(Some(id)),
            Err(_) => self.pending.set(false),
        }
    }
}

impl FrameScheduler {
    pub fn new(paint: impl Fn() + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            pending: Cell::new(false),
            raf_id: Cell::new(None),
            callback: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let cb = Closure::<dyn FnMut()>::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.pending.set(false);
            inner.raf_id.set(None);
            paint();
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self { inner }
    }

    pub fn request(&self) {
        self.inner.schedule();
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        if let Some(id) = self.inner.raf_id.take()
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(id);
        }
        self.inner.pending.set(false);
        self.inner.callback.borrow_mut().take();
    }
}
