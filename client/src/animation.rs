use std::cell::RefCell;

use gloo_timers::callback::Interval;
use leptos::prelude::*;

use isomap_shared::render::AnimationClock;

thread_local! {
    static FRAME_TICKER: RefCell<Option<Interval>> = const { RefCell::new(None) };
}

/// Drive `frame` from wall-clock time. Replaces any ticker already running.
pub fn start(clock: AnimationClock, frame: RwSignal<u32>) {
    stop();
    if clock.total_frames <= 1 || clock.interval_ms == 0 {
        tracing::debug!(frames = clock.total_frames, "single-frame sprite sheet; no ticker");
        return;
    }

    let ticker = Interval::new(clock.interval_ms, move || {
        let next = clock.frame_at(chrono::Utc::now().timestamp_millis());
        if next != frame.get_untracked() {
            frame.set(next);
        }
    });
    FRAME_TICKER.with(|slot| *slot.borrow_mut() = Some(ticker));
}

pub fn stop() {
    // Dropping the interval clears it.
    FRAME_TICKER.with(|slot| slot.borrow_mut().take());
}
