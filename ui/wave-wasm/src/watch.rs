//! Periodic `NewWave` polling.

use gloo_timers::callback::Interval;
use tracing::{debug, warn};

use crate::Ctx;

/// Poll for new waves every `event_poll_ms` for the lifetime of the page.
pub fn start(ctx: &Ctx) {
    let ctx = ctx.clone();
    let period = ctx.config.event_poll_ms;
    Interval::new(period, move || {
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match ctx.app.poll_new_waves().await {
                Ok(0) => {}
                Ok(added) => debug!(added, "NewWave events applied"),
                Err(e) => warn!("NewWave poll failed: {e:#}"),
            }
        });
    })
    .forget();
}
