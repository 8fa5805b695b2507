//! Async UI handlers.
//!
//! Failures are logged and otherwise swallowed; the page keeps whatever state
//! it had before the failed step.

use tracing::{error, info, warn};

use crate::{Ctx, dom, ethereum, watch};

/// Page load: pick up an already-authorized account, load the board and start
/// following `NewWave`.
pub async fn on_load(ctx: &Ctx) {
    if !ethereum::is_installed() {
        info!("Make sure you have MetaMask!");
        return;
    }
    info!("We have the ethereum object");

    if let Err(e) = ctx.app.bootstrap().await {
        error!("bootstrap failed: {e:#}");
    }

    match ctx.app.start_watch().await {
        Ok(()) => watch::start(ctx),
        Err(e) => warn!("NewWave watch not started: {e:#}"),
    }
}

pub async fn on_connect(ctx: &Ctx) {
    if !ethereum::is_installed() {
        dom::alert("Get MetaMask!");
        return;
    }
    if let Err(e) = ctx.app.connect().await {
        error!("connect failed: {e:#}");
        return;
    }
    if !ctx.app.is_watching() {
        match ctx.app.start_watch().await {
            Ok(()) => watch::start(ctx),
            Err(e) => warn!("NewWave watch not started: {e:#}"),
        }
    }
}

pub async fn on_wave(ctx: &Ctx) {
    if let Err(e) = ctx.app.submit_wave().await {
        error!("wave failed: {e:#}");
    }
}
