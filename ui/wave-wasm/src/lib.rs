//! Wave Portal WASM frontend.
//!
//! Browser shell around `wp_wave_core::WaveApp`: binds the page, talks to the
//! injected `window.ethereum` provider and re-renders on every state change.
//! Each concern lives in its own module.

pub mod actions;
pub mod config;
pub mod dom;
pub mod ethereum;
pub mod events;
pub mod logging;
pub mod render;
pub mod storage;
pub mod watch;

use std::rc::Rc;

use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wp_chain_eip1193::Eip1193Wallet;
use wp_wave_core::{WaveApp, WavePortal};

use crate::config::AppConfig;
use crate::dom::Elements;
use crate::ethereum::BrowserEthereum;
use crate::storage::LocalCountCache;

pub type App = WaveApp<Eip1193Wallet<BrowserEthereum>, LocalCountCache>;

/// Everything an event handler needs. Cheap to clone.
#[derive(Clone)]
pub struct Ctx {
    pub els: Elements,
    pub app: Rc<App>,
    pub config: Rc<AppConfig>,
}

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    init().await
}

async fn init() -> Result<(), JsValue> {
    let (config, rejected) = AppConfig::load();
    logging::init(config.log_level);
    for problem in &rejected {
        warn!("ignoring config attribute: {problem}");
    }
    info!(contract = %config.contract, "starting wave portal");

    let els = Elements::bind()?;

    let wallet = Eip1193Wallet::new(BrowserEthereum).with_receipt_poll_ms(config.receipt_poll_ms);
    let portal = WavePortal::new(wallet, config.contract.clone());
    let app = Rc::new(WaveApp::new(portal, LocalCountCache));

    {
        let els = els.clone();
        app.on_change(move |state| render::render(&els, state));
    }
    render::render(&els, &app.snapshot());

    let ctx = Ctx {
        els,
        app,
        config: Rc::new(config),
    };
    events::bind_events(&ctx)?;
    actions::on_load(&ctx).await;

    Ok(())
}
