//! State → DOM.
//!
//! `render` runs after every state change. The wave list is rebuilt only when
//! the waves themselves changed, so typing in the input stays cheap.

use std::cell::RefCell;

use tracing::error;
use wasm_bindgen::prelude::*;
use web_sys::Element;
use wp_api_types::Wave;
use wp_chain_client::abi::checksum_address;
use wp_wave_core::SessionState;

use crate::dom::{self, Elements};

thread_local! {
    static RENDERED: RefCell<Option<Vec<Wave>>> = const { RefCell::new(None) };
}

pub fn render(els: &Elements, state: &SessionState) {
    let needs_connect = state.needs_connect();
    els.connect_btn.set_hidden(!needs_connect);
    match &state.account {
        Some(account) => dom::set_text(&els.account_label, &checksum_address(account)),
        None => dom::set_text(&els.account_label, ""),
    }

    dom::set_text(&els.wave_count, &format!("♥ {}", state.wave_count));

    if els.wave_input.value() != state.draft {
        els.wave_input.set_value(&state.draft);
    }
    els.wave_btn.set_disabled(state.is_mining());
    match &state.pending_tx {
        Some(tx) => dom::set_text(&els.wave_status, &format!("Mining… {tx}")),
        None => dom::set_text(&els.wave_status, ""),
    }
    dom::toggle_class(&els.wave_status, "active", state.is_mining());

    let stale = RENDERED.with(|r| r.borrow().as_deref() != Some(state.waves.as_slice()));
    if stale {
        match render_waves(&els.wave_list, state) {
            Ok(()) => RENDERED.with(|r| *r.borrow_mut() = Some(state.waves.clone())),
            Err(e) => error!("rendering wave list failed: {e:?}"),
        }
    }
}

fn render_waves(list: &Element, state: &SessionState) -> Result<(), JsValue> {
    list.set_inner_html("");
    for wave in state.feed() {
        let card = wave_card(wave)?;
        list.append_child(&card)?;
    }
    Ok(())
}

fn wave_card(wave: &Wave) -> Result<Element, JsValue> {
    let card = dom::create_element("div")?;
    card.set_class_name("wave");
    let rows = [
        ("wave-address", format!("Address: {}", checksum_address(&wave.waver))),
        ("wave-time", format!("Time: {}", format_timestamp(wave.timestamp))),
        ("wave-message", format!("Message: {}", wave.message)),
    ];
    for (class, text) in rows {
        let row = dom::text_element("div", class, &text)?;
        card.append_child(&row)?;
    }
    Ok(card)
}

/// Seconds since the epoch as the browser's local date string.
fn format_timestamp(secs: u64) -> String {
    let date = js_sys::Date::new(&JsValue::from_f64(secs as f64 * 1000.0));
    String::from(date.to_string())
}
