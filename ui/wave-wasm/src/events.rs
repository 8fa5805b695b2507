//! Event binding.
//!
//! Wires the page's listeners to `actions`. To add an async handler, write it
//! in `actions` and attach it with `on_click_async!`.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::Ctx;
use crate::actions;

/// Attach an async click handler taking `&Ctx`.
macro_rules! on_click_async {
    ($el:expr, $ctx:expr, $handler:expr) => {{
        let ctx = $ctx.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let ctx2 = ctx.clone();
            wasm_bindgen_futures::spawn_local(async move {
                $handler(&ctx2).await;
            });
        }) as Box<dyn FnMut(_)>);
        $el.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }};
}

/// Bind all UI event listeners. Call once after init.
pub fn bind_events(ctx: &Ctx) -> Result<(), JsValue> {
    on_click_async!(ctx.els.connect_btn, ctx, actions::on_connect);
    on_click_async!(ctx.els.wave_btn, ctx, actions::on_wave);

    // Input mirrors into the draft
    {
        let ctx2 = ctx.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::Event| {
            ctx2.app.set_draft(&ctx2.els.wave_input.value());
        }) as Box<dyn FnMut(_)>);
        ctx.els
            .wave_input
            .add_event_listener_with_callback("input", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }

    Ok(())
}
