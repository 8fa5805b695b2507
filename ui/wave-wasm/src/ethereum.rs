//! `window.ethereum` as an [`Eip1193Transport`].
//!
//! The provider object is looked up on every request since wallet extensions
//! may inject it after the page has loaded.

use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;
use js_sys::{Function, Promise, Reflect};
use serde::Serialize;
use serde_json::{Value, json};
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use wp_chain_client::ProviderError;
use wp_chain_eip1193::Eip1193Transport;

#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserEthereum;

fn provider() -> Option<JsValue> {
    let value = Reflect::get(&gloo_utils::window(), &JsValue::from_str("ethereum")).ok()?;
    if value.is_undefined() || value.is_null() {
        None
    } else {
        Some(value)
    }
}

pub fn is_installed() -> bool {
    provider().is_some()
}

fn malformed(e: impl std::fmt::Display) -> ProviderError {
    ProviderError::Malformed(e.to_string())
}

/// Map a rejected request (`{ code, message }` per EIP-1193) to a typed error.
fn js_error(err: JsValue) -> ProviderError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64());
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    match code {
        Some(code) => ProviderError::from_code(code as i64, message),
        None => ProviderError::Rpc { code: -1, message },
    }
}

#[async_trait(?Send)]
impl Eip1193Transport for BrowserEthereum {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let ethereum = provider().ok_or(ProviderError::NotInstalled)?;
        let request = Reflect::get(&ethereum, &JsValue::from_str("request"))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| malformed("window.ethereum.request is not a function"))?;

        let args = json!({ "method": method, "params": params })
            .serialize(&Serializer::json_compatible())
            .map_err(malformed)?;
        let promise: Promise = request
            .call1(&ethereum, &args)
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| malformed(format!("{method} did not return a promise")))?;

        let result = JsFuture::from(promise).await.map_err(js_error)?;
        if result.is_undefined() || result.is_null() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result).map_err(malformed)
    }

    async fn sleep(&self, millis: u32) {
        TimeoutFuture::new(millis).await;
    }
}
