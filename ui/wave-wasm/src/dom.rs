//! DOM element bindings.
//!
//! All fields are resolved once at startup. To add a UI element, add a field
//! here and bind it in `Elements::bind()`.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlButtonElement, HtmlInputElement};

// ── Helpers ──

fn doc() -> Document {
    gloo_utils::document()
}

pub fn by_id(id: &str) -> Option<Element> {
    doc().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

pub fn create_element(tag: &str) -> Result<Element, JsValue> {
    doc().create_element(tag)
}

/// `<tag class="cls">text</tag>`, text set as text content.
pub fn text_element(tag: &str, cls: &str, text: &str) -> Result<Element, JsValue> {
    let el = create_element(tag)?;
    el.set_class_name(cls);
    el.set_text_content(Some(text));
    Ok(el)
}

pub fn alert(message: &str) {
    let _ = gloo_utils::window().alert_with_message(message);
}

// ── Elements struct ──

/// All DOM element references used by the page.
#[derive(Clone)]
pub struct Elements {
    pub connect_btn: HtmlButtonElement,
    pub account_label: Element,

    pub wave_input: HtmlInputElement,
    pub wave_btn: HtmlButtonElement,
    pub wave_status: Element,

    pub wave_count: Element,
    pub wave_list: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_input {
    ($id:expr) => {
        by_id_typed::<HtmlInputElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing input #{}", $id)))?
    };
}

macro_rules! get_button {
    ($id:expr) => {
        by_id_typed::<HtmlButtonElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing button #{}", $id)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after the module is instantiated.
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            connect_btn: get_button!("connectBtn"),
            account_label: get_el!("accountLabel"),

            wave_input: get_input!("waveInput"),
            wave_btn: get_button!("waveBtn"),
            wave_status: get_el!("waveStatus"),

            wave_count: get_el!("waveCount"),
            wave_list: get_el!("waveList"),
        })
    }
}
