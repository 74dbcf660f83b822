//! WebAssembly bindings for Cleanplaats
//!
//! The extension loads this module in two places: the background worker
//! calls [`start_background`], the content script calls [`start_content`].

use wasm_bindgen::prelude::*;

use cp_core::rewrite::{rewrite_api_url, rewrite_navigation_url, RewriteContext};
use cp_core::rule::RuleSync;
use cp_core::settings::Settings;
use cp_core::types::SortMode;

mod background;
mod chrome;
mod content;
pub mod dom;
mod timer;
mod ui;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

#[wasm_bindgen]
pub async fn start_background() -> Result<(), JsValue> {
    background::start().await
}

#[wasm_bindgen]
pub async fn start_content() -> Result<(), JsValue> {
    content::start().await
}

fn context_from<'a>(results_per_page: &'a str, sort_mode: &str) -> Result<RewriteContext<'a>, JsValue> {
    let mode = SortMode::parse(sort_mode)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown sort mode: {}", sort_mode)))?;
    Ok(RewriteContext::new(results_per_page, mode))
}

/// Corrected navigation URL, or `undefined` when the URL is already right.
#[wasm_bindgen]
pub fn rewrite_navigation(url: &str, results_per_page: &str, sort_mode: &str) -> Result<Option<String>, JsValue> {
    let ctx = context_from(results_per_page, sort_mode)?;
    Ok(rewrite_navigation_url(url, &ctx))
}

/// Corrected search API URL, or `undefined` when the URL is already right.
#[wasm_bindgen]
pub fn rewrite_api(url: &str, results_per_page: &str, sort_mode: &str) -> Result<Option<String>, JsValue> {
    let ctx = context_from(results_per_page, sort_mode)?;
    Ok(rewrite_api_url(url, &ctx))
}

/// The `updateDynamicRules` argument for a stored settings string, as JSON.
#[wasm_bindgen]
pub fn rule_update_json(settings_json: &str) -> Result<String, JsValue> {
    let settings = Settings::parse(settings_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&RuleSync::plan(&settings)).map_err(|e| JsValue::from_str(&e.to_string()))
}
