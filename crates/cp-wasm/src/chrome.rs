//! Extension platform bindings
//!
//! Promise-returning calls are bound as `async` imports with `catch`, so a
//! rejected promise surfaces as `Err(JsValue)`. Timers are bound on the
//! global object and work in both the service worker and the page.

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    // ---- storage ---------------------------------------------------------

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    pub async fn storage_get(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    pub async fn storage_set(items: JsValue) -> Result<JsValue, JsValue>;

    /// `(changes, areaName)`
    #[wasm_bindgen(js_namespace = ["chrome", "storage", "onChanged"], js_name = addListener)]
    pub fn add_storage_listener(callback: &Closure<dyn FnMut(JsValue, JsValue)>);

    // ---- webNavigation ---------------------------------------------------

    #[wasm_bindgen(js_namespace = ["chrome", "webNavigation", "onBeforeNavigate"], js_name = addListener)]
    pub fn add_before_navigate_listener(callback: &Closure<dyn FnMut(JsValue)>, filter: &JsValue);

    #[wasm_bindgen(js_namespace = ["chrome", "webNavigation", "onHistoryStateUpdated"], js_name = addListener)]
    pub fn add_history_state_listener(callback: &Closure<dyn FnMut(JsValue)>, filter: &JsValue);

    // ---- tabs ------------------------------------------------------------

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = update)]
    pub async fn tabs_update(tab_id: i32, properties: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = get)]
    pub async fn tabs_get(tab_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = reload)]
    pub async fn tabs_reload(tab_id: i32) -> Result<JsValue, JsValue>;

    /// `(tabId, removeInfo)`
    #[wasm_bindgen(js_namespace = ["chrome", "tabs", "onRemoved"], js_name = addListener)]
    pub fn add_tab_removed_listener(callback: &Closure<dyn FnMut(i32, JsValue)>);

    // ---- declarativeNetRequest -------------------------------------------

    #[wasm_bindgen(catch, js_namespace = ["chrome", "declarativeNetRequest"], js_name = updateDynamicRules)]
    pub async fn update_dynamic_rules(options: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "declarativeNetRequest"], js_name = getDynamicRules)]
    pub async fn get_dynamic_rules() -> Result<JsValue, JsValue>;

    // ---- runtime ---------------------------------------------------------

    /// `(message, sender, sendResponse) -> keepChannelOpen`
    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    pub fn add_message_listener(
        callback: &Closure<dyn FnMut(JsValue, JsValue, js_sys::Function) -> JsValue>,
    );

    /// `(details)` on install and update.
    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onInstalled"], js_name = addListener)]
    pub fn add_installed_listener(callback: &Closure<dyn FnMut(JsValue)>);

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime"], js_name = sendMessage)]
    pub async fn send_message(message: JsValue) -> Result<JsValue, JsValue>;

    // ---- timers ----------------------------------------------------------

    #[wasm_bindgen(js_name = setTimeout)]
    pub fn set_timeout(handler: &js_sys::Function, timeout_ms: i32) -> i32;

    #[wasm_bindgen(js_name = clearTimeout)]
    pub fn clear_timeout(id: i32);

    #[wasm_bindgen(js_name = setInterval)]
    pub fn set_interval(handler: &js_sys::Function, timeout_ms: i32) -> i32;

    #[wasm_bindgen(js_name = clearInterval)]
    pub fn clear_interval(id: i32);
}

/// Convert a serializable value to a plain JS object.
pub fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize: {}", e)))?;
    js_sys::JSON::parse(&json)
}

/// Convert a JS value to JSON. `None` for `undefined` and for values JSON
/// cannot represent.
pub fn from_js(value: &JsValue) -> Option<Value> {
    if value.is_undefined() {
        return None;
    }
    let text = js_sys::JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

/// Read one key from local storage.
pub async fn storage_read(key: &str) -> Option<Value> {
    match storage_get(JsValue::from_str(key)).await {
        Ok(items) => from_js(&items).and_then(|mut items| items.get_mut(key).map(Value::take)),
        Err(e) => {
            log::warn!("Cleanplaats: failed to read {} from storage: {:?}", key, e);
            None
        }
    }
}

/// Write one key to local storage.
pub async fn storage_write(key: &str, value: Value) -> Result<(), JsValue> {
    let mut items = serde_json::Map::new();
    items.insert(key.to_string(), value);
    storage_set(to_js(&items)?).await.map(|_| ())
}

/// Ids of the installed dynamic rules. Empty when the table cannot be read.
pub async fn dynamic_rule_ids() -> Vec<u32> {
    let rules = match get_dynamic_rules().await {
        Ok(rules) => rules,
        Err(e) => {
            log::debug!("Cleanplaats: could not list dynamic rules: {:?}", e);
            return Vec::new();
        }
    };
    let Some(Value::Array(rules)) = from_js(&rules) else {
        return Vec::new();
    };
    rules
        .iter()
        .filter_map(|rule| rule.get("id").and_then(Value::as_u64))
        .filter_map(|id| u32::try_from(id).ok())
        .collect()
}
