//! Background side: navigation rewriting, the redirect rule and messages

use std::cell::RefCell;
use std::rc::Rc;

use cp_core::error::RuleError;
use cp_core::messages::{Request, Response};
use cp_core::navigation::{
    DeferredReload, NavigationDecision, NavigationDetails, NavigationKind, NavigationWatcher,
    RESULT_PATH_PREFIXES,
};
use cp_core::rule::{RuleSync, TARGET_HOSTS};
use cp_core::settings::{SettingsCache, StorageChange, SETTINGS_KEY};
use serde::Deserialize;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::chrome;
use crate::timer;

#[derive(Debug, Default)]
struct Background {
    settings: SettingsCache,
    rules: RuleSync,
    watcher: NavigationWatcher,
}

type Shared = Rc<RefCell<Background>>;

/// Raw `webNavigation` event details.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNavigation {
    url: String,
    tab_id: i32,
    frame_id: i32,
    #[serde(default = "no_parent_frame")]
    parent_frame_id: i32,
    #[serde(default)]
    transition_type: Option<String>,
}

fn no_parent_frame() -> i32 {
    -1
}

impl From<RawNavigation> for NavigationDetails {
    fn from(raw: RawNavigation) -> Self {
        NavigationDetails {
            url: raw.url,
            tab_id: raw.tab_id,
            frame_id: raw.frame_id,
            parent_frame_id: raw.parent_frame_id,
            transition_type: raw.transition_type,
        }
    }
}

/// Start the background side.
///
/// Settings are loaded before any navigation listener registers, so the
/// first navigation signal already sees the stored values.
pub async fn start() -> Result<(), JsValue> {
    let state: Shared = Rc::new(RefCell::new(Background::default()));

    // Registered before the first await so the install event is not missed.
    register_installed_listener(state.clone());

    let stored = chrome::storage_read(SETTINGS_KEY).await;
    state.borrow_mut().settings.load(stored.as_ref());
    sync_rules(&state, &[]).await;

    register_storage_listener(state.clone());
    register_navigation_listeners(state.clone())?;
    register_tab_listener(state.clone());
    register_message_listener(state);

    log::info!("Cleanplaats: background started");
    Ok(())
}

/// Issue the planned rule update as one atomic platform call, also removing
/// the `stale` ids.
async fn sync_rules(state: &Shared, stale: &[u32]) {
    let update = RuleSync::plan_replacing(state.borrow().settings.get(), stale);
    let outcome = match chrome::to_js(&update) {
        Ok(options) => chrome::update_dynamic_rules(options)
            .await
            .map(|_| ())
            .map_err(|e| RuleError::Rejected(format!("{:?}", e))),
        Err(e) => Err(RuleError::Rejected(format!("{:?}", e))),
    };
    state.borrow_mut().rules.finish(&update, outcome);
}

/// Re-read the stored settings and re-sync the rule if it no longer matches
/// them, or if the last update failed.
async fn refresh(state: &Shared) {
    let stored = chrome::storage_read(SETTINGS_KEY).await;
    let current = {
        let mut guard = state.borrow_mut();
        let Background { settings, rules, .. } = &mut *guard;
        settings.load(stored.as_ref());
        rules.is_current(settings.get())
    };
    if !current {
        sync_rules(state, &[]).await;
    }
}

/// On install or update, clear every dynamic rule an earlier version left
/// behind before installing ours.
fn register_installed_listener(state: Shared) {
    let callback = Closure::<dyn FnMut(JsValue)>::new(move |_details: JsValue| {
        let state = state.clone();
        spawn_local(async move {
            let stale = chrome::dynamic_rule_ids().await;
            let stored = chrome::storage_read(SETTINGS_KEY).await;
            state.borrow_mut().settings.load(stored.as_ref());
            log::info!("Cleanplaats: installed or updated, clearing {} dynamic rules", stale.len());
            sync_rules(&state, &stale).await;
        });
    });
    chrome::add_installed_listener(&callback);
    callback.forget();
}

fn register_storage_listener(state: Shared) {
    let callback = Closure::<dyn FnMut(JsValue, JsValue)>::new(move |changes: JsValue, area: JsValue| {
        let Some(area) = area.as_string() else {
            return;
        };
        let Some(changes) = chrome::from_js(&changes) else {
            return;
        };
        let Some(entry) = changes.get(SETTINGS_KEY) else {
            return;
        };
        let change = StorageChange {
            area: &area,
            key: SETTINGS_KEY,
            new_value: entry.get("newValue"),
        };
        let delta = state.borrow_mut().settings.apply_change(&change);
        if delta.rewrite_changed {
            let state = state.clone();
            spawn_local(async move { sync_rules(&state, &[]).await });
        }
    });
    chrome::add_storage_listener(&callback);
    callback.forget();
}

/// Event filter limiting navigation signals to result pages on our hosts.
fn navigation_filter() -> Result<JsValue, JsValue> {
    let url: Vec<Value> = TARGET_HOSTS
        .iter()
        .flat_map(|host| {
            RESULT_PATH_PREFIXES
                .iter()
                .map(move |prefix| json!({ "hostEquals": host, "pathPrefix": prefix }))
        })
        .collect();
    chrome::to_js(&json!({ "url": url }))
}

fn register_navigation_listeners(state: Shared) -> Result<(), JsValue> {
    let filter = navigation_filter()?;

    let before = {
        let state = state.clone();
        Closure::<dyn FnMut(JsValue)>::new(move |details: JsValue| {
            on_navigation(&state, NavigationKind::BeforeNavigate, &details)
        })
    };
    chrome::add_before_navigate_listener(&before, &filter);
    before.forget();

    let history = Closure::<dyn FnMut(JsValue)>::new(move |details: JsValue| {
        on_navigation(&state, NavigationKind::HistoryStateUpdated, &details)
    });
    chrome::add_history_state_listener(&history, &filter);
    history.forget();

    Ok(())
}

fn on_navigation(state: &Shared, kind: NavigationKind, details: &JsValue) {
    let Some(raw) = chrome::from_js(details).and_then(|v| serde_json::from_value::<RawNavigation>(v).ok())
    else {
        log::debug!("Cleanplaats: unreadable navigation details");
        return;
    };
    let details = NavigationDetails::from(raw);

    let decision = {
        let mut guard = state.borrow_mut();
        let Background { settings, watcher, .. } = &mut *guard;
        watcher.on_navigation(kind, &details, settings.get())
    };

    let NavigationDecision::Redirect { tab_id, url, reload } = decision else {
        return;
    };

    let state = state.clone();
    spawn_local(async move {
        let properties = match chrome::to_js(&json!({ "url": url })) {
            Ok(properties) => properties,
            Err(e) => {
                log::warn!("Cleanplaats: {:?}", e);
                return;
            }
        };
        if let Err(e) = chrome::tabs_update(tab_id, properties).await {
            log::debug!("Cleanplaats: tab {} update failed: {:?}", tab_id, e);
            state.borrow_mut().watcher.forget_tab(tab_id);
            return;
        }
        if let Some(reload) = reload {
            schedule_reload(state, reload);
        }
    });
}

fn schedule_reload(state: Shared, reload: DeferredReload) {
    let delay = reload.delay_ms;
    timer::fire_and_forget(delay, move || {
        spawn_local(async move {
            let current_url = match chrome::tabs_get(reload.tab_id).await {
                Ok(tab) => chrome::from_js(&tab)
                    .and_then(|tab| tab.get("url").and_then(Value::as_str).map(str::to_string)),
                Err(_) => None,
            };
            let proceed = state.borrow_mut().watcher.take_reload(&reload, current_url.as_deref());
            if !proceed {
                return;
            }
            if let Err(e) = chrome::tabs_reload(reload.tab_id).await {
                log::debug!("Cleanplaats: reload of tab {} failed: {:?}", reload.tab_id, e);
            }
        });
    });
}

fn register_tab_listener(state: Shared) {
    let callback = Closure::<dyn FnMut(i32, JsValue)>::new(move |tab_id: i32, _info: JsValue| {
        state.borrow_mut().watcher.forget_tab(tab_id);
    });
    chrome::add_tab_removed_listener(&callback);
    callback.forget();
}

fn register_message_listener(state: Shared) {
    let callback = Closure::<dyn FnMut(JsValue, JsValue, js_sys::Function) -> JsValue>::new(
        move |message: JsValue, _sender: JsValue, send_response: js_sys::Function| -> JsValue {
            let message = chrome::from_js(&message).unwrap_or(Value::Null);
            let request = match Request::from_message(&message) {
                Ok(request) => request,
                Err(reply) => {
                    respond(&send_response, &reply);
                    return JsValue::FALSE;
                }
            };

            let state = state.clone();
            spawn_local(async move {
                refresh(&state).await;
                let reply = Response::ack(request.action, state.borrow().settings.get());
                respond(&send_response, &reply);
            });

            // Keep the channel open for the async reply.
            JsValue::TRUE
        },
    );
    chrome::add_message_listener(&callback);
    callback.forget();
}

fn respond(send_response: &js_sys::Function, reply: &Response) {
    match chrome::to_js(reply) {
        Ok(value) => {
            let _ = send_response.call1(&JsValue::UNDEFINED, &value);
        }
        Err(e) => log::warn!("Cleanplaats: could not encode reply: {:?}", e),
    }
}
