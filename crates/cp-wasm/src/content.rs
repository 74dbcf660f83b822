//! Content side: cleanup passes, mutation handling and the settings panel

use std::cell::RefCell;
use std::rc::Rc;

use cp_core::classifier::{blacklist_button_update, ButtonUpdate, DomClassifier};
use cp_core::coordinator::{MutationCoordinator, MutationResponse, PollStep, POLL_INTERVAL_MS};
use cp_core::dom::{Document as _, Element as _};
use cp_core::empty_page::{EmptyPageReport, CHECK_DELAY_MS};
use cp_core::keyboard::CarouselStep;
use cp_core::messages::{Action, Request};
use cp_core::selectors;
use cp_core::settings::{
    is_first_run, PanelState, Settings, SettingsCache, SettingsDelta, StorageChange, FIRST_RUN_KEY,
    PANEL_STATE_KEY, SETTINGS_KEY,
};
use cp_core::task::TaskSlot;
use cp_core::types::SortMode;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Event, HtmlElement, HtmlInputElement, KeyboardEvent, MutationObserver, MutationObserverInit, MutationRecord,
};

use crate::chrome;
use crate::dom::{WebDocument, WebElement};
use crate::timer::Timer;
use crate::ui;

const HOME_HOST: &str = "www.marktplaats.nl";

struct Content {
    dom: WebDocument,
    settings: SettingsCache,
    panel: PanelState,
    classifier: DomClassifier,
    coordinator: MutationCoordinator<Timer>,
    empty_check: TaskSlot<Timer>,
    notice: TaskSlot<Timer>,
}

type Shared = Rc<RefCell<Content>>;

fn current_url() -> String {
    web_sys::window()
        .and_then(|w| w.location().href().ok())
        .unwrap_or_default()
}

/// Start the content side on a marketplace page.
pub async fn start() -> Result<(), JsValue> {
    let doc = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document"))?;

    let stored_settings = chrome::storage_read(SETTINGS_KEY).await;
    let stored_panel = chrome::storage_read(PANEL_STATE_KEY).await;
    let first_run = is_first_run(chrome::storage_read(FIRST_RUN_KEY).await.as_ref());
    if first_run {
        if let Err(e) = chrome::storage_write(FIRST_RUN_KEY, Value::Bool(false)).await {
            log::warn!("Cleanplaats: could not clear first-run flag: {:?}", e);
        }
    }

    let mut settings = SettingsCache::new();
    settings.load(stored_settings.as_ref());

    let state: Shared = Rc::new(RefCell::new(Content {
        dom: WebDocument(doc.clone()),
        settings,
        panel: PanelState::from_storage_value(stored_panel.as_ref()),
        classifier: DomClassifier::new(),
        coordinator: MutationCoordinator::new(&current_url()),
        empty_check: TaskSlot::new(),
        notice: TaskSlot::new(),
    }));

    {
        let content = state.borrow();
        ui::build_panel(&doc, content.settings.get(), &content.panel)?;
    }
    greet(&state, first_run);

    register_click_listener(&state, &doc)?;
    register_change_listener(&state, &doc)?;
    register_keyboard_listener(&doc)?;
    register_storage_listener(&state);
    register_observer(&state, &doc)?;

    // Initial load waits for content the same way a navigation does.
    start_polling(&state);

    log::info!("Cleanplaats: content script started");
    Ok(())
}

fn greet(state: &Shared, first_run: bool) {
    let doc = state.borrow().dom.0.clone();
    if first_run {
        if let Err(e) = ui::show_onboarding(&doc) {
            log::warn!("Cleanplaats: {:?}", e);
        }
        return;
    }

    let on_home = web_sys::window()
        .map(|w| {
            let location = w.location();
            location.pathname().ok().as_deref() == Some("/")
                && location.hostname().ok().as_deref() == Some(HOME_HOST)
        })
        .unwrap_or(false);
    if !on_home || state.borrow().panel.has_shown_welcome_toast {
        return;
    }

    let removed = state.borrow().classifier.stats().total();
    if let Err(e) = ui::show_welcome(&doc, removed) {
        log::warn!("Cleanplaats: {:?}", e);
    }
    state.borrow_mut().panel.has_shown_welcome_toast = true;
    save_panel_state(state);
}

// =============================================================================
// Passes
// =============================================================================

/// One incremental pass: counters accumulate.
fn run_pass(state: &Shared) {
    let mut guard = state.borrow_mut();
    let content = &mut *guard;
    content.classifier.cleanup_pass(&content.dom, content.settings.get());
    inject_blacklist_buttons(&content.dom);
    ui::update_stats(&content.dom.0, content.classifier.stats());
}

/// Restore everything, reset the counters and classify again.
fn full_reapply(state: &Shared) {
    {
        let mut guard = state.borrow_mut();
        let content = &mut *guard;
        content.classifier.restore_all(&content.dom);
        ui::remove_notice(&content.dom.0);
    }
    run_pass(state);
    schedule_empty_check(state);
}

fn inject_blacklist_buttons(dom: &WebDocument) {
    let Ok(listings) = dom.query_selector_all(selectors::LISTING) else {
        return;
    };
    for listing in listings {
        let ButtonUpdate::Replace { stale_row, target } = blacklist_button_update(&listing) else {
            continue;
        };
        if let Some(row) = stale_row {
            if let Err(e) = row.remove() {
                log::debug!("Cleanplaats: could not remove blacklist button: {}", e);
            }
        }
        let Some((container, seller)) = target else {
            continue;
        };
        if let Err(e) = ui::insert_blacklist_button(&dom.0, &container.0, &seller) {
            log::warn!("Cleanplaats: could not add blacklist button: {:?}", e);
        }
    }
}

fn start_polling(state: &Shared) {
    let weak = Rc::downgrade(state);
    let timer = Timer::interval(POLL_INTERVAL_MS, move || {
        if let Some(state) = weak.upgrade() {
            poll_tick(&state);
        }
    });
    state.borrow_mut().coordinator.start_polling(timer);
}

fn poll_tick(state: &Shared) {
    let step = {
        let mut content = state.borrow_mut();
        let present = content.dom.any_matches(&selectors::CONTENT_READY);
        content.coordinator.poll_tick(present)
    };
    match step {
        PollStep::Ready => {
            log::debug!("Cleanplaats: content ready, cleaning up");
            run_pass(state);
            schedule_empty_check(state);
        }
        PollStep::GiveUp | PollStep::Continue => {}
    }
}

fn schedule_empty_check(state: &Shared) {
    let weak = Rc::downgrade(state);
    let timer = Timer::timeout(CHECK_DELAY_MS, move || {
        if let Some(state) = weak.upgrade() {
            check_empty_page(&state);
        }
    });
    state.borrow_mut().empty_check.replace(timer);
}

fn check_empty_page(state: &Shared) {
    run_pass(state);
    let (doc, report) = {
        let content = state.borrow();
        (content.dom.0.clone(), EmptyPageReport::from_document(&content.dom))
    };
    let Some(message) = report.notice() else {
        return;
    };
    ui::clear_notices(&doc);
    if let Err(e) = ui::show_notice(&doc, &message) {
        log::warn!("Cleanplaats: {:?}", e);
        return;
    }
    let weak = Rc::downgrade(state);
    let timer = Timer::timeout(ui::NOTICE_MS, move || {
        if let Some(state) = weak.upgrade() {
            ui::remove_notice(&state.borrow().dom.0);
        }
    });
    state.borrow_mut().notice.replace(timer);
}

// =============================================================================
// Settings
// =============================================================================

/// Apply `edit` to a copy of the settings. Returns `None` when it reports no
/// change; otherwise the new settings are cached and persisted.
fn update_settings(state: &Shared, refresh_rule: bool, edit: impl FnOnce(&mut Settings) -> bool) -> Option<SettingsDelta> {
    let mut next = state.borrow().settings.get().clone();
    if !edit(&mut next) {
        return None;
    }
    let stored = next.to_storage_value();
    let delta = state.borrow_mut().settings.replace(next);

    spawn_local(async move {
        if let Err(e) = chrome::storage_write(SETTINGS_KEY, Value::String(stored)).await {
            log::warn!("Cleanplaats: failed to save settings: {:?}", e);
            return;
        }
        if refresh_rule {
            request_refresh().await;
        }
    });
    Some(delta)
}

async fn request_refresh() {
    let message = match chrome::to_js(&Request::new(Action::ForceRefresh)) {
        Ok(message) => message,
        Err(e) => {
            log::warn!("Cleanplaats: {:?}", e);
            return;
        }
    };
    match chrome::send_message(message).await {
        Ok(reply) => log::debug!("Cleanplaats: background refreshed: {:?}", chrome::from_js(&reply)),
        Err(e) => log::warn!("Cleanplaats: background did not answer refresh: {:?}", e),
    }
}

fn save_panel_state(state: &Shared) {
    let stored = state.borrow().panel.to_storage_value();
    spawn_local(async move {
        if let Err(e) = chrome::storage_write(PANEL_STATE_KEY, Value::String(stored)).await {
            log::warn!("Cleanplaats: failed to save panel state: {:?}", e);
        }
    });
}

fn rerender_blacklists(state: &Shared) {
    let content = state.borrow();
    if let Err(e) = ui::render_blacklists(&content.dom.0, content.settings.get()) {
        log::warn!("Cleanplaats: {:?}", e);
    }
}

fn toast(state: &Shared, title: &str, message: &str) {
    let doc = state.borrow().dom.0.clone();
    if let Err(e) = ui::show_toast(&doc, title, message) {
        log::warn!("Cleanplaats: {:?}", e);
    }
}

fn blacklist_seller(state: &Shared, seller: &str) {
    if update_settings(state, false, |s| s.add_seller(seller)).is_none() {
        return;
    }
    run_pass(state);
    rerender_blacklists(state);
    toast(state, &format!("{} verborgen", seller), "Beheer verborgen verkopers via het paneel");
}

fn unblacklist_seller(state: &Shared, seller: &str) {
    if update_settings(state, false, |s| s.remove_seller(seller)).is_none() {
        return;
    }
    {
        let mut guard = state.borrow_mut();
        let content = &mut *guard;
        let restored = content.classifier.restore_seller(&content.dom, seller);
        log::debug!("Cleanplaats: restored {} listings from {}", restored, seller);
    }
    run_pass(state);
    rerender_blacklists(state);
    toast(
        state,
        &format!("{} niet meer verborgen", seller),
        "Deze verkoper is weer zichtbaar in de resultaten",
    );
}

fn add_term(state: &Shared) {
    let doc = state.borrow().dom.0.clone();
    let Some(input) = ui::input(&doc, ui::TERM_INPUT_ID) else {
        return;
    };
    let term = input.value();
    if update_settings(state, false, |s| s.add_term(&term)).is_none() {
        return;
    }
    input.set_value("");
    rerender_blacklists(state);
    full_reapply(state);
}

fn remove_term(state: &Shared, term: &str) {
    if update_settings(state, false, |s| s.remove_term(term)).is_none() {
        return;
    }
    rerender_blacklists(state);
    full_reapply(state);
}

fn toggle_panel(state: &Shared) {
    let (doc, collapsed) = {
        let mut content = state.borrow_mut();
        content.panel.is_collapsed = !content.panel.is_collapsed;
        (content.dom.0.clone(), content.panel.is_collapsed)
    };
    ui::set_collapsed(&doc, collapsed);
    save_panel_state(state);
}

// =============================================================================
// Listeners
// =============================================================================

fn closest(target: &web_sys::Element, selector: &str) -> Option<web_sys::Element> {
    target.closest(selector).ok().flatten()
}

/// One delegated click listener for every injected control.
fn register_click_listener(state: &Shared, doc: &web_sys::Document) -> Result<(), JsValue> {
    let state = state.clone();
    let blacklist_button = format!(".{}", ui::BLACKLIST_BUTTON_CLASS);
    let unblacklist_seller_button = format!(".{}", ui::UNBLACKLIST_SELLER_CLASS);
    let unblacklist_term_button = format!(".{}", ui::UNBLACKLIST_TERM_CLASS);
    let term_add = format!("#{}", ui::TERM_ADD_ID);
    let header = format!("#{}", ui::HEADER_ID);

    let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<web_sys::Element>().ok()) else {
            return;
        };

        if let Some(button) = closest(&target, &blacklist_button) {
            event.prevent_default();
            event.stop_propagation();
            if let Some(seller) = button.get_attribute(ui::SELLER_ATTR) {
                blacklist_seller(&state, &seller);
            }
        } else if let Some(button) = closest(&target, &unblacklist_seller_button) {
            if let Some(seller) = button.get_attribute(ui::SELLER_ATTR) {
                unblacklist_seller(&state, &seller);
            }
        } else if let Some(button) = closest(&target, &unblacklist_term_button) {
            if let Some(term) = button.get_attribute(ui::TERM_ATTR) {
                remove_term(&state, &term);
            }
        } else if closest(&target, &term_add).is_some() {
            add_term(&state);
        } else if let Some(dismiss) = closest(&target, "[data-cleanplaats-dismiss]") {
            if let Some(onboarding) = closest(&dismiss, ".cleanplaats-onboarding") {
                onboarding.remove();
            }
        } else if closest(&target, &header).is_some()
            && target.tag_name() != "INPUT"
            && closest(&target, ".cleanplaats-tooltip").is_none()
        {
            toggle_panel(&state);
        }
    });
    // Capture phase, so page handlers on the surrounding listing link run
    // after the blacklist button has cancelled the click.
    doc.add_event_listener_with_callback_and_bool("click", callback.as_ref().unchecked_ref(), true)?;
    callback.forget();
    Ok(())
}

/// Panel toggles and selects.
fn register_change_listener(state: &Shared, doc: &web_sys::Document) -> Result<(), JsValue> {
    let state = state.clone();
    let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<web_sys::Element>().ok()) else {
            return;
        };
        let id = target.id();

        if let Some((_, filter)) = ui::FILTER_TOGGLES.iter().find(|(toggle, _)| *toggle == id) {
            let checked = target.dyn_ref::<HtmlInputElement>().map(|i| i.checked()).unwrap_or(false);
            if update_settings(&state, false, |s| {
                s.set_filter(*filter, checked);
                true
            })
            .is_some()
            {
                full_reapply(&state);
            }
        } else if id == ui::RESULTS_SELECT_ID {
            let Some(value) = ui::select(&state.borrow().dom.0, ui::RESULTS_SELECT_ID).map(|s| s.value()) else {
                return;
            };
            update_settings(&state, true, |s| s.set_results_per_page(&value));
        } else if id == ui::SORT_SELECT_ID {
            let mode = ui::select(&state.borrow().dom.0, ui::SORT_SELECT_ID)
                .and_then(|s| SortMode::parse(&s.value()));
            let Some(mode) = mode else {
                return;
            };
            update_settings(&state, true, |s| {
                s.default_sort_mode = mode;
                true
            });
        }
    });
    doc.add_event_listener_with_callback("change", callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

/// Arrow keys page through the photo carousel of a listing.
fn register_keyboard_listener(doc: &web_sys::Document) -> Result<(), JsValue> {
    let dom = WebDocument(doc.clone());
    let callback = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
        let target_tag = event
            .target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            .map(|el| el.tag_name())
            .unwrap_or_default();
        let Some(step) = CarouselStep::from_key(&event.key(), &target_tag) else {
            return;
        };
        let Some(button) = step.button(&dom) else {
            return;
        };
        event.prevent_default();
        if let Some(button) = button.0.dyn_ref::<HtmlElement>() {
            let _ = button.focus();
            button.click();
        }
    });
    doc.add_event_listener_with_callback("keydown", callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

/// Settings written by another tab or context.
fn register_storage_listener(state: &Shared) {
    let state = state.clone();
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
        if !delta.changed {
            return;
        }
        {
            let content = state.borrow();
            ui::sync_controls(&content.dom.0, content.settings.get());
        }
        if delta.filters_changed {
            rerender_blacklists(&state);
            full_reapply(&state);
        }
    });
    chrome::add_storage_listener(&callback);
    callback.forget();
}

fn added_elements(records: &js_sys::Array) -> Vec<WebElement> {
    let mut added = Vec::new();
    for record in records.iter() {
        let Ok(record) = record.dyn_into::<MutationRecord>() else {
            continue;
        };
        let nodes = record.added_nodes();
        for i in 0..nodes.length() {
            if let Some(el) = nodes.get(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok()) {
                added.push(WebElement(el));
            }
        }
    }
    added
}

/// The single observer over the whole document.
fn register_observer(state: &Shared, doc: &web_sys::Document) -> Result<(), JsValue> {
    let state = state.clone();
    let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
        move |records: js_sys::Array, _observer: MutationObserver| {
            let added = added_elements(&records);
            let response = state.borrow_mut().coordinator.observe(&current_url(), &added);
            match response {
                MutationResponse::Navigated => {
                    ui::clear_notices(&state.borrow().dom.0);
                    start_polling(&state);
                }
                MutationResponse::Cleanup => run_pass(&state),
                MutationResponse::Nothing => {}
            }
        },
    );
    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    observer.observe_with_options(doc, &init)?;
    callback.forget();
    Ok(())
}
