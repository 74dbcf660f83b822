//! Settings panel, toasts and injected buttons
//!
//! Static markup goes through `set_inner_html`; anything holding user data
//! (seller names, terms) is built node by node with `set_text_content`.

use cp_core::selectors;
use cp_core::settings::{PanelState, Settings, RESULTS_PER_PAGE_CHOICES};
use cp_core::stats::Stats;
use cp_core::types::{FilterSet, SortMode};
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlInputElement, HtmlSelectElement};

use crate::timer;

pub const PANEL_ID: &str = "cleanplaats-panel";
pub const HEADER_ID: &str = "cleanplaats-header";
pub const RESULTS_SELECT_ID: &str = "cleanplaats-results-per-page";
pub const SORT_SELECT_ID: &str = "cleanplaats-sort-mode";
pub const TERM_INPUT_ID: &str = "cleanplaats-term-input";
pub const TERM_ADD_ID: &str = "cleanplaats-term-add";
pub const NOTICE_ID: &str = "cleanplaats-bubble-notification";

pub const BLACKLIST_BUTTON_CLASS: &str = "cleanplaats-blacklist-btn";
pub const UNBLACKLIST_SELLER_CLASS: &str = "cleanplaats-unblacklist-btn";
pub const UNBLACKLIST_TERM_CLASS: &str = "cleanplaats-unblacklist-term-btn";
pub const SELLER_ATTR: &str = selectors::SELLER_ATTR;
pub const TERM_ATTR: &str = "data-term";

/// Checkbox id per filter toggle.
pub const FILTER_TOGGLES: [(&str, FilterSet); 4] = [
    ("removeTopAds", FilterSet::TOP_ADS),
    ("removeDagtoppers", FilterSet::DAGTOPPERS),
    ("removePromotedListings", FilterSet::PROMOTED),
    ("removeOpvalStickers", FilterSet::OPVAL_STICKERS),
];

const TOAST_MS: u32 = 3000;
pub const NOTICE_MS: u32 = 5000;
const ONBOARDING_MS: u32 = 15000;
const FADE_MS: u32 = 300;

fn create(doc: &Document, tag: &str, class: &str) -> Result<web_sys::Element, JsValue> {
    let el = doc.create_element(tag)?;
    el.set_class_name(class);
    Ok(el)
}

fn body(doc: &Document) -> Result<web_sys::HtmlElement, JsValue> {
    doc.body().ok_or_else(|| JsValue::from_str("Document has no body"))
}

fn set_text(doc: &Document, id: &str, value: impl ToString) {
    if let Some(el) = doc.get_element_by_id(id) {
        el.set_text_content(Some(&value.to_string()));
    }
}

/// Fade out and remove `el`.
fn dismiss(el: web_sys::Element) {
    let _ = el.class_list().remove_1("visible");
    timer::fire_and_forget(FADE_MS, move || el.remove());
}

// =============================================================================
// Panel
// =============================================================================

fn panel_markup() -> String {
    let toggles = [
        ("removeTopAds", "Topadvertenties", "Verwijdert betaalde \"Topadvertenties\""),
        ("removeDagtoppers", "Dagtoppers", "Verwijdert \"Dagtopper\" advertenties"),
        (
            "removePromotedListings",
            "Bedrijfsadvertenties",
            "Verwijdert advertenties van bedrijven met een \"Bezoek website\" link",
        ),
        ("removeOpvalStickers", "Opvalstickers", "Verwijdert advertenties met opvalstickers"),
    ];
    let toggles: String = toggles
        .iter()
        .map(|(id, label, tip)| {
            format!(
                r#"<div class="cleanplaats-option">
                    <label class="cleanplaats-switch">
                        <input type="checkbox" id="{id}">
                        <span class="cleanplaats-switch-slider"></span>
                    </label>
                    <label for="{id}" class="cleanplaats-option-label">{label}
                        <div class="cleanplaats-tooltip">
                            <span class="cleanplaats-tooltip-icon">?</span>
                            <span class="cleanplaats-tooltip-text">{tip}</span>
                        </div>
                    </label>
                </div>"#
            )
        })
        .collect();

    let results: String = RESULTS_PER_PAGE_CHOICES
        .iter()
        .map(|n| format!(r#"<option value="{n}">{n}</option>"#))
        .collect();
    let sorts: String = SortMode::ALL
        .iter()
        .map(|mode| format!(r#"<option value="{}">{}</option>"#, mode.as_str(), mode.label()))
        .collect();

    let stats = [
        ("cleanplaats-topads-count", "Topadvertenties"),
        ("cleanplaats-dagtoppers-count", "Dagtoppers"),
        ("cleanplaats-promoted-count", "Bedrijfsadvertenties"),
        ("cleanplaats-stickers-count", "Opvalstickers"),
        ("cleanplaats-otherads-count", "Andere advertenties"),
        ("cleanplaats-total-count-stats", "Totaal"),
    ];
    let stats: String = stats
        .iter()
        .map(|(id, label)| {
            format!(
                r#"<div class="cleanplaats-stat-item">
                    <span class="cleanplaats-stat-label">{label}:</span>
                    <span class="cleanplaats-stat-value" id="{id}">0</span>
                </div>"#
            )
        })
        .collect();

    format!(
        r#"<div class="cleanplaats-header" id="{HEADER_ID}">
            <h3>Cleanplaats <span class="cleanplaats-badge" id="cleanplaats-total-count">0</span></h3>
            <button id="cleanplaats-toggle" class="cleanplaats-toggle">&#9650;</button>
        </div>
        <div class="cleanplaats-content">
            <div class="cleanplaats-options">
                <div class="cleanplaats-section-title">Filteropties</div>
                {toggles}
            </div>
            <div class="cleanplaats-options">
                <div class="cleanplaats-section-title">Zoekresultaten</div>
                <label class="cleanplaats-option-label">Resultaten per pagina
                    <select id="{RESULTS_SELECT_ID}">{results}</select>
                </label>
                <label class="cleanplaats-option-label">Sortering
                    <select id="{SORT_SELECT_ID}">{sorts}</select>
                </label>
            </div>
            <div class="cleanplaats-stats" id="cleanplaats-stats">
                <div class="cleanplaats-section-title">Verwijderde items</div>
                {stats}
            </div>
            <div class="cleanplaats-blacklist">
                <div class="cleanplaats-section-title">Verborgen verkopers</div>
                <ul id="cleanplaats-seller-list"></ul>
                <div class="cleanplaats-section-title">Verborgen zoektermen</div>
                <ul id="cleanplaats-term-list"></ul>
                <input type="text" id="{TERM_INPUT_ID}" placeholder="Zoekterm verbergen">
                <button id="{TERM_ADD_ID}" class="cleanplaats-button">Toevoegen</button>
            </div>
        </div>"#
    )
}

/// Create the panel unless it already exists.
pub fn build_panel(doc: &Document, settings: &Settings, state: &PanelState) -> Result<web_sys::Element, JsValue> {
    if let Some(panel) = doc.get_element_by_id(PANEL_ID) {
        return Ok(panel);
    }
    let panel = create(doc, "div", "cleanplaats-panel")?;
    panel.set_id(PANEL_ID);
    panel.set_inner_html(&panel_markup());
    body(doc)?.append_child(&panel)?;

    sync_controls(doc, settings);
    set_collapsed(doc, state.is_collapsed);
    render_blacklists(doc, settings)?;
    Ok(panel)
}

/// Reflect the settings in the panel controls.
pub fn sync_controls(doc: &Document, settings: &Settings) {
    let enabled = settings.enabled_filters();
    for (id, filter) in FILTER_TOGGLES {
        if let Some(input) = doc.get_element_by_id(id).and_then(|el| el.dyn_into::<HtmlInputElement>().ok()) {
            input.set_checked(enabled.contains(filter));
        }
    }
    if let Some(select) = select(doc, RESULTS_SELECT_ID) {
        select.set_value(&settings.results_per_page);
    }
    if let Some(select) = select(doc, SORT_SELECT_ID) {
        select.set_value(settings.default_sort_mode.as_str());
    }
}

pub fn select(doc: &Document, id: &str) -> Option<HtmlSelectElement> {
    doc.get_element_by_id(id).and_then(|el| el.dyn_into().ok())
}

pub fn input(doc: &Document, id: &str) -> Option<HtmlInputElement> {
    doc.get_element_by_id(id).and_then(|el| el.dyn_into().ok())
}

pub fn set_collapsed(doc: &Document, collapsed: bool) {
    if let Some(panel) = doc.get_element_by_id(PANEL_ID) {
        let _ = panel.class_list().toggle_with_force("collapsed", collapsed);
    }
    set_text(doc, "cleanplaats-toggle", if collapsed { '\u{25BC}' } else { '\u{25B2}' });
}

pub fn update_stats(doc: &Document, stats: &Stats) {
    set_text(doc, "cleanplaats-topads-count", stats.top_ads);
    set_text(doc, "cleanplaats-dagtoppers-count", stats.dagtoppers);
    set_text(doc, "cleanplaats-promoted-count", stats.promoted_listings);
    set_text(doc, "cleanplaats-stickers-count", stats.opval_stickers);
    set_text(doc, "cleanplaats-otherads-count", stats.other_ads);
    set_text(doc, "cleanplaats-total-count-stats", stats.total());
    set_text(doc, "cleanplaats-total-count", stats.total());
}

fn render_list(doc: &Document, list_id: &str, entries: &[String], button_class: &str, attr: &str, empty: &str) -> Result<(), JsValue> {
    let Some(list) = doc.get_element_by_id(list_id) else {
        return Ok(());
    };
    list.set_inner_html("");
    if entries.is_empty() {
        let li = doc.create_element("li")?;
        let em = doc.create_element("em")?;
        em.set_text_content(Some(empty));
        li.append_child(&em)?;
        list.append_child(&li)?;
        return Ok(());
    }
    for entry in entries {
        let li = doc.create_element("li")?;
        let name = doc.create_element("span")?;
        name.set_text_content(Some(entry));
        let button = create(doc, "button", button_class)?;
        button.set_attribute("type", "button")?;
        button.set_attribute(attr, entry)?;
        button.set_text_content(Some("Opheffen"));
        li.append_child(&name)?;
        li.append_child(&button)?;
        list.append_child(&li)?;
    }
    Ok(())
}

pub fn render_blacklists(doc: &Document, settings: &Settings) -> Result<(), JsValue> {
    render_list(
        doc,
        "cleanplaats-seller-list",
        &settings.blacklisted_sellers,
        UNBLACKLIST_SELLER_CLASS,
        SELLER_ATTR,
        "Geen verborgen verkopers",
    )?;
    render_list(
        doc,
        "cleanplaats-term-list",
        &settings.blacklisted_terms,
        UNBLACKLIST_TERM_CLASS,
        TERM_ATTR,
        "Geen verborgen zoektermen",
    )
}

// =============================================================================
// Blacklist buttons
// =============================================================================

/// Insert a "Verkoper verbergen" row after the seller container.
pub fn insert_blacklist_button(doc: &Document, container: &web_sys::Element, seller: &str) -> Result<(), JsValue> {
    let row = create(doc, "div", "cleanplaats-blacklist-btn-row")?;
    let button = create(doc, "button", BLACKLIST_BUTTON_CLASS)?;
    button.set_attribute("type", "button")?;
    button.set_attribute(SELLER_ATTR, seller)?;
    button.set_text_content(Some("Verkoper verbergen"));
    row.append_child(&button)?;
    container.insert_adjacent_element("afterend", &row)?;
    Ok(())
}

// =============================================================================
// Toasts
// =============================================================================

fn toast_body(doc: &Document, icon: &str, title: Option<&str>, message: &str) -> Result<web_sys::Element, JsValue> {
    let toast = create(doc, "div", "cleanplaats-blacklist-toast")?;
    let content = create(doc, "div", "cleanplaats-blacklist-toast-content")?;
    let icon_el = create(doc, "span", "cleanplaats-toast-icon")?;
    icon_el.set_text_content(Some(icon));
    let text = create(doc, "div", "cleanplaats-toast-message")?;
    if let Some(title) = title {
        let strong = doc.create_element("strong")?;
        strong.set_text_content(Some(title));
        text.append_child(&strong)?;
    }
    let span = doc.create_element("span")?;
    span.set_text_content(Some(message));
    text.append_child(&span)?;
    content.append_child(&icon_el)?;
    content.append_child(&text)?;
    toast.append_child(&content)?;
    Ok(toast)
}

fn show_briefly(doc: &Document, el: web_sys::Element, visible_ms: u32) -> Result<(), JsValue> {
    body(doc)?.append_child(&el)?;
    let shown = el.clone();
    timer::fire_and_forget(50, move || {
        let _ = shown.class_list().add_1("visible");
    });
    timer::fire_and_forget(visible_ms, move || dismiss(el));
    Ok(())
}

/// Short confirmation toast, e.g. after (un)blacklisting a seller.
pub fn show_toast(doc: &Document, title: &str, message: &str) -> Result<(), JsValue> {
    let toast = toast_body(doc, "\u{1F441}", Some(title), message)?;
    show_briefly(doc, toast, TOAST_MS)
}

/// Show or update the single notice bubble. The caller owns its removal
/// timer through [`remove_notice`].
pub fn show_notice(doc: &Document, message: &str) -> Result<(), JsValue> {
    if let Some(existing) = doc.get_element_by_id(NOTICE_ID) {
        if let Ok(Some(span)) = existing.query_selector(".cleanplaats-toast-message span") {
            span.set_text_content(Some(message));
        }
        return Ok(());
    }
    let toast = toast_body(doc, "\u{2728}", None, message)?;
    toast.set_id(NOTICE_ID);
    body(doc)?.append_child(&toast)?;
    timer::fire_and_forget(0, move || {
        let _ = toast.class_list().add_1("visible");
    });
    Ok(())
}

pub fn remove_notice(doc: &Document) {
    if let Some(notice) = doc.get_element_by_id(NOTICE_ID) {
        dismiss(notice);
    }
}

/// Remove every transient notice, as on navigation.
pub fn clear_notices(doc: &Document) {
    remove_notice(doc);
    if let Ok(stale) = doc.query_selector_all(".cleanplaats-empty-notification, #cleanplaats-loading") {
        for i in 0..stale.length() {
            if let Some(el) = stale.get(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok()) {
                el.remove();
            }
        }
    }
}

pub fn show_onboarding(doc: &Document) -> Result<(), JsValue> {
    let onboarding = create(doc, "div", "cleanplaats-onboarding")?;
    onboarding.set_id("cleanplaats-onboarding");
    onboarding.set_inner_html(
        r#"<div class="cleanplaats-onboarding-content">
            <div class="cleanplaats-onboarding-header">
                <h3>Welkom bij Cleanplaats!</h3>
                <button class="cleanplaats-onboarding-close" data-cleanplaats-dismiss>&times;</button>
            </div>
            <div class="cleanplaats-onboarding-steps">
                <div class="cleanplaats-onboarding-step"><span class="step-number">1</span>
                    <p>Cleanplaats verwijdert automatisch advertenties en promotionele content</p></div>
                <div class="cleanplaats-onboarding-step"><span class="step-number">2</span>
                    <p>Gebruik het configuratiescherm rechtsonder om de filtering aan te passen. Je opent en sluit het paneel via het pijltje bovenin.</p></div>
                <div class="cleanplaats-onboarding-step"><span class="step-number">3</span>
                    <p>Bekijk statistieken over verwijderde items in het configuratiescherm</p></div>
            </div>
            <button class="cleanplaats-onboarding-button" data-cleanplaats-dismiss>Aan de slag!</button>
        </div>"#,
    );
    body(doc)?.append_child(&onboarding)?;
    timer::fire_and_forget(ONBOARDING_MS, move || {
        if onboarding.is_connected() {
            let _ = onboarding.class_list().add_1("cleanplaats-fade-out");
            timer::fire_and_forget(FADE_MS, move || onboarding.remove());
        }
    });
    Ok(())
}

pub fn show_welcome(doc: &Document, removed: u32) -> Result<(), JsValue> {
    let message = if removed > 0 {
        format!("Cleanplaats is actief ({} items verwijderd)", removed)
    } else {
        "Cleanplaats is actief".to_string()
    };
    let toast = create(doc, "div", "cleanplaats-toast")?;
    toast.set_id("cleanplaats-toast");
    let text = create(doc, "span", "cleanplaats-toast-message")?;
    text.set_text_content(Some(&message));
    toast.append_child(&text)?;
    show_briefly(doc, toast, TOAST_MS)
}
