//! Persisted settings record
//!
//! The record lives in extension local storage as a JSON *string* under
//! [`SETTINGS_KEY`]. Both the background and the content side keep their own
//! cached copy and refresh it from change notifications.
//!
//! Parsing is deliberately lenient: a record that is not JSON at all yields
//! the default record, and a single corrupt field yields that field's default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SettingsError;
use crate::types::{FilterSet, SortMode};

/// Storage key of the settings record.
pub const SETTINGS_KEY: &str = "cleanplaatsSettings";
/// Storage key of the panel UI state record.
pub const PANEL_STATE_KEY: &str = "panelState";
/// Storage key of the first-run flag.
pub const FIRST_RUN_KEY: &str = "firstRun";
/// Storage area the records live in.
pub const STORAGE_AREA: &str = "local";

/// Result count the marketplace serves when no `limit` is given.
pub const DEFAULT_RESULTS_PER_PAGE: &str = "30";

/// Result counts offered in the settings panel.
pub const RESULTS_PER_PAGE_CHOICES: [&str; 3] = ["30", "50", "100"];

// =============================================================================
// Settings
// =============================================================================

/// User settings shared by the background and content side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub results_per_page: String,
    pub default_sort_mode: SortMode,
    pub remove_top_ads: bool,
    pub remove_dagtoppers: bool,
    pub remove_promoted_listings: bool,
    pub remove_opval_stickers: bool,
    pub blacklisted_sellers: Vec<String>,
    pub blacklisted_terms: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            results_per_page: DEFAULT_RESULTS_PER_PAGE.to_string(),
            default_sort_mode: SortMode::Standard,
            remove_top_ads: true,
            remove_dagtoppers: true,
            remove_promoted_listings: true,
            remove_opval_stickers: true,
            blacklisted_sellers: Vec::new(),
            blacklisted_terms: Vec::new(),
        }
    }
}

impl Settings {
    /// Parse a settings record from its JSON text.
    ///
    /// Fails only when the text is not a JSON object. Individual fields that
    /// are missing or of the wrong shape fall back to their defaults.
    pub fn parse(text: &str) -> Result<Self, SettingsError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Build settings from an already-parsed JSON value.
    ///
    /// A JSON string holding a JSON object is unwrapped first, since the
    /// record is stored stringified.
    pub fn from_value(value: &Value) -> Result<Self, SettingsError> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            Value::String(inner) => Self::parse(inner),
            _ => Err(SettingsError::NotAnObject),
        }
    }

    /// Read the stored record, falling back to defaults on any failure.
    pub fn from_storage_value(stored: Option<&Value>) -> Self {
        let Some(value) = stored else {
            return Self::default();
        };
        if value.is_null() {
            return Self::default();
        }
        match Self::from_value(value) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Cleanplaats: stored settings unreadable, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Serialize to the stringified form kept in storage.
    pub fn to_storage_value(&self) -> String {
        // Serializing plain strings, bools and a unit enum cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let defaults = Self::default();

        let results_per_page = map
            .get("resultsPerPage")
            .and_then(parse_results_per_page)
            .unwrap_or(defaults.results_per_page);

        let default_sort_mode = map
            .get("defaultSortMode")
            .and_then(Value::as_str)
            .and_then(SortMode::parse)
            .unwrap_or(defaults.default_sort_mode);

        let flag = |key: &str, default: bool| map.get(key).and_then(Value::as_bool).unwrap_or(default);

        Self {
            results_per_page,
            default_sort_mode,
            remove_top_ads: flag("removeTopAds", defaults.remove_top_ads),
            remove_dagtoppers: flag("removeDagtoppers", defaults.remove_dagtoppers),
            remove_promoted_listings: flag("removePromotedListings", defaults.remove_promoted_listings),
            remove_opval_stickers: flag("removeOpvalStickers", defaults.remove_opval_stickers),
            blacklisted_sellers: map.get("blacklistedSellers").map(parse_ordered_set).unwrap_or_default(),
            blacklisted_terms: map.get("blacklistedTerms").map(parse_ordered_set).unwrap_or_default(),
        }
    }

    /// Whether the rewrite-relevant fields equal the site defaults.
    pub fn is_default_rewrite(&self) -> bool {
        self.results_per_page == DEFAULT_RESULTS_PER_PAGE
            && self.default_sort_mode == SortMode::Standard
    }

    /// Filters currently switched on.
    pub fn enabled_filters(&self) -> FilterSet {
        let mut set = FilterSet::empty();
        set.set(FilterSet::TOP_ADS, self.remove_top_ads);
        set.set(FilterSet::DAGTOPPERS, self.remove_dagtoppers);
        set.set(FilterSet::PROMOTED, self.remove_promoted_listings);
        set.set(FilterSet::OPVAL_STICKERS, self.remove_opval_stickers);
        set
    }

    /// Switch a single filter on or off.
    pub fn set_filter(&mut self, filter: FilterSet, enabled: bool) {
        if filter.contains(FilterSet::TOP_ADS) {
            self.remove_top_ads = enabled;
        }
        if filter.contains(FilterSet::DAGTOPPERS) {
            self.remove_dagtoppers = enabled;
        }
        if filter.contains(FilterSet::PROMOTED) {
            self.remove_promoted_listings = enabled;
        }
        if filter.contains(FilterSet::OPVAL_STICKERS) {
            self.remove_opval_stickers = enabled;
        }
    }

    /// Set the result count. Rejects anything but a non-empty digit string.
    pub fn set_results_per_page(&mut self, value: &str) -> bool {
        match normalize_numeral(value) {
            Some(numeral) => {
                self.results_per_page = numeral;
                true
            }
            None => false,
        }
    }

    pub fn is_seller_blacklisted(&self, seller: &str) -> bool {
        self.blacklisted_sellers.iter().any(|s| s == seller)
    }

    /// Add a seller. Returns `false` when already present or empty.
    pub fn add_seller(&mut self, seller: &str) -> bool {
        insert_ordered(&mut self.blacklisted_sellers, seller)
    }

    /// Remove a seller. Returns `false` when not present.
    pub fn remove_seller(&mut self, seller: &str) -> bool {
        remove_ordered(&mut self.blacklisted_sellers, seller)
    }

    /// Add a title term. Returns `false` when already present or empty.
    pub fn add_term(&mut self, term: &str) -> bool {
        insert_ordered(&mut self.blacklisted_terms, term)
    }

    /// Remove a title term. Returns `false` when not present.
    pub fn remove_term(&mut self, term: &str) -> bool {
        remove_ordered(&mut self.blacklisted_terms, term)
    }

    /// First blacklisted term contained in `title`, compared case-insensitively.
    pub fn matching_term(&self, title: &str) -> Option<&str> {
        if self.blacklisted_terms.is_empty() {
            return None;
        }
        let title = title.to_lowercase();
        self.blacklisted_terms
            .iter()
            .find(|term| title.contains(&term.to_lowercase()))
            .map(String::as_str)
    }
}

fn parse_results_per_page(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => normalize_numeral(s),
        Value::Number(n) => n.as_u64().filter(|n| *n > 0).map(|n| n.to_string()),
        _ => None,
    }
}

fn normalize_numeral(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = s.trim_start_matches('0');
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn parse_ordered_set(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    if let Value::Array(items) = value {
        for item in items {
            if let Some(s) = item.as_str() {
                insert_ordered(&mut out, s);
            }
        }
    }
    out
}

fn insert_ordered(set: &mut Vec<String>, entry: &str) -> bool {
    let entry = entry.trim();
    if entry.is_empty() || set.iter().any(|s| s == entry) {
        return false;
    }
    set.push(entry.to_string());
    true
}

fn remove_ordered(set: &mut Vec<String>, entry: &str) -> bool {
    let entry = entry.trim();
    let before = set.len();
    set.retain(|s| s != entry);
    set.len() != before
}

// =============================================================================
// Settings Cache
// =============================================================================

/// One storage-change notification, already unpacked from the platform event.
#[derive(Debug, Clone)]
pub struct StorageChange<'a> {
    pub area: &'a str,
    pub key: &'a str,
    pub new_value: Option<&'a Value>,
}

/// What a change notification did to the cached copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettingsDelta {
    /// Anything at all changed
    pub changed: bool,
    /// `resultsPerPage` or `defaultSortMode` changed
    pub rewrite_changed: bool,
    /// Filter toggles or blacklists changed
    pub filters_changed: bool,
}

/// Per-process cached copy of the settings record.
///
/// Refreshed from exactly one notification handler; everything else reads it
/// and passes `&Settings` down explicitly.
#[derive(Debug, Clone, Default)]
pub struct SettingsCache {
    current: Settings,
    loaded: bool,
}

impl SettingsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cached settings.
    #[inline]
    pub fn get(&self) -> &Settings {
        &self.current
    }

    /// Whether the initial load has happened.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Replace the cached copy with a freshly read stored value.
    pub fn load(&mut self, stored: Option<&Value>) -> SettingsDelta {
        let next = Settings::from_storage_value(stored);
        self.loaded = true;
        self.replace(next)
    }

    /// Replace the cached copy with settings written by this process.
    pub fn replace(&mut self, next: Settings) -> SettingsDelta {
        let delta = diff(&self.current, &next);
        self.current = next;
        delta
    }

    /// Apply a change notification. Other keys and areas are ignored.
    pub fn apply_change(&mut self, change: &StorageChange<'_>) -> SettingsDelta {
        if change.area != STORAGE_AREA || change.key != SETTINGS_KEY {
            return SettingsDelta::default();
        }
        let delta = self.load(change.new_value);
        if delta.rewrite_changed {
            log::info!(
                "Cleanplaats: rewrite settings now limit={} sort={}",
                self.current.results_per_page,
                self.current.default_sort_mode
            );
        }
        delta
    }
}

fn diff(old: &Settings, new: &Settings) -> SettingsDelta {
    let rewrite_changed = old.results_per_page != new.results_per_page
        || old.default_sort_mode != new.default_sort_mode;
    let filters_changed = old.enabled_filters() != new.enabled_filters()
        || old.blacklisted_sellers != new.blacklisted_sellers
        || old.blacklisted_terms != new.blacklisted_terms;
    SettingsDelta {
        changed: rewrite_changed || filters_changed,
        rewrite_changed,
        filters_changed,
    }
}

// =============================================================================
// Panel State
// =============================================================================

/// UI state of the settings panel, stored under [`PANEL_STATE_KEY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelState {
    pub is_collapsed: bool,
    pub has_shown_welcome_toast: bool,
}

impl PanelState {
    /// Read the stored record, falling back to defaults on any failure.
    pub fn from_storage_value(stored: Option<&Value>) -> Self {
        let parsed = match stored {
            Some(Value::String(text)) => serde_json::from_str(text),
            Some(value @ Value::Object(_)) => serde_json::from_value(value.clone()),
            _ => return Self::default(),
        };
        parsed.unwrap_or_else(|e| {
            log::warn!("Cleanplaats: stored panel state unreadable: {}", e);
            Self::default()
        })
    }

    pub fn to_storage_value(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// Interpret the stored first-run flag. Absent or non-boolean means first run.
pub fn is_first_run(stored: Option<&Value>) -> bool {
    stored.and_then(Value::as_bool).unwrap_or(true)
}
