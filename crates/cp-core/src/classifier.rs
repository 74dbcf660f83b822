//! Listing classifier
//!
//! One cleanup pass over the current document:
//!
//! 1. Delete fixed-signature ad elements that are not listings.
//! 2. Hide listings in each enabled category.
//! 3. Hide listings from blacklisted sellers or with blacklisted title terms.
//!
//! Passes are re-entrant. A listing that already carries the hidden marker is
//! skipped, so counters only grow by newly hidden listings.

use crate::dom::{trimmed_text, Document, Element};
use crate::error::DomError;
use crate::marker;
use crate::selectors;
use crate::settings::Settings;
use crate::stats::Stats;
use crate::types::{FilterSet, HideReason};

/// What a single pass changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    pub top_ads: u32,
    pub dagtoppers: u32,
    pub promoted: u32,
    pub opval_stickers: u32,
    pub blacklisted: u32,
    pub removed_ads: u32,
}

impl PassReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn add(&mut self, reason: HideReason, count: u32) {
        match reason {
            HideReason::TopAd => self.top_ads += count,
            HideReason::Dagtopper => self.dagtoppers += count,
            HideReason::Promoted => self.promoted += count,
            HideReason::OpvalSticker => self.opval_stickers += count,
            HideReason::BlacklistedSeller | HideReason::BlacklistedTerm => self.blacklisted += count,
        }
    }
}

/// Runs cleanup passes and keeps the page-view counters.
#[derive(Debug, Default)]
pub struct DomClassifier {
    stats: Stats,
}

impl DomClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Run one pass with the given settings.
    pub fn cleanup_pass<D: Document>(&mut self, doc: &D, settings: &Settings) -> PassReport {
        let mut report = PassReport::default();

        report.removed_ads = remove_ad_elements(doc);
        self.stats.record_removed_ads(report.removed_ads);

        let filters = settings.enabled_filters();
        let categories = [
            (FilterSet::TOP_ADS, HideReason::TopAd),
            (FilterSet::DAGTOPPERS, HideReason::Dagtopper),
            (FilterSet::PROMOTED, HideReason::Promoted),
            (FilterSet::OPVAL_STICKERS, HideReason::OpvalSticker),
        ];
        for (filter, reason) in categories {
            if !filters.contains(filter) {
                continue;
            }
            let count = match reason {
                HideReason::TopAd => hide_by_priority_label(doc, selectors::TOP_AD_LABEL, reason),
                HideReason::Dagtopper => hide_by_priority_label(doc, selectors::DAGTOPPER_LABEL, reason),
                HideReason::Promoted => hide_promoted(doc),
                _ => hide_opval_stickers(doc),
            };
            self.stats.record_hidden(reason, count);
            report.add(reason, count);
        }

        let (sellers, terms) = hide_blacklisted(doc, settings);
        report.add(HideReason::BlacklistedSeller, sellers);
        report.add(HideReason::BlacklistedTerm, terms);

        if !report.is_empty() {
            log::debug!("Cleanplaats: pass {:?}, totals {:?}", report, self.stats);
        }
        report
    }

    /// Restore every hidden element and reset the counters.
    pub fn restore_all<D: Document>(&mut self, doc: &D) -> u32 {
        self.stats.reset();
        restore_matching(doc, |_| true)
    }

    /// Restore listings hidden for `reason` that satisfy `predicate`.
    pub fn restore_reason<D, F>(&mut self, doc: &D, reason: HideReason, predicate: F) -> u32
    where
        D: Document,
        F: Fn(&D::Element) -> bool,
    {
        restore_matching(doc, |el| marker::hidden_reason(el) == Some(reason) && predicate(el))
    }

    /// Restore the listings hidden because `seller` was blacklisted.
    pub fn restore_seller<D: Document>(&mut self, doc: &D, seller: &str) -> u32 {
        self.restore_reason(doc, HideReason::BlacklistedSeller, |listing| {
            seller_name(listing).as_deref() == Some(seller)
        })
    }
}

fn restore_matching<D, F>(doc: &D, keep: F) -> u32
where
    D: Document,
    F: Fn(&D::Element) -> bool,
{
    let hidden = match doc.query_selector_all(marker::HIDDEN_SELECTOR) {
        Ok(hidden) => hidden,
        Err(e) => {
            log::warn!("Cleanplaats: could not look up hidden elements: {}", e);
            return 0;
        }
    };
    let mut restored = 0;
    for el in hidden.iter().filter(|el| keep(*el)) {
        match marker::restore(el) {
            Ok(true) => restored += 1,
            Ok(false) => {}
            Err(e) => log::warn!("Cleanplaats: error restoring element: {}", e),
        }
    }
    restored
}

/// Seller name shown on a listing, if any.
pub fn seller_name<E: Element>(listing: &E) -> Option<String> {
    let el = listing.query_selector(selectors::SELLER_NAME).ok()??;
    let name = trimmed_text(&el);
    (!name.is_empty()).then_some(name)
}

/// Seller a blacklist button should be offered for.
///
/// Stricter than [`seller_name`]: only listings with a seller-name container
/// holding a link with a seller name get a button.
pub fn blacklist_target<E: Element>(listing: &E) -> Option<(E, String)> {
    let container = listing.query_selector(selectors::SELLER_NAME_CONTAINER).ok()??;
    let link = container.query_selector("a").ok()??;
    let name_el = link.query_selector(selectors::SELLER_NAME_TEXT).ok()??;
    let name = trimmed_text(&name_el);
    (!name.is_empty()).then_some((container, name))
}

/// What a listing needs so its blacklist button matches its seller.
#[derive(Debug)]
pub enum ButtonUpdate<E> {
    /// The button already offers the current seller.
    Keep,
    /// Drop `stale_row` (if any) and add a button for `target` (if any).
    Replace {
        stale_row: Option<E>,
        target: Option<(E, String)>,
    },
}

/// Compare the listing's injected button with its current seller.
pub fn blacklist_button_update<E: Element>(listing: &E) -> ButtonUpdate<E> {
    let row = listing.query_selector(selectors::BLACKLIST_BUTTON_ROW).ok().flatten();
    let target = blacklist_target(listing);
    let offered = row
        .as_ref()
        .and_then(|row| row.query_selector(selectors::BLACKLIST_BUTTON).ok().flatten())
        .and_then(|button| button.get_attribute(selectors::SELLER_ATTR));
    match (&target, offered) {
        (Some((_, seller)), Some(offered)) if *seller == offered => ButtonUpdate::Keep,
        _ => ButtonUpdate::Replace { stale_row: row, target },
    }
}

fn select_all<D: Document>(doc: &D, selector: &str) -> Vec<D::Element> {
    doc.query_selector_all(selector).unwrap_or_else(|e| {
        log::warn!("Cleanplaats: {}", e);
        Vec::new()
    })
}

/// Hide the listing enclosing `el`. Returns 1 when newly hidden.
fn hide_enclosing_listing<E: Element>(el: &E, reason: HideReason) -> u32 {
    let hidden = el
        .closest(selectors::LISTING)
        .and_then(|listing| match listing {
            Some(listing) => marker::hide(&listing, reason),
            None => Ok(false),
        });
    match hidden {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(e) => {
            log::warn!("Cleanplaats: error hiding {} listing: {}", reason.as_str(), e);
            0
        }
    }
}

fn hide_by_priority_label<D: Document>(doc: &D, label: &str, reason: HideReason) -> u32 {
    select_all(doc, selectors::PRIORITY_LABEL)
        .iter()
        .filter(|span| trimmed_text(*span) == label)
        .map(|span| hide_enclosing_listing(span, reason))
        .sum()
}

fn hide_promoted<D: Document>(doc: &D) -> u32 {
    let mut count = 0;
    for link in select_all(doc, selectors::SELLER_LINK) {
        let has_visit_website = link
            .query_selector_all(selectors::SELLER_LINK_TEXT)
            .map(|els| els.iter().any(|el| trimmed_text(el) == selectors::VISIT_WEBSITE_LABEL))
            .unwrap_or(false);
        if has_visit_website {
            count += hide_enclosing_listing(&link, HideReason::Promoted);
        }
    }
    count
}

fn hide_opval_stickers<D: Document>(doc: &D) -> u32 {
    selectors::OPVAL_STICKERS
        .iter()
        .flat_map(|selector| select_all(doc, selector))
        .map(|sticker| hide_enclosing_listing(&sticker, HideReason::OpvalSticker))
        .sum()
}

/// Returns `(seller hides, term hides)`.
fn hide_blacklisted<D: Document>(doc: &D, settings: &Settings) -> (u32, u32) {
    if settings.blacklisted_sellers.is_empty() && settings.blacklisted_terms.is_empty() {
        return (0, 0);
    }
    let mut sellers = 0;
    let mut terms = 0;
    for listing in select_all(doc, selectors::LISTING) {
        if marker::is_hidden(&listing) {
            continue;
        }
        let reason = if seller_name(&listing).is_some_and(|name| settings.is_seller_blacklisted(&name)) {
            HideReason::BlacklistedSeller
        } else if settings.matching_term(&listing_title(&listing)).is_some() {
            HideReason::BlacklistedTerm
        } else {
            continue;
        };
        match marker::hide(&listing, reason) {
            Ok(true) if reason == HideReason::BlacklistedSeller => sellers += 1,
            Ok(true) => terms += 1,
            Ok(false) => {}
            Err(e) => log::warn!("Cleanplaats: error hiding blacklisted listing: {}", e),
        }
    }
    (sellers, terms)
}

fn listing_title<E: Element>(listing: &E) -> String {
    match listing.query_selector(selectors::LISTING_TITLE) {
        Ok(Some(title)) => title.text_content(),
        _ => listing.text_content(),
    }
}

/// Delete ad elements and the banner containers they sit in.
fn remove_ad_elements<D: Document>(doc: &D) -> u32 {
    let mut removed = 0;
    for selector in selectors::AD_ELEMENTS {
        for el in select_all(doc, selector) {
            if !el.is_connected() {
                continue;
            }
            match remove_with_container(&el) {
                Ok(count) => removed += count,
                Err(e) => log::warn!("Cleanplaats: error removing ad element: {}", e),
            }
        }
    }
    removed
}

fn remove_with_container<E: Element>(el: &E) -> Result<u32, DomError> {
    // Look the container up before the element leaves the tree.
    let container = el.closest(selectors::BANNER_CONTAINER)?;
    el.remove()?;
    let mut count = 1;
    if let Some(container) = container {
        if container.is_connected() {
            container.remove()?;
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{MemDocument, MemElement};

    fn listing(doc: &MemDocument, priority: Option<&str>, seller: &str, title: &str) -> MemElement {
        let li = doc.body().child("li").attr("class", "hz-Listing hz-Listing--list-item");
        li.child("h3").attr("class", "hz-Listing-title").text(title);
        if let Some(label) = priority {
            li.child("div").attr("class", "hz-Listing-priority").child("span").text(label);
        }
        let container = li.child("div").attr("class", "hz-Listing-seller-name-container");
        container
            .child("a")
            .attr("class", "hz-Listing-seller-link")
            .child("span")
            .attr("class", "hz-Listing-seller-name")
            .text(seller);
        li
    }

    fn settings_without_filters() -> Settings {
        let mut settings = Settings::default();
        settings.set_filter(FilterSet::ALL, false);
        settings
    }

    #[test]
    fn test_top_ads_hidden_and_counted() {
        let doc = MemDocument::new();
        let mut listings = Vec::new();
        for i in 0..10 {
            let priority = (i % 3 == 0 && i < 9).then_some("Topadvertentie");
            listings.push(listing(&doc, priority, &format!("seller {}", i), "fiets"));
        }

        let mut classifier = DomClassifier::new();
        let report = classifier.cleanup_pass(&doc, &Settings::default());
        assert_eq!(report.top_ads, 3);
        assert_eq!(classifier.stats().top_ads, 3);

        for (i, li) in listings.iter().enumerate() {
            let expected = i % 3 == 0 && i < 9;
            assert_eq!(marker::is_hidden(li), expected, "listing {}", i);
        }
    }

    #[test]
    fn test_second_pass_does_not_double_count() {
        let doc = MemDocument::new();
        listing(&doc, Some("Dagtopper"), "a", "bank");
        listing(&doc, None, "b", "stoel");

        let mut classifier = DomClassifier::new();
        classifier.cleanup_pass(&doc, &Settings::default());
        let report = classifier.cleanup_pass(&doc, &Settings::default());
        assert!(report.is_empty());
        assert_eq!(classifier.stats().dagtoppers, 1);
    }

    #[test]
    fn test_full_reapply_restores_style() {
        let doc = MemDocument::new();
        let li = listing(&doc, Some("Topadvertentie"), "a", "kast").attr("style", "order: 2");

        let mut settings = Settings::default();
        let mut classifier = DomClassifier::new();
        classifier.cleanup_pass(&doc, &settings);
        assert!(li.is_display_none());

        settings.set_filter(FilterSet::TOP_ADS, false);
        classifier.restore_all(&doc);
        classifier.cleanup_pass(&doc, &settings);

        assert!(!marker::is_hidden(&li));
        assert_eq!(li.style_text(), "order: 2");
        assert_eq!(classifier.stats().total(), 0);
    }

    #[test]
    fn test_promoted_and_sticker_listings() {
        let doc = MemDocument::new();
        let promoted = doc.body().child("li").attr("class", "hz-Listing");
        promoted
            .child("div")
            .attr("class", "hz-Listing-seller-link")
            .child("a")
            .text(" Bezoek website ");
        let sticker = doc.body().child("li").attr("class", "hz-Listing");
        sticker.child("div").attr("data-testid", "listing-opval-sticker");
        let plain = listing(&doc, None, "c", "lamp");

        let mut classifier = DomClassifier::new();
        let report = classifier.cleanup_pass(&doc, &Settings::default());
        assert_eq!(report.promoted, 1);
        assert_eq!(report.opval_stickers, 1);
        assert_eq!(marker::hidden_reason(&promoted), Some(HideReason::Promoted));
        assert_eq!(marker::hidden_reason(&sticker), Some(HideReason::OpvalSticker));
        assert!(!marker::is_hidden(&plain));
    }

    #[test]
    fn test_ad_elements_removed_with_container() {
        let doc = MemDocument::new();
        let container = doc.body().child("li").attr("class", "bannerContainerLoading");
        container.child("div").attr("class", "hz-Banner hz-Banner--fluid");
        doc.body().child("div").attr("id", "google_ads_iframe_/123_0");
        let kept = listing(&doc, None, "a", "tafel");

        let mut classifier = DomClassifier::new();
        let report = classifier.cleanup_pass(&doc, &settings_without_filters());

        assert_eq!(report.removed_ads, 3);
        assert_eq!(classifier.stats().other_ads, 3);
        assert!(!container.is_connected());
        assert!(doc.query_selector_all(".hz-Banner").unwrap().is_empty());
        assert!(kept.is_connected());

        let again = classifier.cleanup_pass(&doc, &settings_without_filters());
        assert_eq!(again.removed_ads, 0);
    }

    #[test]
    fn test_blacklisted_seller_and_term() {
        let doc = MemDocument::new();
        let by_seller = listing(&doc, None, "Spam BV", "fiets");
        let by_term = listing(&doc, None, "Piet", "Gratis IPHONE actie");
        let kept = listing(&doc, None, "Klaas", "stoel");

        let mut settings = settings_without_filters();
        settings.add_seller("Spam BV");
        settings.add_term("iphone");

        let mut classifier = DomClassifier::new();
        let report = classifier.cleanup_pass(&doc, &settings);
        assert_eq!(report.blacklisted, 2);
        assert_eq!(classifier.stats().total(), 0);
        assert_eq!(marker::hidden_reason(&by_seller), Some(HideReason::BlacklistedSeller));
        assert_eq!(marker::hidden_reason(&by_term), Some(HideReason::BlacklistedTerm));
        assert!(!marker::is_hidden(&kept));
    }

    #[test]
    fn test_restore_seller_only_touches_that_seller() {
        let doc = MemDocument::new();
        let spam = listing(&doc, None, "Spam BV", "fiets");
        let top_ad = listing(&doc, Some("Topadvertentie"), "Spam BV", "bank");
        let other = listing(&doc, None, "Ander", "kast");

        let mut settings = Settings::default();
        settings.add_seller("Spam BV");
        settings.add_seller("Ander");
        let mut classifier = DomClassifier::new();
        classifier.cleanup_pass(&doc, &settings);

        assert_eq!(classifier.restore_seller(&doc, "Spam BV"), 1);
        assert!(!marker::is_hidden(&spam));
        assert_eq!(marker::hidden_reason(&top_ad), Some(HideReason::TopAd));
        assert!(marker::is_hidden(&other));
        assert_eq!(classifier.stats().top_ads, 1);
    }

    #[test]
    fn test_blacklist_target() {
        let doc = MemDocument::new();
        let li = listing(&doc, None, " Jan ", "fiets");
        let (container, name) = blacklist_target(&li).unwrap();
        assert_eq!(name, "Jan");
        assert!(container.has_class("hz-Listing-seller-name-container"));

        let bare = doc.body().child("li").attr("class", "hz-Listing");
        assert!(blacklist_target(&bare).is_none());
    }

    fn add_button_row(li: &MemElement, seller: &str) -> MemElement {
        let row = li.child("div").attr("class", "cleanplaats-blacklist-btn-row");
        row.child("button")
            .attr("class", "cleanplaats-blacklist-btn")
            .attr("data-seller", seller);
        row
    }

    #[test]
    fn test_button_for_same_seller_is_kept() {
        let doc = MemDocument::new();
        let li = listing(&doc, None, "Jan", "fiets");
        add_button_row(&li, "Jan");
        assert!(matches!(blacklist_button_update(&li), ButtonUpdate::Keep));
    }

    #[test]
    fn test_button_for_other_seller_is_replaced() {
        let doc = MemDocument::new();
        let li = listing(&doc, None, "Piet", "fiets");
        let old = add_button_row(&li, "Jan");
        match blacklist_button_update(&li) {
            ButtonUpdate::Replace { stale_row, target } => {
                assert_eq!(stale_row, Some(old));
                assert_eq!(target.unwrap().1, "Piet");
            }
            ButtonUpdate::Keep => panic!("stale button kept"),
        }
    }

    #[test]
    fn test_missing_button_is_added() {
        let doc = MemDocument::new();
        let li = listing(&doc, None, "Jan", "fiets");
        match blacklist_button_update(&li) {
            ButtonUpdate::Replace { stale_row, target } => {
                assert!(stale_row.is_none());
                assert_eq!(target.unwrap().1, "Jan");
            }
            ButtonUpdate::Keep => panic!("no button to keep"),
        }

        let bare = doc.body().child("li").attr("class", "hz-Listing");
        add_button_row(&bare, "Jan");
        match blacklist_button_update(&bare) {
            ButtonUpdate::Replace { stale_row, target } => {
                assert!(stale_row.is_some());
                assert!(target.is_none());
            }
            ButtonUpdate::Keep => panic!("leftover row kept"),
        }
    }
}
