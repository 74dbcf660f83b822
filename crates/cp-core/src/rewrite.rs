//! Rewrite Engine
//!
//! Decides whether a result-page URL already encodes the desired result
//! count and sort order, and if not, derives the corrected URL. Navigation
//! URLs carry their options in the fragment, API URLs in the query string;
//! both go through the same policy via [`OptionCarrier`].

use crate::fragment::HashOptions;
use crate::settings::Settings;
use crate::types::{is_known_sort_by, SortMode};
use crate::url::{QueryParams, UrlParts};

pub const LIMIT_KEY: &str = "limit";
pub const SORT_BY_KEY: &str = "sortBy";
pub const SORT_ORDER_KEY: &str = "sortOrder";

// =============================================================================
// Rewrite Context
// =============================================================================

/// The two settings the rewrite policy depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteContext<'a> {
    pub results_per_page: &'a str,
    pub sort_mode: SortMode,
}

impl<'a> RewriteContext<'a> {
    pub fn new(results_per_page: &'a str, sort_mode: SortMode) -> Self {
        Self { results_per_page, sort_mode }
    }
}

impl<'a> From<&'a Settings> for RewriteContext<'a> {
    fn from(settings: &'a Settings) -> Self {
        Self {
            results_per_page: &settings.results_per_page,
            sort_mode: settings.default_sort_mode,
        }
    }
}

// =============================================================================
// Option Carriers
// =============================================================================

/// Key/value storage the policy reads and edits.
trait OptionCarrier {
    fn get(&self, key: &str) -> Option<&str>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str) -> bool;
}

impl OptionCarrier for HashOptions {
    fn get(&self, key: &str) -> Option<&str> {
        HashOptions::get(self, key)
    }
    fn set(&mut self, key: &str, value: &str) {
        HashOptions::set(self, key, value)
    }
    fn remove(&mut self, key: &str) -> bool {
        HashOptions::remove(self, key)
    }
}

impl OptionCarrier for QueryParams {
    fn get(&self, key: &str) -> Option<&str> {
        QueryParams::get(self, key)
    }
    fn set(&mut self, key: &str, value: &str) {
        QueryParams::set(self, key, value)
    }
    fn remove(&mut self, key: &str) -> bool {
        QueryParams::remove(self, key)
    }
}

/// Apply the limit/sort policy. Returns whether anything changed.
fn apply_policy<C: OptionCarrier>(options: &mut C, ctx: &RewriteContext<'_>) -> bool {
    let mut changed = false;

    match options.get(LIMIT_KEY) {
        Some(limit) if limit == ctx.results_per_page => {}
        _ => {
            options.set(LIMIT_KEY, ctx.results_per_page);
            changed = true;
        }
    }

    if ctx.sort_mode == SortMode::Standard {
        // A table-known sortBy is attributed to an earlier rewrite of ours.
        let ours = options.get(SORT_BY_KEY).map(is_known_sort_by).unwrap_or(false);
        if ours {
            options.remove(SORT_BY_KEY);
            options.remove(SORT_ORDER_KEY);
            changed = true;
        }
    } else {
        let keys = ctx.sort_mode.keys();
        let sort_by = keys.sort_by.as_str();
        let sort_order = keys.sort_order.as_str();
        if options.get(SORT_BY_KEY) != Some(sort_by) || options.get(SORT_ORDER_KEY) != Some(sort_order) {
            options.set(SORT_BY_KEY, sort_by);
            options.set(SORT_ORDER_KEY, sort_order);
            changed = true;
        }
    }

    changed
}

// =============================================================================
// Public API
// =============================================================================

/// Corrected navigation URL, or `None` when the fragment already matches.
pub fn rewrite_navigation_url(url: &str, ctx: &RewriteContext<'_>) -> Option<String> {
    let parts = match UrlParts::split(url) {
        Ok(parts) => parts,
        Err(e) => {
            log::debug!("Cleanplaats: not rewriting unparsable URL: {}", e);
            return None;
        }
    };

    let mut options = HashOptions::parse(parts.fragment.unwrap_or(""));
    if !apply_policy(&mut options, ctx) {
        return None;
    }

    let rewritten = parts.with_fragment(&options.to_fragment());
    if rewritten == url {
        return None;
    }
    log::debug!("Cleanplaats: rewriting hash URL from {} to {}", url, rewritten);
    Some(rewritten)
}

/// Corrected API URL, or `None` when the query already matches.
pub fn rewrite_api_url(url: &str, ctx: &RewriteContext<'_>) -> Option<String> {
    let parts = match UrlParts::split(url) {
        Ok(parts) => parts,
        Err(e) => {
            log::debug!("Cleanplaats: not rewriting unparsable URL: {}", e);
            return None;
        }
    };

    let mut params = QueryParams::parse(parts.query.unwrap_or(""));
    if !apply_policy(&mut params, ctx) {
        return None;
    }

    let rewritten = parts.with_query(&params.to_query_string());
    if rewritten == url {
        return None;
    }
    log::debug!("Cleanplaats: rewriting API URL from {} to {}", url, rewritten);
    Some(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_LIMITS: [&str; 3] = ["30", "50", "100"];

    fn ctx(limit: &str, mode: SortMode) -> RewriteContext<'_> {
        RewriteContext::new(limit, mode)
    }

    #[test]
    fn test_price_low_high_example() {
        let out = rewrite_navigation_url(
            "https://www.marktplaats.nl/l/foo#limit:30",
            &ctx("50", SortMode::PriceLowHigh),
        );
        assert_eq!(
            out.as_deref(),
            Some("https://www.marktplaats.nl/l/foo#limit:50|sortBy:PRICE|sortOrder:INCREASING")
        );
    }

    #[test]
    fn test_default_settings_leave_default_urls_alone() {
        let c = ctx("30", SortMode::Standard);
        for url in [
            "https://www.marktplaats.nl/l/foo#limit:30",
            "https://www.marktplaats.nl/q/fiets/#limit:30|postcode:1234AB|distanceMeters:25000",
            "https://www.2dehands.be/l/auto-s/#limit:30|offset:30",
        ] {
            assert_eq!(rewrite_navigation_url(url, &c), None, "{}", url);
        }
        assert_eq!(
            rewrite_api_url("https://www.marktplaats.nl/lrp/api/search?limit=30&offset=0", &c),
            None
        );
    }

    #[test]
    fn test_missing_limit_with_default_setting() {
        let c = ctx("30", SortMode::Standard);
        assert_eq!(
            rewrite_navigation_url("https://www.marktplaats.nl/l/foo", &c).as_deref(),
            Some("https://www.marktplaats.nl/l/foo#limit:30")
        );
        assert_eq!(
            rewrite_navigation_url("https://www.marktplaats.nl/q/fiets/#postcode:1234AB", &c).as_deref(),
            Some("https://www.marktplaats.nl/q/fiets/#postcode:1234AB|limit:30")
        );
        assert_eq!(
            rewrite_api_url("https://www.marktplaats.nl/lrp/api/search?query=fiets", &c).as_deref(),
            Some("https://www.marktplaats.nl/lrp/api/search?query=fiets&limit=30")
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let urls = [
            "https://www.marktplaats.nl/l/foo",
            "https://www.marktplaats.nl/l/foo#limit:30",
            "https://www.marktplaats.nl/q/fiets/#sortBy:OPTIMIZED|sortOrder:DECREASING|postcode:1234AB",
            "https://www.2dehands.be/l/auto-s/?x=1#offset:30|bad|limit:100",
        ];
        for limit in ALL_LIMITS {
            for mode in SortMode::ALL {
                let c = ctx(limit, mode);
                for url in urls {
                    let once = rewrite_navigation_url(url, &c).unwrap_or_else(|| url.to_string());
                    assert_eq!(rewrite_navigation_url(&once, &c), None, "{} {} {}", limit, mode, url);
                }
            }
        }
    }

    #[test]
    fn test_api_rewrite_is_idempotent() {
        for limit in ALL_LIMITS {
            for mode in SortMode::ALL {
                let c = ctx(limit, mode);
                let url = "https://www.marktplaats.nl/lrp/api/search?l1CategoryId=91&limit=30&offset=0";
                let once = rewrite_api_url(url, &c).unwrap_or_else(|| url.to_string());
                assert_eq!(rewrite_api_url(&once, &c), None);
            }
        }
    }

    #[test]
    fn test_limit_mismatch_forces_rewrite() {
        let out = rewrite_navigation_url(
            "https://www.marktplaats.nl/l/foo#limit:50|postcode:1234AB",
            &ctx("100", SortMode::Standard),
        );
        assert_eq!(out.as_deref(), Some("https://www.marktplaats.nl/l/foo#limit:100|postcode:1234AB"));
    }

    #[test]
    fn test_missing_limit_with_non_default() {
        let out = rewrite_navigation_url("https://www.marktplaats.nl/l/foo", &ctx("50", SortMode::Standard));
        assert_eq!(out.as_deref(), Some("https://www.marktplaats.nl/l/foo#limit:50"));
    }

    #[test]
    fn test_standard_strips_known_sort() {
        let out = rewrite_navigation_url(
            "https://www.marktplaats.nl/l/foo#limit:30|sortBy:PRICE|sortOrder:INCREASING",
            &ctx("30", SortMode::Standard),
        );
        assert_eq!(out.as_deref(), Some("https://www.marktplaats.nl/l/foo#limit:30"));
    }

    #[test]
    fn test_standard_keeps_unknown_sort() {
        let url = "https://www.marktplaats.nl/l/foo#limit:30|sortBy:RELEVANCE|sortOrder:DECREASING";
        assert_eq!(rewrite_navigation_url(url, &ctx("30", SortMode::Standard)), None);
    }

    #[test]
    fn test_sort_mismatch_forces_rewrite() {
        let out = rewrite_navigation_url(
            "https://www.marktplaats.nl/l/foo#limit:30|sortBy:PRICE|sortOrder:DECREASING",
            &ctx("30", SortMode::PriceLowHigh),
        );
        assert_eq!(
            out.as_deref(),
            Some("https://www.marktplaats.nl/l/foo#limit:30|sortBy:PRICE|sortOrder:INCREASING")
        );
    }

    #[test]
    fn test_api_rewrite() {
        let out = rewrite_api_url(
            "https://www.marktplaats.nl/lrp/api/search?query=fiets&limit=30",
            &ctx("100", SortMode::DateNewOld),
        );
        assert_eq!(
            out.as_deref(),
            Some("https://www.marktplaats.nl/lrp/api/search?query=fiets&limit=100&sortBy=SORT_INDEX&sortOrder=DECREASING")
        );
    }

    #[test]
    fn test_malformed_fragment_is_not_fatal() {
        let out = rewrite_navigation_url(
            "https://www.marktplaats.nl/l/foo#:::|limit|postcode:1234AB",
            &ctx("50", SortMode::Standard),
        );
        assert_eq!(out.as_deref(), Some("https://www.marktplaats.nl/l/foo#postcode:1234AB|limit:50"));
    }

    #[test]
    fn test_input_is_not_mutated_and_unparsable_is_ignored() {
        let url = String::from("https://www.marktplaats.nl/l/foo");
        let _ = rewrite_navigation_url(&url, &ctx("50", SortMode::Distance));
        assert_eq!(url, "https://www.marktplaats.nl/l/foo");
        assert_eq!(rewrite_navigation_url("/l/foo#limit:30", &ctx("50", SortMode::Distance)), None);
    }

    #[test]
    fn test_context_from_settings() {
        let mut settings = Settings::default();
        settings.set_results_per_page("50");
        settings.default_sort_mode = SortMode::Distance;
        let c = RewriteContext::from(&settings);
        assert_eq!(c.results_per_page, "50");
        assert_eq!(c.sort_mode, SortMode::Distance);
    }
}
