//! Navigation Watcher
//!
//! Turns `webNavigation` signals into tab URL corrections. The watcher holds
//! no settings of its own; the caller passes the current cached copy on every
//! signal, which is why settings must be loaded before listeners register.

use std::collections::HashMap;

use crate::rewrite::{rewrite_navigation_url, RewriteContext};
use crate::rule::TARGET_HOSTS;
use crate::settings::Settings;
use crate::url::{extract_host, extract_path};

/// Result-page path prefixes that carry fragment options.
pub const RESULT_PATH_PREFIXES: [&str; 2] = ["/l/", "/q/"];

/// Delay before the deferred reload that follows an untyped navigation.
pub const RELOAD_DELAY_MS: u32 = 500;

/// Which listener delivered the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// `onBeforeNavigate`: a full page load
    BeforeNavigate,
    /// `onHistoryStateUpdated`: an in-page history update
    HistoryStateUpdated,
}

/// Fields of a navigation signal we use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationDetails {
    pub url: String,
    pub tab_id: i32,
    pub frame_id: i32,
    pub parent_frame_id: i32,
    /// Absent on some reload paths.
    pub transition_type: Option<String>,
}

impl NavigationDetails {
    #[inline]
    pub fn is_top_level(&self) -> bool {
        self.frame_id == 0 && self.parent_frame_id == -1
    }
}

/// A reload to run after [`RELOAD_DELAY_MS`] if still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredReload {
    pub tab_id: i32,
    pub generation: u64,
    pub delay_ms: u32,
}

/// What to do about one signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    Ignore,
    Redirect {
        tab_id: i32,
        url: String,
        reload: Option<DeferredReload>,
    },
}

#[derive(Debug, Clone)]
struct PendingReload {
    generation: u64,
    target: String,
}

/// Tracks per-tab pending reloads and decides on URL corrections.
#[derive(Debug, Default)]
pub struct NavigationWatcher {
    generation: u64,
    pending: HashMap<i32, PendingReload>,
}

impl NavigationWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the URL is a result page on one of our hosts.
    pub fn is_watched_url(url: &str) -> bool {
        let Some(host) = extract_host(url) else {
            return false;
        };
        if !TARGET_HOSTS.iter().any(|h| h.eq_ignore_ascii_case(host)) {
            return false;
        }
        let path = extract_path(url);
        RESULT_PATH_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
    }

    /// Decide on a signal using the current settings.
    ///
    /// A signal for a different URL supersedes the tab's pending reload. The
    /// navigation our own redirect produces arrives with the target URL and
    /// leaves the reload in place.
    pub fn on_navigation(
        &mut self,
        kind: NavigationKind,
        details: &NavigationDetails,
        settings: &Settings,
    ) -> NavigationDecision {
        if !details.is_top_level() || !Self::is_watched_url(&details.url) {
            return NavigationDecision::Ignore;
        }

        if self
            .pending
            .get(&details.tab_id)
            .is_some_and(|pending| pending.target != details.url)
        {
            self.pending.remove(&details.tab_id);
        }

        let ctx = RewriteContext::from(settings);
        let Some(url) = rewrite_navigation_url(&details.url, &ctx) else {
            return NavigationDecision::Ignore;
        };

        log::debug!(
            "Cleanplaats: {:?} on tab {} rewritten to {}",
            kind,
            details.tab_id,
            url
        );

        let reload = if details.transition_type.is_none() {
            self.generation += 1;
            self.pending.insert(
                details.tab_id,
                PendingReload { generation: self.generation, target: url.clone() },
            );
            Some(DeferredReload {
                tab_id: details.tab_id,
                generation: self.generation,
                delay_ms: RELOAD_DELAY_MS,
            })
        } else {
            None
        };

        NavigationDecision::Redirect { tab_id: details.tab_id, url, reload }
    }

    /// Check a deferred reload at fire time.
    ///
    /// `current_url` is the tab's URL now, or `None` if the tab is gone.
    /// Returns `true` only if no newer signal superseded the reload and the
    /// tab still shows the rewritten target. The pending entry is consumed
    /// either way.
    pub fn take_reload(&mut self, reload: &DeferredReload, current_url: Option<&str>) -> bool {
        let Some(pending) = self.pending.get(&reload.tab_id) else {
            return false;
        };
        if pending.generation != reload.generation {
            return false;
        }
        let Some(pending) = self.pending.remove(&reload.tab_id) else {
            return false;
        };
        match current_url {
            Some(url) if url == pending.target => true,
            Some(_) => {
                log::debug!("Cleanplaats: tab {} moved on, skipping reload", reload.tab_id);
                false
            }
            None => false,
        }
    }

    /// Drop state for a closed tab.
    pub fn forget_tab(&mut self, tab_id: i32) {
        self.pending.remove(&tab_id);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
