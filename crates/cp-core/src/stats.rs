//! Removal counters for the current page view
//!
//! Counters accumulate across incremental passes and are reset only when the
//! settings are re-applied in full.

use serde::Serialize;

use crate::types::HideReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub top_ads: u32,
    pub dagtoppers: u32,
    pub promoted_listings: u32,
    pub opval_stickers: u32,
    pub other_ads: u32,
}

impl Stats {
    pub fn total(&self) -> u32 {
        self.top_ads + self.dagtoppers + self.promoted_listings + self.opval_stickers + self.other_ads
    }

    /// Add newly hidden listings for a reason. Blacklist reasons have no counter.
    pub fn record_hidden(&mut self, reason: HideReason, count: u32) {
        match reason {
            HideReason::TopAd => self.top_ads += count,
            HideReason::Dagtopper => self.dagtoppers += count,
            HideReason::Promoted => self.promoted_listings += count,
            HideReason::OpvalSticker => self.opval_stickers += count,
            HideReason::BlacklistedSeller | HideReason::BlacklistedTerm => {}
        }
    }

    pub fn record_removed_ads(&mut self, count: u32) {
        self.other_ads += count;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
