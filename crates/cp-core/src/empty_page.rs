//! Empty-page check
//!
//! After a pass that follows a navigation or a settings change, tell the user
//! when removing ads left the page empty or nearly so.

use crate::dom::Document;
use crate::marker;
use crate::selectors;

/// Delay between the triggering pass and the check.
pub const CHECK_DELAY_MS: u32 = 1000;

/// Fewer visible listings than this produces a notice.
pub const FEW_RESULTS_THRESHOLD: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmptyPageReport {
    pub total: usize,
    pub hidden: usize,
}

impl EmptyPageReport {
    pub fn from_document<D: Document>(doc: &D) -> Self {
        let listings = doc.query_selector_all(selectors::LISTING).unwrap_or_default();
        let hidden = listings.iter().filter(|l| marker::is_hidden(*l)).count();
        Self { total: listings.len(), hidden }
    }

    pub fn visible(&self) -> usize {
        self.total - self.hidden
    }

    /// Notice text to show, in Dutch as on the site. `None` when nothing was
    /// hidden or enough results remain.
    pub fn notice(&self) -> Option<String> {
        if self.hidden == 0 {
            return None;
        }
        let visible = self.visible();
        if visible == 0 {
            return Some(
                "De pagina is leeg omdat deze helemaal uit advertenties bestond! \
                 Probeer een volgende pagina of wijzig de filters."
                    .to_string(),
            );
        }
        if visible >= FEW_RESULTS_THRESHOLD {
            return None;
        }
        let (verb, results) = if visible == 1 { ("is", "resultaat") } else { ("zijn", "resultaten") };
        let ads = if self.hidden == 1 { "advertentie" } else { "advertenties" };
        Some(format!(
            "Er {} nog {} {} over nadat Cleanplaats {} {} heeft verwijderd.",
            verb, visible, results, self.hidden, ads
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemDocument;
    use crate::types::HideReason;

    #[test]
    fn test_counts_from_document() {
        let doc = MemDocument::new();
        for i in 0..4 {
            let li = doc.body().child("li").attr("class", "hz-Listing");
            if i < 3 {
                marker::hide(&li, HideReason::TopAd).unwrap();
            }
        }
        let report = EmptyPageReport::from_document(&doc);
        assert_eq!(report, EmptyPageReport { total: 4, hidden: 3 });
        assert_eq!(
            report.notice().as_deref(),
            Some("Er is nog 1 resultaat over nadat Cleanplaats 3 advertenties heeft verwijderd.")
        );
    }

    #[test]
    fn test_notice_thresholds() {
        assert_eq!(EmptyPageReport { total: 30, hidden: 0 }.notice(), None);
        assert_eq!(EmptyPageReport { total: 30, hidden: 25 }.notice(), None);
        assert!(EmptyPageReport { total: 3, hidden: 3 }.notice().unwrap().starts_with("De pagina is leeg"));
        assert_eq!(
            EmptyPageReport { total: 5, hidden: 1 }.notice().as_deref(),
            Some("Er zijn nog 4 resultaten over nadat Cleanplaats 1 advertentie heeft verwijderd.")
        );
    }
}
