//! Arrow-key navigation for the listing photo carousel

use crate::dom::Document;
use crate::selectors;

/// Direction an arrow key moves the carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselStep {
    Next,
    Previous,
}

impl CarouselStep {
    /// Map a `KeyboardEvent.key` to a step. Keys typed into form fields are
    /// left to the field.
    pub fn from_key(key: &str, target_tag: &str) -> Option<Self> {
        if matches!(target_tag.to_ascii_uppercase().as_str(), "INPUT" | "TEXTAREA" | "SELECT") {
            return None;
        }
        match key {
            "ArrowRight" => Some(Self::Next),
            "ArrowLeft" => Some(Self::Previous),
            _ => None,
        }
    }

    fn selector(self) -> &'static str {
        match self {
            Self::Next => selectors::CAROUSEL_NEXT,
            Self::Previous => selectors::CAROUSEL_PREVIOUS,
        }
    }

    /// The carousel button to press, if the page shows a carousel.
    pub fn button<D: Document>(self, doc: &D) -> Option<D::Element> {
        doc.query_selector(self.selector()).ok().flatten()
    }
}
