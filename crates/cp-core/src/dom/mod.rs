//! DOM abstraction
//!
//! The classifier and coordinator are written against these traits. The wasm
//! crate implements them over `web_sys`; tests use the in-memory tree in
//! [`memory`].
//!
//! Element handles are cheap clones referring to live nodes, so every
//! operation takes `&self`.

use crate::error::DomError;

#[cfg(test)]
pub(crate) mod memory;
#[cfg(test)]
pub(crate) mod selector;

/// A live element of the host page.
pub trait Element: Clone {
    /// First descendant matching `selector`.
    fn query_selector(&self, selector: &str) -> Result<Option<Self>, DomError>;

    /// All descendants matching `selector`, in document order.
    fn query_selector_all(&self, selector: &str) -> Result<Vec<Self>, DomError>;

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, selector: &str) -> Result<Option<Self>, DomError>;

    fn tag_name(&self) -> String;
    fn id(&self) -> String;
    fn has_class(&self, class: &str) -> bool;
    fn text_content(&self) -> String;

    fn get_attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError>;
    fn remove_attribute(&self, name: &str) -> Result<(), DomError>;

    fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// The inline style as CSS text.
    fn style_text(&self) -> String;
    /// Replace the inline style.
    fn set_style_text(&self, css: &str) -> Result<(), DomError>;
    /// Force `display: none !important` on top of the inline style.
    fn force_hidden(&self) -> Result<(), DomError>;

    /// Whether the node is still attached to the document.
    fn is_connected(&self) -> bool;
    /// Detach the node from its parent.
    fn remove(&self) -> Result<(), DomError>;
}

/// The host page document.
pub trait Document {
    type Element: Element;

    fn query_selector_all(&self, selector: &str) -> Result<Vec<Self::Element>, DomError>;

    fn query_selector(&self, selector: &str) -> Result<Option<Self::Element>, DomError> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// Whether any element matches one of `selectors`.
    fn any_matches(&self, selectors: &[&str]) -> bool {
        selectors
            .iter()
            .any(|s| matches!(self.query_selector(s), Ok(Some(_))))
    }
}

/// Trimmed text of an element.
pub fn trimmed_text<E: Element>(element: &E) -> String {
    element.text_content().trim().to_string()
}
