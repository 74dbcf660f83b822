//! Hidden-state markers
//!
//! A hidden listing carries two attributes:
//!
//! - `data-cleanplaats-hidden`: the [`HideReason`] it was hidden for. Present
//!   if and only if this extension hid the element.
//! - `data-original-style`: the inline style captured right before hiding,
//!   so restoring never loses a style the page set itself.
//!
//! Both attributes are written and cleared together.

use crate::dom::Element;
use crate::error::DomError;
use crate::types::HideReason;

pub const HIDDEN_ATTR: &str = "data-cleanplaats-hidden";
pub const ORIGINAL_STYLE_ATTR: &str = "data-original-style";

/// Selector for every element hidden by this extension.
pub const HIDDEN_SELECTOR: &str = "[data-cleanplaats-hidden]";

/// Hide `element` for `reason`.
///
/// Returns `Ok(false)` when the element was already hidden, whatever the
/// reason, so a listing is counted once.
pub fn hide<E: Element>(element: &E, reason: HideReason) -> Result<bool, DomError> {
    if element.has_attribute(HIDDEN_ATTR) {
        return Ok(false);
    }
    element.set_attribute(ORIGINAL_STYLE_ATTR, &element.style_text())?;
    element.set_attribute(HIDDEN_ATTR, reason.as_str())?;
    element.force_hidden()?;
    Ok(true)
}

/// Undo [`hide`]. Returns `Ok(false)` when the element was not hidden.
pub fn restore<E: Element>(element: &E) -> Result<bool, DomError> {
    if !element.has_attribute(HIDDEN_ATTR) {
        return Ok(false);
    }
    let original = element.get_attribute(ORIGINAL_STYLE_ATTR).unwrap_or_default();
    element.set_style_text(&original)?;
    element.remove_attribute(ORIGINAL_STYLE_ATTR)?;
    element.remove_attribute(HIDDEN_ATTR)?;
    Ok(true)
}

/// Reason an element was hidden for, if any.
///
/// An unrecognised marker value still counts as hidden; it is reported as
/// `None` here and restored like any other.
pub fn hidden_reason<E: Element>(element: &E) -> Option<HideReason> {
    element.get_attribute(HIDDEN_ATTR).and_then(|v| HideReason::parse(&v))
}

pub fn is_hidden<E: Element>(element: &E) -> bool {
    element.has_attribute(HIDDEN_ATTR)
}
