//! In-memory DOM for tests
//!
//! An arena of element nodes shared through `Rc<RefCell<_>>`. Text is held
//! per element and `text_content` concatenates the subtree in order.

use std::cell::RefCell;
use std::rc::Rc;

use super::selector::{SelectorList, SelectorSubject};
use super::{Document, Element};
use crate::error::DomError;

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: Vec<NodeData>,
}

impl Tree {
    fn attribute(&self, id: usize, name: &str) -> Option<String> {
        self.nodes[id]
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn descendants(&self, id: usize, out: &mut Vec<usize>) {
        for &child in &self.nodes[id].children {
            out.push(child);
            self.descendants(child, out);
        }
    }

    fn text_content(&self, id: usize, out: &mut String) {
        out.push_str(&self.nodes[id].text);
        for &child in &self.nodes[id].children {
            self.text_content(child, out);
        }
    }
}

/// Document whose root element is `<html>` with a `<body>` child.
#[derive(Debug, Clone)]
pub struct MemDocument {
    tree: Rc<RefCell<Tree>>,
}

/// Handle to a node in a [`MemDocument`].
#[derive(Debug, Clone)]
pub struct MemElement {
    tree: Rc<RefCell<Tree>>,
    id: usize,
}

impl PartialEq for MemElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree) && self.id == other.id
    }
}

const ROOT: usize = 0;
const BODY: usize = 1;

impl MemDocument {
    pub fn new() -> Self {
        let mut tree = Tree::default();
        tree.nodes.push(NodeData { tag: "html".to_string(), children: vec![BODY], ..Default::default() });
        tree.nodes.push(NodeData { tag: "body".to_string(), parent: Some(ROOT), ..Default::default() });
        Self { tree: Rc::new(RefCell::new(tree)) }
    }

    pub fn body(&self) -> MemElement {
        MemElement { tree: self.tree.clone(), id: BODY }
    }

    fn root(&self) -> MemElement {
        MemElement { tree: self.tree.clone(), id: ROOT }
    }
}

impl Document for MemDocument {
    type Element = MemElement;

    fn query_selector_all(&self, selector: &str) -> Result<Vec<MemElement>, DomError> {
        let root = self.root();
        let list = SelectorList::parse(selector)?;
        let mut matches = Vec::new();
        if list.matches(&root) {
            matches.push(root.clone());
        }
        matches.extend(root.query_selector_all(selector)?);
        Ok(matches)
    }
}

impl MemElement {
    /// Append a new child element and return it.
    pub fn child(&self, tag: &str) -> MemElement {
        let mut tree = self.tree.borrow_mut();
        let id = tree.nodes.len();
        tree.nodes.push(NodeData { tag: tag.to_string(), parent: Some(self.id), ..Default::default() });
        tree.nodes[self.id].children.push(id);
        MemElement { tree: self.tree.clone(), id }
    }

    /// Set an attribute, builder style.
    pub fn attr(self, name: &str, value: &str) -> Self {
        let _ = Element::set_attribute(&self, name, value);
        self
    }

    /// Set the element's own text, builder style.
    pub fn text(self, text: &str) -> Self {
        self.tree.borrow_mut().nodes[self.id].text = text.to_string();
        self
    }

    fn parent(&self) -> Option<MemElement> {
        let parent = self.tree.borrow().nodes[self.id].parent?;
        Some(MemElement { tree: self.tree.clone(), id: parent })
    }
}

impl SelectorSubject for MemElement {
    fn local_name(&self) -> String {
        self.tree.borrow().nodes[self.id].tag.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.tree.borrow().attribute(self.id, name)
    }

    fn parent_element(&self) -> Option<Self> {
        self.parent()
    }
}

impl Element for MemElement {
    fn query_selector(&self, selector: &str) -> Result<Option<Self>, DomError> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<Self>, DomError> {
        let list = SelectorList::parse(selector)?;
        let mut ids = Vec::new();
        self.tree.borrow().descendants(self.id, &mut ids);
        Ok(ids
            .into_iter()
            .map(|id| MemElement { tree: self.tree.clone(), id })
            .filter(|el| list.matches(el))
            .collect())
    }

    fn closest(&self, selector: &str) -> Result<Option<Self>, DomError> {
        let list = SelectorList::parse(selector)?;
        let mut current = Some(self.clone());
        while let Some(el) = current {
            if list.matches(&el) {
                return Ok(Some(el));
            }
            current = el.parent();
        }
        Ok(None)
    }

    fn tag_name(&self) -> String {
        self.local_name().to_ascii_uppercase()
    }

    fn id(&self) -> String {
        self.attribute("id").unwrap_or_default()
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        self.tree.borrow().text_content(self.id, &mut out);
        out
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        self.attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        let attributes = &mut tree.nodes[self.id].attributes;
        match attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn remove_attribute(&self, name: &str) -> Result<(), DomError> {
        self.tree.borrow_mut().nodes[self.id].attributes.retain(|(k, _)| k != name);
        Ok(())
    }

    fn style_text(&self) -> String {
        self.attribute("style").unwrap_or_default()
    }

    fn set_style_text(&self, css: &str) -> Result<(), DomError> {
        if css.is_empty() {
            self.remove_attribute("style")
        } else {
            self.set_attribute("style", css)
        }
    }

    fn force_hidden(&self) -> Result<(), DomError> {
        let current = self.style_text();
        let current = current.trim().trim_end_matches(';');
        let css = if current.is_empty() {
            "display: none !important;".to_string()
        } else {
            format!("{}; display: none !important;", current)
        };
        self.set_attribute("style", &css)
    }

    fn is_connected(&self) -> bool {
        let mut current = self.id;
        loop {
            if current == ROOT {
                return true;
            }
            match self.tree.borrow().nodes[current].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn remove(&self) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        let Some(parent) = tree.nodes[self.id].parent.take() else {
            return Err(DomError::Detached);
        };
        tree.nodes[parent].children.retain(|&c| c != self.id);
        Ok(())
    }
}

impl MemElement {
    /// Whether the element currently carries `display: none`.
    pub fn is_display_none(&self) -> bool {
        self.style_text().contains("display: none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_and_closest() {
        let doc = MemDocument::new();
        let listing = doc.body().child("li").attr("class", "hz-Listing hz-Listing--list");
        let span = listing.child("div").attr("class", "hz-Listing-priority").child("span").text("Dagtopper");

        let found = doc.query_selector_all(".hz-Listing-priority span").unwrap();
        assert_eq!(found, vec![span.clone()]);
        assert_eq!(span.closest(".hz-Listing").unwrap(), Some(listing.clone()));
        assert_eq!(listing.text_content(), "Dagtopper");
        assert!(listing.has_class("hz-Listing"));
    }

    #[test]
    fn test_attribute_operators() {
        let doc = MemDocument::new();
        let a = doc.body().child("div").attr("id", "google_ads_iframe_123");
        let b = doc.body().child("iframe").attr("src", "https://googleads.g.doubleclick.net/x");
        assert_eq!(doc.query_selector_all("div[id^=\"google_ads_iframe\"]").unwrap(), vec![a]);
        assert_eq!(doc.query_selector_all("iframe[src*=\"doubleclick\"]").unwrap(), vec![b]);
    }

    #[test]
    fn test_remove_detaches_subtree() {
        let doc = MemDocument::new();
        let outer = doc.body().child("li").attr("class", "bannerContainerLoading");
        let inner = outer.child("div").attr("class", "hz-Banner");
        outer.remove().unwrap();
        assert!(!outer.is_connected());
        assert!(!inner.is_connected());
        assert!(doc.query_selector_all(".hz-Banner").unwrap().is_empty());
        assert_eq!(outer.remove(), Err(DomError::Detached));
    }

    #[test]
    fn test_style_round_trip() {
        let doc = MemDocument::new();
        let el = doc.body().child("div").attr("style", "color: red");
        el.force_hidden().unwrap();
        assert_eq!(el.style_text(), "color: red; display: none !important;");
        el.set_style_text("color: red").unwrap();
        assert!(!el.is_display_none());
    }
}
