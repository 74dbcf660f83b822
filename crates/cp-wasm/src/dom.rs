//! `web_sys` implementation of the core DOM traits

use cp_core::dom::{Document, Element};
use cp_core::error::DomError;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, NodeList};

#[derive(Debug, Clone, PartialEq)]
pub struct WebElement(pub web_sys::Element);

#[derive(Debug, Clone)]
pub struct WebDocument(pub web_sys::Document);

fn selector_error(selector: &str) -> DomError {
    DomError::InvalidSelector(selector.to_string())
}

fn operation_error(err: JsValue) -> DomError {
    DomError::Operation(format!("{:?}", err))
}

fn collect(list: NodeList) -> Vec<WebElement> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
        .map(WebElement)
        .collect()
}

impl WebElement {
    fn html(&self) -> Option<&HtmlElement> {
        self.0.dyn_ref::<HtmlElement>()
    }
}

impl Element for WebElement {
    fn query_selector(&self, selector: &str) -> Result<Option<Self>, DomError> {
        self.0
            .query_selector(selector)
            .map(|found| found.map(WebElement))
            .map_err(|_| selector_error(selector))
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<Self>, DomError> {
        self.0
            .query_selector_all(selector)
            .map(collect)
            .map_err(|_| selector_error(selector))
    }

    fn closest(&self, selector: &str) -> Result<Option<Self>, DomError> {
        self.0
            .closest(selector)
            .map(|found| found.map(WebElement))
            .map_err(|_| selector_error(selector))
    }

    fn tag_name(&self) -> String {
        self.0.tag_name()
    }

    fn id(&self) -> String {
        self.0.id()
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn text_content(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        self.0.set_attribute(name, value).map_err(operation_error)
    }

    fn remove_attribute(&self, name: &str) -> Result<(), DomError> {
        self.0.remove_attribute(name).map_err(operation_error)
    }

    fn style_text(&self) -> String {
        match self.html() {
            Some(html) => html.style().css_text(),
            None => self.0.get_attribute("style").unwrap_or_default(),
        }
    }

    fn set_style_text(&self, css: &str) -> Result<(), DomError> {
        match self.html() {
            Some(html) => {
                html.style().set_css_text(css);
                Ok(())
            }
            None => self.set_attribute("style", css),
        }
    }

    fn force_hidden(&self) -> Result<(), DomError> {
        match self.html() {
            Some(html) => html
                .style()
                .set_property_with_priority("display", "none", "important")
                .map_err(operation_error),
            None => {
                let css = format!("{};display:none !important", self.style_text());
                self.set_attribute("style", &css)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.0.is_connected()
    }

    fn remove(&self) -> Result<(), DomError> {
        if !self.0.is_connected() {
            return Err(DomError::Detached);
        }
        self.0.remove();
        Ok(())
    }
}

impl Document for WebDocument {
    type Element = WebElement;

    fn query_selector_all(&self, selector: &str) -> Result<Vec<WebElement>, DomError> {
        self.0
            .query_selector_all(selector)
            .map(collect)
            .map_err(|_| selector_error(selector))
    }

    fn query_selector(&self, selector: &str) -> Result<Option<WebElement>, DomError> {
        self.0
            .query_selector(selector)
            .map(|found| found.map(WebElement))
            .map_err(|_| selector_error(selector))
    }
}
