//! Minimal CSS selector engine for the in-memory DOM
//!
//! Supports what the selector contract uses: selector lists, the descendant
//! combinator, type/class/id selectors and attribute selectors with
//! presence, `=`, `*=`, `^=` and `$=`.

use crate::error::DomError;

/// Node access needed for matching.
pub trait SelectorSubject: Sized {
    fn local_name(&self) -> String;
    fn attribute(&self, name: &str) -> Option<String>;
    fn parent_element(&self) -> Option<Self>;
}

/// Comma-separated selectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    pub selectors: Vec<Selector>,
}

/// Compound selectors joined by descendant combinators, outermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub compounds: Vec<Compound>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    pub tag: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub op: AttributeOp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeOp {
    Exists,
    Equals(String),
    Contains(String),
    Prefix(String),
    Suffix(String),
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.ids.is_empty() && self.classes.is_empty() && self.attributes.is_empty()
    }

    fn matches<S: SelectorSubject>(&self, subject: &S) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && !subject.local_name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if !self.ids.is_empty() {
            let id = subject.attribute("id").unwrap_or_default();
            if self.ids.iter().any(|want| *want != id) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = subject.attribute("class").unwrap_or_default();
            let classes: Vec<&str> = class_attr.split_whitespace().collect();
            if self.classes.iter().any(|want| !classes.contains(&want.as_str())) {
                return false;
            }
        }
        self.attributes.iter().all(|attr| {
            let Some(value) = subject.attribute(&attr.name) else {
                return false;
            };
            match &attr.op {
                AttributeOp::Exists => true,
                AttributeOp::Equals(v) => value == *v,
                AttributeOp::Contains(v) => !v.is_empty() && value.contains(v.as_str()),
                AttributeOp::Prefix(v) => !v.is_empty() && value.starts_with(v.as_str()),
                AttributeOp::Suffix(v) => !v.is_empty() && value.ends_with(v.as_str()),
            }
        })
    }
}

impl Selector {
    fn matches<S: SelectorSubject>(&self, subject: &S) -> bool {
        let Some((last, ancestors)) = self.compounds.split_last() else {
            return false;
        };
        if !last.matches(subject) {
            return false;
        }
        let mut current = subject.parent_element();
        for compound in ancestors.iter().rev() {
            loop {
                let Some(node) = current else {
                    return false;
                };
                current = node.parent_element();
                if compound.matches(&node) {
                    break;
                }
            }
        }
        true
    }
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let mut selectors = Vec::new();
        for part in split_top_level(input, ',') {
            selectors.push(parse_selector(part.trim(), input)?);
        }
        if selectors.is_empty() {
            return Err(DomError::InvalidSelector(input.to_string()));
        }
        Ok(Self { selectors })
    }

    pub fn matches<S: SelectorSubject>(&self, subject: &S) -> bool {
        self.selectors.iter().any(|s| s.matches(subject))
    }
}

fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_selector(text: &str, original: &str) -> Result<Selector, DomError> {
    let invalid = || DomError::InvalidSelector(original.to_string());
    let chars: Vec<char> = text.chars().collect();
    let mut compounds = Vec::new();
    let mut current = Compound::default();
    let mut i = 0;

    let read_ident = |i: &mut usize| -> String {
        let start = *i;
        while *i < chars.len() && is_ident_char(chars[*i]) {
            *i += 1;
        }
        chars[start..*i].iter().collect()
    };

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            if !current.is_empty() {
                compounds.push(std::mem::take(&mut current));
            }
            i += 1;
            continue;
        }
        match c {
            '.' => {
                i += 1;
                let ident = read_ident(&mut i);
                if ident.is_empty() {
                    return Err(invalid());
                }
                current.classes.push(ident);
            }
            '#' => {
                i += 1;
                let ident = read_ident(&mut i);
                if ident.is_empty() {
                    return Err(invalid());
                }
                current.ids.push(ident);
            }
            '[' => {
                let close = chars[i..].iter().position(|&c| c == ']').ok_or_else(invalid)?;
                let inner: String = chars[i + 1..i + close].iter().collect();
                current.attributes.push(parse_attribute(&inner).ok_or_else(invalid)?);
                i += close + 1;
            }
            '*' => {
                current.tag = Some("*".to_string());
                i += 1;
            }
            c if is_ident_char(c) => {
                if current.tag.is_some() {
                    return Err(invalid());
                }
                current.tag = Some(read_ident(&mut i).to_ascii_lowercase());
            }
            _ => return Err(invalid()),
        }
    }
    if !current.is_empty() {
        compounds.push(current);
    }
    if compounds.is_empty() {
        return Err(invalid());
    }
    Ok(Selector { compounds })
}

fn parse_attribute(inner: &str) -> Option<AttributeSelector> {
    let inner = inner.trim();
    let name_end = inner.find(|c: char| !is_ident_char(c)).unwrap_or(inner.len());
    let name = &inner[..name_end];
    if name.is_empty() {
        return None;
    }
    let rest = inner[name_end..].trim_start();
    if rest.is_empty() {
        return Some(AttributeSelector { name: name.to_string(), op: AttributeOp::Exists });
    }

    let (kind, value) = if let Some(v) = rest.strip_prefix("*=") {
        ('*', v)
    } else if let Some(v) = rest.strip_prefix("^=") {
        ('^', v)
    } else if let Some(v) = rest.strip_prefix("$=") {
        ('$', v)
    } else if let Some(v) = rest.strip_prefix('=') {
        ('=', v)
    } else {
        return None;
    };

    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
        .to_string();

    let op = match kind {
        '*' => AttributeOp::Contains(value),
        '^' => AttributeOp::Prefix(value),
        '$' => AttributeOp::Suffix(value),
        _ => AttributeOp::Equals(value),
    };

    Some(AttributeSelector { name: name.to_string(), op })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_contract_selectors() {
        for s in crate::selectors::AD_ELEMENTS {
            SelectorList::parse(s).unwrap();
        }
        for s in crate::selectors::OPVAL_STICKERS {
            SelectorList::parse(s).unwrap();
        }
        let list = SelectorList::parse(crate::selectors::SELLER_NAME).unwrap();
        assert_eq!(list.selectors.len(), 2);
    }

    #[test]
    fn test_parse_shapes() {
        let list = SelectorList::parse(".hz-Listing-priority span").unwrap();
        let compounds = &list.selectors[0].compounds;
        assert_eq!(compounds.len(), 2);
        assert_eq!(compounds[0].classes, vec!["hz-Listing-priority"]);
        assert_eq!(compounds[1].tag.as_deref(), Some("span"));

        let list = SelectorList::parse("[title=\"3rd party ad content\"]").unwrap();
        assert_eq!(
            list.selectors[0].compounds[0].attributes[0].op,
            AttributeOp::Equals("3rd party ad content".to_string())
        );

        let list = SelectorList::parse(".i_.div").unwrap();
        assert_eq!(list.selectors[0].compounds[0].classes, vec!["i_", "div"]);
    }

    #[test]
    fn test_invalid() {
        assert!(SelectorList::parse("").is_err());
        assert!(SelectorList::parse("[unterminated").is_err());
        assert!(SelectorList::parse("div > p").is_err());
    }
}
