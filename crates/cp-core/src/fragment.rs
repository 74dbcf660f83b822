//! Marketplace fragment options
//!
//! Result pages carry their search options in the URL fragment as
//! `#key:value|key:value`, e.g. `#distanceMeters:75000|postcode:1234AB`.

/// Ordered fragment options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashOptions {
    entries: Vec<(String, String)>,
}

impl HashOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a fragment, with or without its leading `#`.
    ///
    /// Segments that do not split into exactly one key and one value are
    /// skipped. A repeated key keeps its first position and last value.
    pub fn parse(fragment: &str) -> Self {
        let body = fragment.strip_prefix('#').unwrap_or(fragment);
        let mut options = Self::new();
        if body.is_empty() {
            return options;
        }

        for segment in body.split('|') {
            let mut parts = segment.split(':');
            let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                continue;
            };
            options.set(key, value);
        }

        options
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Set a key, replacing in place or appending.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    /// Remove a key. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize including the leading `#`.
    ///
    /// Entries with empty or whitespace-only values are dropped; if nothing
    /// remains the result is the empty string (no fragment at all).
    pub fn to_fragment(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            if value.trim().is_empty() {
                continue;
            }
            out.push(if out.is_empty() { '#' } else { '|' });
            out.push_str(key);
            out.push(':');
            out.push_str(value);
        }
        out
    }
}
