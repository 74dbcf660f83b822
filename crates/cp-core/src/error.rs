//! Error types
//!
//! Nothing in this crate is fatal: callers log these and fall back to
//! defaults or skip the current cycle.

/// Failure to read a persisted record.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Malformed settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Settings record is not an object")]
    NotAnObject,
}

/// The rule table refused an update.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("Invalid rule id: {0}")]
    InvalidId(u32),
    #[error("Rule {0} has an empty url filter")]
    EmptyFilter(u32),
    #[error("Rule {id} sets parameter '{key}' to an empty value")]
    EmptyParam { id: u32, key: String },
    #[error("Rule {0} already exists")]
    DuplicateId(u32),
    #[error("Platform rejected rule update: {0}")]
    Rejected(String),
}

/// A DOM operation failed on a single element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
    #[error("Element is detached from the document")]
    Detached,
    #[error("DOM operation failed: {0}")]
    Operation(String),
}

/// A URL could not be split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("URL has no scheme: {0}")]
    MissingScheme(String),
    #[error("URL has no host: {0}")]
    MissingHost(String),
}
