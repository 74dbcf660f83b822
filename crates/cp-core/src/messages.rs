//! Content-to-background message protocol
//!
//! Requests are `{ "action": "keepAlive" | "forceRefresh" }`. Both actions
//! make the background side re-read settings and re-sync its rule; the reply
//! echoes the rewrite settings it ended up with.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::settings::Settings;
use crate::types::SortMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    KeepAlive,
    ForceRefresh,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeepAlive => "keepAlive",
            Self::ForceRefresh => "forceRefresh",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub action: Action,
}

impl Request {
    pub fn new(action: Action) -> Self {
        Self { action }
    }

    /// Parse an incoming message. Unknown actions and foreign shapes yield
    /// an error reply to send back.
    pub fn from_message(message: &Value) -> Result<Self, Response> {
        serde_json::from_value(message.clone()).map_err(|_| {
            let action = message.get("action").and_then(Value::as_str).unwrap_or("<none>");
            log::debug!("Cleanplaats: ignoring message with action {}", action);
            Response::Error { ok: false, error: format!("Unknown action: {}", action) }
        })
    }
}

/// Reply to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    Ack {
        ok: bool,
        action: Action,
        results_per_page: String,
        default_sort_mode: SortMode,
    },
    Error {
        ok: bool,
        error: String,
    },
}

impl Response {
    pub fn ack(action: Action, settings: &Settings) -> Self {
        Response::Ack {
            ok: true,
            action,
            results_per_page: settings.results_per_page.clone(),
            default_sort_mode: settings.default_sort_mode,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ack { ok: true, .. })
    }
}
