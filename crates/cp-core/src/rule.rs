//! Declarative redirect rule
//!
//! The background side keeps exactly one dynamic rule installed that adds or
//! replaces `limit`, `sortBy` and `sortOrder` on search API requests. The
//! types here serialize to the platform's `declarativeNetRequest` JSON shape.

#[cfg(test)]
use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::RuleError;
use crate::rewrite::{LIMIT_KEY, SORT_BY_KEY, SORT_ORDER_KEY};
use crate::settings::Settings;
use crate::types::SortMode;

/// Fixed id of the single rule this extension installs.
pub const RULE_ID: u32 = 1;
/// Path fragment matched on API requests.
pub const API_URL_FILTER: &str = "/lrp/api/search";
/// Marketplace hosts served by this extension.
pub const TARGET_HOSTS: [&str; 2] = ["www.marktplaats.nl", "www.2dehands.be"];

// =============================================================================
// Rule Model
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarativeRule {
    pub id: u32,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: RuleActionType,
    pub redirect: Redirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleActionType {
    Redirect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    pub transform: UrlTransform,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlTransform {
    pub query_transform: QueryTransform,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTransform {
    pub add_or_replace_params: Vec<QueryParam>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryParam {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub url_filter: String,
    pub request_domains: Vec<String>,
    pub resource_types: Vec<String>,
}

impl DeclarativeRule {
    /// Parameters this rule writes, in order.
    pub fn params(&self) -> &[QueryParam] {
        &self.action.redirect.transform.query_transform.add_or_replace_params
    }
}

/// Build the rule for the given settings. `None` for rewrite-default settings.
pub fn build_rule(settings: &Settings) -> Option<DeclarativeRule> {
    if settings.is_default_rewrite() {
        return None;
    }

    let mut params = vec![QueryParam {
        key: LIMIT_KEY.to_string(),
        value: settings.results_per_page.clone(),
    }];
    if settings.default_sort_mode != SortMode::Standard {
        let keys = settings.default_sort_mode.keys();
        params.push(QueryParam { key: SORT_BY_KEY.to_string(), value: keys.sort_by.as_str().to_string() });
        params.push(QueryParam { key: SORT_ORDER_KEY.to_string(), value: keys.sort_order.as_str().to_string() });
    }

    Some(DeclarativeRule {
        id: RULE_ID,
        priority: 1,
        action: RuleAction {
            kind: RuleActionType::Redirect,
            redirect: Redirect {
                transform: UrlTransform {
                    query_transform: QueryTransform { add_or_replace_params: params },
                },
            },
        },
        condition: RuleCondition {
            url_filter: API_URL_FILTER.to_string(),
            request_domains: TARGET_HOSTS.iter().map(|h| h.to_string()).collect(),
            resource_types: vec!["xmlhttprequest".to_string(), "other".to_string()],
        },
    })
}

/// Options object for `updateDynamicRules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    pub remove_rule_ids: Vec<u32>,
    pub add_rules: Vec<DeclarativeRule>,
}

// =============================================================================
// Rule Sync
// =============================================================================

/// Keeps the installed rule in step with the settings.
///
/// The platform call itself is async and belongs to the caller: `plan` or
/// `plan_replacing` decide what to send, `finish` logs and records what the
/// platform answered.
#[derive(Debug, Default)]
pub struct RuleSync {
    /// `None` until the first update completes.
    last_applied: Option<Option<DeclarativeRule>>,
}

impl RuleSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// The update to issue for these settings: always remove the fixed id,
    /// then add the rule if there is one.
    pub fn plan(settings: &Settings) -> RuleUpdate {
        RuleUpdate {
            remove_rule_ids: vec![RULE_ID],
            add_rules: build_rule(settings).into_iter().collect(),
        }
    }

    /// Like [`plan`](Self::plan), but also removes every id in `installed`,
    /// so rules left by an older version cannot survive an upgrade.
    pub fn plan_replacing(settings: &Settings, installed: &[u32]) -> RuleUpdate {
        let mut update = Self::plan(settings);
        for &id in installed {
            if !update.remove_rule_ids.contains(&id) {
                update.remove_rule_ids.push(id);
            }
        }
        update
    }

    /// Record the platform's answer to `update`.
    ///
    /// A rejected update is logged, not retried, and leaves the sync marked
    /// as not current.
    pub fn finish(&mut self, update: &RuleUpdate, outcome: Result<(), RuleError>) {
        match outcome {
            Ok(()) => {
                log::info!(
                    "Cleanplaats: redirect rule {}",
                    if update.add_rules.is_empty() { "cleared" } else { "installed" }
                );
                self.last_applied = Some(update.add_rules.first().cloned());
            }
            Err(e) => {
                log::warn!("Cleanplaats: redirect rule update rejected, rewriting disabled: {}", e);
                self.last_applied = None;
            }
        }
    }

    /// Whether the last successful update already matches these settings.
    pub fn is_current(&self, settings: &Settings) -> bool {
        self.last_applied.as_ref() == Some(&build_rule(settings))
    }
}

/// In-memory dynamic rule table with the platform's atomic update and its
/// basic validation.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryRuleTable {
    rules: BTreeMap<u32, DeclarativeRule>,
}

#[cfg(test)]
impl MemoryRuleTable {
    pub(crate) fn with_rules(rules: impl IntoIterator<Item = DeclarativeRule>) -> Self {
        Self { rules: rules.into_iter().map(|r| (r.id, r)).collect() }
    }

    pub(crate) fn ids(&self) -> Vec<u32> {
        self.rules.keys().copied().collect()
    }

    pub(crate) fn rules(&self) -> impl Iterator<Item = &DeclarativeRule> {
        self.rules.values()
    }

    /// `updateDynamicRules`: all or nothing.
    pub(crate) fn update(&mut self, update: &RuleUpdate) -> Result<(), RuleError> {
        let mut next = self.rules.clone();
        for id in &update.remove_rule_ids {
            next.remove(id);
        }
        for rule in &update.add_rules {
            validate(rule)?;
            if next.insert(rule.id, rule.clone()).is_some() {
                return Err(RuleError::DuplicateId(rule.id));
            }
        }
        self.rules = next;
        Ok(())
    }
}

#[cfg(test)]
fn validate(rule: &DeclarativeRule) -> Result<(), RuleError> {
    if rule.id == 0 {
        return Err(RuleError::InvalidId(rule.id));
    }
    if rule.condition.url_filter.is_empty() {
        return Err(RuleError::EmptyFilter(rule.id));
    }
    for param in rule.params() {
        if param.value.is_empty() {
            return Err(RuleError::EmptyParam { id: rule.id, key: param.key.clone() });
        }
    }
    Ok(())
}
