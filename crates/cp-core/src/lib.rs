//! Cleanplaats Core Library
//!
//! Platform-independent logic of the Cleanplaats extension, which strips ads
//! from marktplaats.nl and 2dehands.be result pages and applies the user's
//! preferred result count and sort order.
//!
//! # Architecture
//!
//! Two execution contexts share one persisted settings record:
//!
//! - the background side rewrites navigation URLs and keeps a single
//!   declarative redirect rule in sync for the search API;
//! - the content side classifies listings in the page and hides or deletes
//!   ads as the page mutates.
//!
//! Everything here is pure over small traits ([`dom::Element`],
//! [`task::TaskHandle`]) so it runs natively in tests; the wasm crate binds
//! those traits to the browser. Platform calls that are async (rule updates,
//! tab updates) stay in the wasm crate, which feeds their outcome back into
//! [`rule::RuleSync`] and [`navigation::NavigationWatcher`].
//!
//! # Modules
//!
//! - `types`: sort table, hide reasons, filter categories
//! - `settings`: persisted settings record and per-process cache
//! - `url`, `fragment`: URL splitting, query and fragment options
//! - `rewrite`: navigation and API URL correction
//! - `rule`: declarative redirect rule and its synchronizer
//! - `navigation`: navigation signal handling and deferred reloads
//! - `dom`, `selectors`, `marker`: DOM abstraction and page contract
//! - `classifier`: cleanup passes and counters
//! - `coordinator`: mutation batches and content polling
//! - `empty_page`: notices for emptied pages
//! - `keyboard`: arrow-key carousel navigation
//! - `messages`: content-to-background protocol

pub mod classifier;
pub mod coordinator;
pub mod dom;
pub mod empty_page;
pub mod error;
pub mod fragment;
pub mod keyboard;
pub mod marker;
pub mod messages;
pub mod navigation;
pub mod rewrite;
pub mod rule;
pub mod selectors;
pub mod settings;
pub mod stats;
pub mod task;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use classifier::{DomClassifier, PassReport};
pub use coordinator::{MutationCoordinator, MutationResponse, PollStep};
pub use navigation::{NavigationDecision, NavigationWatcher};
pub use rewrite::{rewrite_api_url, rewrite_navigation_url, RewriteContext};
pub use rule::{DeclarativeRule, RuleSync, RuleUpdate};
pub use settings::{Settings, SettingsCache};
pub use stats::Stats;
pub use types::{FilterSet, HideReason, SortMode};
