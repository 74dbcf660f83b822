//! Mutation coordinator
//!
//! Decides what a batch of DOM mutations means. A location change is an
//! in-page navigation: the page swaps its results asynchronously, so the
//! coordinator polls for content before the next pass. Otherwise added nodes
//! that look like listings or ads trigger an incremental pass.
//!
//! ```text
//! Idle --navigation / initial load--> AwaitingContent { attempts }
//! AwaitingContent --content found--> Idle (pass)
//! AwaitingContent --attempt ceiling--> Idle (no pass)
//! ```

use crate::dom::Element;
use crate::selectors;
use crate::task::{TaskHandle, TaskSlot};

/// Interval between content polls.
pub const POLL_INTERVAL_MS: u32 = 100;
/// Polls before giving up on a navigation.
pub const MAX_POLL_ATTEMPTS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    AwaitingContent { attempts: u32 },
}

/// What to do about one mutation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationResponse {
    /// Location changed: clear notices and start polling.
    Navigated,
    /// New listings or ads arrived: run an incremental pass.
    Cleanup,
    Nothing,
}

/// Outcome of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    Continue,
    /// Content is present: run a pass and the empty-page check.
    Ready,
    GiveUp,
}

/// Owns the single content poll of a page.
#[derive(Debug)]
pub struct MutationCoordinator<H: TaskHandle> {
    last_url: String,
    state: CoordinatorState,
    poll: TaskSlot<H>,
}

impl<H: TaskHandle> MutationCoordinator<H> {
    pub fn new(initial_url: &str) -> Self {
        Self {
            last_url: initial_url.to_string(),
            state: CoordinatorState::Idle,
            poll: TaskSlot::new(),
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_active()
    }

    /// Classify a mutation batch given the current location and added nodes.
    pub fn observe<E: Element>(&mut self, current_url: &str, added: &[E]) -> MutationResponse {
        if current_url != self.last_url {
            log::debug!("Cleanplaats: location changed from {} to {}", self.last_url, current_url);
            self.last_url = current_url.to_string();
            return MutationResponse::Navigated;
        }
        if added.iter().any(signals_new_content) {
            MutationResponse::Cleanup
        } else {
            MutationResponse::Nothing
        }
    }

    /// Start polling with `handle`, cancelling any poll already running.
    pub fn start_polling(&mut self, handle: H) {
        self.poll.replace(handle);
        self.state = CoordinatorState::AwaitingContent { attempts: 0 };
    }

    /// Advance the poll. Cancels its own handle on `Ready` and `GiveUp`.
    pub fn poll_tick(&mut self, content_present: bool) -> PollStep {
        let CoordinatorState::AwaitingContent { attempts } = self.state else {
            self.poll.cancel();
            return PollStep::GiveUp;
        };
        let step = if content_present {
            PollStep::Ready
        } else if attempts + 1 >= MAX_POLL_ATTEMPTS {
            log::debug!("Cleanplaats: no content after {} polls", MAX_POLL_ATTEMPTS);
            PollStep::GiveUp
        } else {
            self.state = CoordinatorState::AwaitingContent { attempts: attempts + 1 };
            return PollStep::Continue;
        };
        self.poll.cancel();
        self.state = CoordinatorState::Idle;
        step
    }
}

/// Whether an added node may carry listings or ads.
///
/// Nodes this extension inserts itself are ignored, otherwise injecting a
/// button or notice would trigger another pass.
pub fn signals_new_content<E: Element>(node: &E) -> bool {
    let id = node.id();
    let own = id.starts_with(selectors::OWN_PREFIX)
        || node
            .get_attribute("class")
            .is_some_and(|class| class.contains(selectors::OWN_PREFIX));
    if own {
        return false;
    }
    node.has_class(selectors::LISTING_CLASS)
        || matches!(node.query_selector(selectors::LISTING), Ok(Some(_)))
        || id.contains("ad")
        || node.has_class(selectors::BANNER_CLASS)
        || matches!(node.query_selector(selectors::GOOGLE_AD_MARKER), Ok(Some(_)))
}
