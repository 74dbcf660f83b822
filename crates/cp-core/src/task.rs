//! Single-slot cancellable tasks
//!
//! Timers are owned through a [`TaskSlot`]: putting a new handle into a slot
//! cancels the one it replaces, so at most one timer per purpose is live.

/// A scheduled timer that can be cancelled.
pub trait TaskHandle {
    fn cancel(&mut self);
}

/// Holds at most one live task.
#[derive(Debug)]
pub struct TaskSlot<H: TaskHandle> {
    current: Option<H>,
}

impl<H: TaskHandle> Default for TaskSlot<H> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<H: TaskHandle> TaskSlot<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle`, cancelling whatever was there.
    pub fn replace(&mut self, handle: H) {
        if let Some(mut previous) = self.current.replace(handle) {
            previous.cancel();
        }
    }

    /// Cancel and clear the slot. Returns whether a task was live.
    pub fn cancel(&mut self) -> bool {
        match self.current.take() {
            Some(mut handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Forget the handle without cancelling it (a one-shot timer that fired).
    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}

impl<H: TaskHandle> Drop for TaskSlot<H> {
    fn drop(&mut self) {
        self.cancel();
    }
}
