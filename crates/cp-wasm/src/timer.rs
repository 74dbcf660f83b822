//! Browser timers as cancellable task handles

use cp_core::task::TaskHandle;
use wasm_bindgen::prelude::*;

use crate::chrome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Timeout,
    Interval,
}

/// A live `setTimeout`/`setInterval` registration.
///
/// Owns its callback: dropping the handle clears the timer first, so the
/// browser never calls a freed closure.
pub struct Timer {
    id: Option<i32>,
    kind: TimerKind,
    _callback: Closure<dyn FnMut()>,
}

impl Timer {
    pub fn timeout(delay_ms: u32, callback: impl FnMut() + 'static) -> Self {
        Self::start(TimerKind::Timeout, delay_ms, callback)
    }

    pub fn interval(period_ms: u32, callback: impl FnMut() + 'static) -> Self {
        Self::start(TimerKind::Interval, period_ms, callback)
    }

    fn start(kind: TimerKind, ms: u32, callback: impl FnMut() + 'static) -> Self {
        let callback = Closure::<dyn FnMut()>::new(callback);
        let function = callback.as_ref().unchecked_ref();
        let ms = i32::try_from(ms).unwrap_or(i32::MAX);
        let id = match kind {
            TimerKind::Timeout => chrome::set_timeout(function, ms),
            TimerKind::Interval => chrome::set_interval(function, ms),
        };
        Self { id: Some(id), kind, _callback: callback }
    }
}

impl TaskHandle for Timer {
    fn cancel(&mut self) {
        if let Some(id) = self.id.take() {
            match self.kind {
                TimerKind::Timeout => chrome::clear_timeout(id),
                TimerKind::Interval => chrome::clear_interval(id),
            }
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run `callback` once after `delay_ms`, with no way to cancel it.
pub fn fire_and_forget(delay_ms: u32, callback: impl FnOnce() + 'static) {
    let function = Closure::once_into_js(callback);
    let ms = i32::try_from(delay_ms).unwrap_or(i32::MAX);
    chrome::set_timeout(function.unchecked_ref(), ms);
}
