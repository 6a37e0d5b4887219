// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Finished-callbacks attached to submitted work.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Outcome reported to a [`FinishedCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackResult {
    /// The GPU finished the work.
    Success,
    /// The work was rejected, never submitted, or could not complete.
    Failed,
}

/// A one-shot procedure invoked when inserted work finishes or fails.
pub struct FinishedCallback {
    proc: Box<dyn FnOnce(CallbackResult) + Send + 'static>,
}

impl FinishedCallback {
    /// Wraps a closure.
    pub fn new(proc: impl FnOnce(CallbackResult) + Send + 'static) -> Self {
        Self { proc: Box::new(proc) }
    }

    /// A callback that forwards its result to the returned receiver.
    pub fn channel() -> (Self, flume::Receiver<CallbackResult>) {
        let (tx, rx) = flume::bounded(1);
        let callback = Self::new(move |result| {
            let _ = tx.send(result);
        });
        (callback, rx)
    }

    pub(crate) fn invoke(self, result: CallbackResult) {
        (self.proc)(result)
    }
}

impl fmt::Debug for FinishedCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinishedCallback").finish_non_exhaustive()
    }
}

/// Shared wrapper that fires its callback exactly once, when the last reference drops.
pub(crate) struct RefCntedCallback {
    callback: Mutex<Option<FinishedCallback>>,
    failed: AtomicBool,
}

impl RefCntedCallback {
    pub(crate) fn new(callback: FinishedCallback) -> Arc<Self> {
        Arc::new(Self {
            callback: Mutex::new(Some(callback)),
            failed: AtomicBool::new(false),
        })
    }

    /// The callback will report [`CallbackResult::Failed`].
    pub(crate) fn set_failed(&self) {
        self.failed.store(true, Ordering::Release);
    }
}

impl fmt::Debug for RefCntedCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefCntedCallback")
            .field("failed", &self.failed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Drop for RefCntedCallback {
    fn drop(&mut self) {
        let callback = self.callback.get_mut().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(callback) = callback {
            let result = if self.failed.load(Ordering::Acquire) {
                CallbackResult::Failed
            } else {
                CallbackResult::Success
            };
            callback.invoke(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_on_last_drop() {
        let (callback, rx) = FinishedCallback::channel();
        let shared = RefCntedCallback::new(callback);
        let second = Arc::clone(&shared);

        drop(shared);
        assert!(rx.try_recv().is_err());
        drop(second);
        assert_eq!(rx.try_recv(), Ok(CallbackResult::Success));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn reports_failure_when_marked() {
        let (callback, rx) = FinishedCallback::channel();
        let shared = RefCntedCallback::new(callback);
        shared.set_failed();
        drop(shared);
        assert_eq!(rx.recv(), Ok(CallbackResult::Failed));
    }
}
