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

//! Debug-build detection of concurrent use of single-owner objects.

#[cfg(debug_assertions)]
use std::sync::{Mutex, PoisonError};
#[cfg(debug_assertions)]
use std::thread::{self, ThreadId};

/// A token that panics when two threads are inside the same owner at once.
///
/// Re-entry from the owning thread is allowed. Release builds compile the check out.
#[derive(Debug, Default)]
pub struct SingleOwner {
    #[cfg(debug_assertions)]
    owner: Mutex<Option<(ThreadId, usize)>>,
}

/// Marks the current thread as inside a [`SingleOwner`] until dropped.
#[must_use = "the owner is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SingleOwnerGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a SingleOwner,
    #[cfg(not(debug_assertions))]
    _owner: std::marker::PhantomData<&'a SingleOwner>,
}

impl SingleOwner {
    /// Creates an unowned token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters the owner.
    ///
    /// # Panics
    /// In debug builds, if another thread is currently inside.
    #[cfg(debug_assertions)]
    pub fn enter(&self) -> SingleOwnerGuard<'_> {
        let me = thread::current().id();
        let conflict = {
            let mut owner = self.owner.lock().unwrap_or_else(PoisonError::into_inner);
            match owner.as_mut() {
                None => {
                    *owner = Some((me, 1));
                    None
                }
                Some((thread, depth)) if *thread == me => {
                    *depth += 1;
                    None
                }
                Some((thread, _)) => Some(*thread),
            }
        };
        if let Some(thread) = conflict {
            panic!("single-owner object entered from {me:?} while owned by {thread:?}");
        }
        SingleOwnerGuard { owner: self }
    }

    /// Enters the owner.
    #[cfg(not(debug_assertions))]
    pub fn enter(&self) -> SingleOwnerGuard<'_> {
        SingleOwnerGuard {
            _owner: std::marker::PhantomData,
        }
    }
}

#[cfg(debug_assertions)]
impl Drop for SingleOwnerGuard<'_> {
    fn drop(&mut self) {
        let mut owner = self.owner.owner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, depth)) = owner.as_mut() {
            *depth -= 1;
            if *depth == 0 {
                *owner = None;
            }
        }
    }
}
