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

//! Tracks submitted command buffers until the backend reports them complete.

use crate::api::SubmissionId;
use crate::backend::GpuBackend;
use crate::command_buffer::CommandBuffer;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug)]
struct OutstandingSubmission {
    id: SubmissionId,
    command_buffer: CommandBuffer,
}

/// Owns the backend on behalf of a session and keeps every submitted command buffer
/// (with its resources and callbacks) alive until its work completes.
#[derive(Debug)]
pub(crate) struct Gpu {
    backend: Arc<dyn GpuBackend>,
    outstanding: VecDeque<OutstandingSubmission>,
}

impl Gpu {
    pub(crate) fn new(backend: Arc<dyn GpuBackend>) -> Self {
        Self {
            backend,
            outstanding: VecDeque::new(),
        }
    }

    pub(crate) fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Submits a command buffer. On failure its callbacks fire with `Failed`.
    pub(crate) fn submit(&mut self, mut command_buffer: CommandBuffer) -> bool {
        let Some(native) = command_buffer.take_native() else {
            log::error!("Command buffer was already submitted");
            command_buffer.mark_failed();
            return false;
        };
        match self.backend.submit(native) {
            Ok(id) => {
                log::trace!("Submitted {native:?} as {id:?}");
                self.outstanding.push_back(OutstandingSubmission { id, command_buffer });
                true
            }
            Err(e) => {
                log::error!("Backend rejected command buffer {native:?}: {e}");
                command_buffer.mark_failed();
                false
            }
        }
    }

    /// Releases submissions the backend reports complete, firing their callbacks.
    pub(crate) fn check_for_finished_work(&mut self, wait: bool) {
        if self.outstanding.is_empty() {
            return;
        }
        let completed = match self.backend.poll_completed(wait) {
            Ok(completed) => completed,
            Err(e) => {
                log::warn!("Polling for finished GPU work failed: {e}");
                return;
            }
        };
        let mut finished = Vec::new();
        self.outstanding.retain(|submission| {
            if completed.contains(&submission.id) {
                finished.push(submission.id);
                false
            } else {
                true
            }
        });
        if !finished.is_empty() {
            log::trace!("Finished submissions: {finished:?}");
        }
    }

    /// Blocks until nothing is outstanding. Submissions the backend cannot finish are
    /// released as failed.
    pub(crate) fn wait_for_idle(&mut self) {
        self.check_for_finished_work(true);
        if !self.outstanding.is_empty() {
            log::warn!(
                "{} submissions did not complete before shutdown",
                self.outstanding.len()
            );
            for submission in self.outstanding.drain(..) {
                submission.command_buffer.mark_failed();
            }
        }
    }

    pub(crate) fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }
}
