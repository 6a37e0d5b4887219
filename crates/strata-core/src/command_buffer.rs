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

//! A finished native command buffer plus everything it keeps alive.

use crate::api::CommandBufferId;
use crate::backend::GpuBackend;
use crate::callback::RefCntedCallback;
use crate::resource::{Buffer, DepthStencilState, GraphicsPipeline, Sampler, Texture};
use std::sync::Arc;

/// A resource referenced by recorded commands. Held for its lifetime only.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub(crate) enum TrackedResource {
    Texture(Arc<Texture>),
    Buffer(Arc<Buffer>),
    Sampler(Arc<Sampler>),
    Pipeline(Arc<GraphicsPipeline>),
    DepthStencil(Arc<DepthStencilState>),
}

/// Holds a native command buffer, the resources its commands use, and the callbacks
/// to fire once the GPU is done with it. Dropping it releases all three; an unsubmitted
/// native buffer is discarded.
#[derive(Debug)]
pub(crate) struct CommandBuffer {
    backend: Arc<dyn GpuBackend>,
    native: Option<CommandBufferId>,
    tracked: Vec<TrackedResource>,
    finished: Vec<Arc<RefCntedCallback>>,
}

impl CommandBuffer {
    pub(crate) fn new(backend: Arc<dyn GpuBackend>, native: CommandBufferId, tracked: Vec<TrackedResource>) -> Self {
        Self {
            backend,
            native: Some(native),
            tracked,
            finished: Vec::new(),
        }
    }

    pub(crate) fn add_finished_callback(&mut self, callback: Arc<RefCntedCallback>) {
        self.finished.push(callback);
    }

    /// Every attached callback will report failure.
    pub(crate) fn mark_failed(&self) {
        for callback in &self.finished {
            callback.set_failed();
        }
    }

    /// Hands the native buffer to the caller for submission.
    pub(crate) fn take_native(&mut self) -> Option<CommandBufferId> {
        self.native.take()
    }

    pub(crate) fn tracked_resource_count(&self) -> usize {
        self.tracked.len()
    }
}

impl Drop for CommandBuffer {
    fn drop(&mut self) {
        if let Some(native) = self.native.take() {
            self.mark_failed();
            self.backend.discard_command_buffer(native);
        }
    }
}
