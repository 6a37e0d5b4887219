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

//! The session: owner of the device, the caches and the submission path.

use crate::api::*;
use crate::backend::{BackendFactory, GpuBackend};
use crate::callback::{FinishedCallback, RefCntedCallback};
use crate::command_buffer::CommandBuffer;
use crate::config::SessionOptions;
use crate::dimension::Extent2D;
use crate::error::SessionError;
use crate::global_cache::GlobalCache;
use crate::gpu::Gpu;
use crate::paint::{create_key, PaintCombo, PaintParamsKeyBuilder};
use crate::recorder::Recorder;
use crate::recording::Recording;
use crate::render::Renderer;
use crate::resource::ResourceProvider;
use std::collections::HashSet;
use std::sync::Arc;

/// Whether [`Session::submit`] waits for the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncToCpu {
    /// Block until the submitted work completes.
    Yes,
    /// Return immediately.
    #[default]
    No,
}

/// Arguments of [`Session::insert_recording`].
#[derive(Debug, Default)]
pub struct InsertRecordingInfo {
    /// The recording to insert. `None` is rejected.
    pub recording: Option<Recording>,
    /// Called once the recording's work finishes or fails.
    pub finished: Option<FinishedCallback>,
}

impl InsertRecordingInfo {
    /// Inserts `recording` without a callback.
    pub fn new(recording: Recording) -> Self {
        Self {
            recording: Some(recording),
            finished: None,
        }
    }

    /// Attaches a finished-callback.
    #[must_use]
    pub fn with_finished_callback(mut self, callback: FinishedCallback) -> Self {
        self.finished = Some(callback);
        self
    }
}

/// Owns one logical device and everything shared by its recorders.
///
/// At most one recording is inserted and not yet submitted at any time. Dropping the
/// session waits for the GPU to go idle, so every callback fires before the device is released.
#[derive(Debug)]
pub struct Session {
    gpu: Gpu,
    global_cache: Arc<GlobalCache>,
    resource_provider: Arc<ResourceProvider>,
    current: Option<CommandBuffer>,
    options: SessionOptions,
}

impl Session {
    /// Brings up a backend through `factory` and wraps it in a session.
    pub async fn make(factory: &dyn BackendFactory, options: SessionOptions) -> Result<Self, SessionError> {
        let expected = factory.backend_api();
        let backend = factory.create_backend().await?;
        let found = backend.backend_api();
        if found != expected {
            return Err(SessionError::BackendMismatch { expected, found });
        }
        Ok(Self::make_with_backend(backend, options))
    }

    /// Wraps an existing backend.
    pub fn make_with_backend(backend: Arc<dyn GpuBackend>, options: SessionOptions) -> Self {
        let global_cache = Arc::new(GlobalCache::new());
        let resource_provider = Arc::new(ResourceProvider::new(
            backend.clone(),
            global_cache.clone(),
            options.resource_cache,
        ));
        log::info!(
            "Created {} session (eviction: {:?})",
            backend.backend_api(),
            options.resource_cache.eviction
        );
        Self {
            gpu: Gpu::new(backend),
            global_cache,
            resource_provider,
            current: None,
            options,
        }
    }

    /// The backend.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        self.gpu.backend()
    }

    /// The backend's API.
    pub fn backend_api(&self) -> BackendApi {
        self.gpu.backend().backend_api()
    }

    /// The global cache shared with every recorder.
    pub fn global_cache(&self) -> &Arc<GlobalCache> {
        &self.global_cache
    }

    /// The resource provider shared with every recorder.
    pub fn resource_provider(&self) -> &Arc<ResourceProvider> {
        &self.resource_provider
    }

    /// Options the session was created with.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Creates a recorder sharing this session's device and caches.
    pub fn make_recorder(&self) -> Recorder {
        Recorder::new(
            self.gpu.backend().clone(),
            self.global_cache.clone(),
            self.resource_provider.clone(),
        )
    }

    /// `true` while an inserted recording waits for [`submit`](Self::submit).
    pub fn has_pending_recording(&self) -> bool {
        self.current.is_some()
    }

    /// Number of submissions the GPU has not finished yet.
    pub fn outstanding_submissions(&self) -> usize {
        self.gpu.outstanding_count()
    }

    /// Makes a recording's work the session's current work.
    ///
    /// Returns `false` when `info.recording` is `None`; the callback, if any, then fires
    /// with [`CallbackResult::Failed`](crate::callback::CallbackResult::Failed) and nothing else changes.
    ///
    /// # Panics
    /// If a previously inserted recording has not been submitted yet.
    pub fn insert_recording(&mut self, info: InsertRecordingInfo) -> bool {
        let InsertRecordingInfo { recording, finished } = info;
        let callback = finished.map(RefCntedCallback::new);

        let Some(recording) = recording else {
            log::warn!("insert_recording called without a recording");
            if let Some(callback) = callback {
                callback.set_failed();
            }
            return false;
        };

        assert!(
            self.current.is_none(),
            "insert_recording called while recording is still awaiting submit"
        );
        log::debug!("Inserting recording {}", recording.id());
        let mut command_buffer = recording.into_command_buffer();
        if let Some(callback) = callback {
            command_buffer.add_finished_callback(callback);
        }
        self.current = Some(command_buffer);
        true
    }

    /// Submits the current work, then releases whatever has finished.
    /// With [`SyncToCpu::Yes`] this blocks until the GPU is idle.
    ///
    /// # Panics
    /// If no recording has been inserted since the last submit.
    pub fn submit(&mut self, sync_to_cpu: SyncToCpu) {
        let command_buffer = self
            .current
            .take()
            .unwrap_or_else(|| panic!("submit called without an inserted recording"));
        self.gpu.submit(command_buffer);
        self.gpu.check_for_finished_work(sync_to_cpu == SyncToCpu::Yes);
    }

    /// Fires callbacks of work that has finished, without blocking.
    pub fn check_async_work_completion(&mut self) {
        self.gpu.check_for_finished_work(false);
    }

    /// Allocates a texture for the host to manage.
    ///
    /// Returns an invalid [`BackendTexture`] when `info` is malformed, targets another
    /// backend, or the backend cannot allocate it.
    pub fn create_backend_texture(&self, dimensions: Extent2D, info: &TextureInfo) -> BackendTexture {
        if !info.is_valid() || info.backend() != Some(self.backend_api()) || dimensions.is_empty() {
            log::debug!("Rejected backend texture request {dimensions:?} / {info:?}");
            return BackendTexture::default();
        }
        match self.gpu.backend().create_backend_texture(dimensions, info) {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("Backend texture creation failed: {e}");
                BackendTexture::default()
            }
        }
    }

    /// Frees a texture from [`create_backend_texture`](Self::create_backend_texture) and
    /// resets it to the invalid state. Invalid or foreign textures are ignored.
    pub fn delete_backend_texture(&self, texture: &mut BackendTexture) {
        if !texture.is_valid() || texture.backend() != Some(self.backend_api()) {
            return;
        }
        self.resource_provider.forget_wrapped_texture(texture);
        if let Err(e) = self.gpu.backend().delete_backend_texture(texture) {
            log::warn!("Backend texture deletion failed: {e}");
        }
        texture.reset();
    }

    /// Warm-up: interns the shading key of every combination in `combo` and derives the
    /// pipeline description of every step of every stock renderer.
    ///
    /// Non-shading steps use [`UniquePaintParamsId::NONE`]. When
    /// [`SessionOptions::eager_pipeline_compilation`] is set, the pipelines are also compiled
    /// against [`SessionOptions::default_render_pass`]; compile failures are logged and skipped.
    pub fn pre_compile(&self, combo: &PaintCombo) -> HashSet<GraphicsPipelineDesc> {
        let dict = self.global_cache.shader_code_dictionary();
        let mut builder = PaintParamsKeyBuilder::new();
        let mut descs = HashSet::new();

        for (blend_mode, shader_type, tile_mode) in combo.combinations() {
            let shading = create_key(dict, &mut builder, shader_type, tile_mode, blend_mode);
            for renderer in Renderer::stock() {
                for step in renderer.steps() {
                    let shader = if step.performs_shading() {
                        shading
                    } else {
                        UniquePaintParamsId::NONE
                    };
                    descs.insert(GraphicsPipelineDesc::new(step.id(), shader));
                }
            }
        }

        if self.options.eager_pipeline_compilation {
            let render_pass = self.options.default_render_pass;
            let failures = descs
                .iter()
                .filter(|desc| {
                    match self
                        .resource_provider
                        .find_or_create_graphics_pipeline(desc, &render_pass)
                    {
                        Ok(_) => false,
                        Err(e) => {
                            log::warn!("Warm-up compile of {desc:?} failed: {e}");
                            true
                        }
                    }
                })
                .count();
            log::info!(
                "Warm-up compiled {} of {} pipelines",
                descs.len() - failures,
                descs.len()
            );
        }

        log::debug!(
            "Pre-compiled {} combinations into {} pipeline descriptions",
            combo.len(),
            descs.len()
        );
        descs
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(command_buffer) = self.current.take() {
            log::warn!("Session dropped with an unsubmitted recording");
            command_buffer.mark_failed();
        }
        self.gpu.wait_for_idle();
    }
}
