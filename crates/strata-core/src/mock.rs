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

//! An in-process backend that records commands instead of executing them.
//!
//! [`MockBackend`] counts every native creation, keeps submissions pending until they
//! are completed or waited on, and exposes hooks for injecting failures and delays.

use crate::api::*;
use crate::backend::{BackendFactory, CommandEncoder, GpuBackend, PipelineSource};
use crate::dimension::Extent2D;
use crate::error::{PipelineError, ResourceError, SessionError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A command captured by a mock encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCommand {
    /// `begin_render_pass`.
    BeginRenderPass(RenderPassBegin),
    /// `bind_graphics_pipeline`.
    BindGraphicsPipeline(GraphicsPipelineId),
    /// `set_depth_stencil_state`.
    SetDepthStencilState(DepthStencilStateId, u32),
    /// `bind_vertex_buffer`.
    BindVertexBuffer(BufferId, u64),
    /// `draw`.
    Draw(Range<u32>),
    /// `end_render_pass`.
    EndRenderPass,
    /// `copy_buffer_to_buffer`.
    CopyBufferToBuffer {
        /// Source buffer.
        src: BufferId,
        /// Destination buffer.
        dst: BufferId,
        /// Bytes copied.
        size: u64,
    },
}

/// Creation and destruction counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MockStats {
    /// Pipelines compiled.
    pub pipelines_created: usize,
    /// Pipelines destroyed.
    pub pipelines_destroyed: usize,
    /// Depth/stencil states created.
    pub depth_stencil_states_created: usize,
    /// Depth/stencil states destroyed.
    pub depth_stencil_states_destroyed: usize,
    /// Samplers created.
    pub samplers_created: usize,
    /// Samplers destroyed.
    pub samplers_destroyed: usize,
    /// Owned textures created.
    pub textures_created: usize,
    /// Owned textures destroyed.
    pub textures_destroyed: usize,
    /// Buffers created.
    pub buffers_created: usize,
    /// Buffers destroyed.
    pub buffers_destroyed: usize,
    /// Backend textures allocated.
    pub backend_textures_created: usize,
    /// Backend textures freed.
    pub backend_textures_deleted: usize,
    /// Backend textures wrapped.
    pub textures_wrapped: usize,
    /// Wrapped textures released.
    pub textures_unwrapped: usize,
    /// Command buffers submitted.
    pub submissions: usize,
    /// Command buffers discarded without submission.
    pub command_buffers_discarded: usize,
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    buffers: HashMap<u64, Vec<u8>>,
    textures: HashSet<u64>,
    samplers: HashSet<u64>,
    pipelines: HashSet<u64>,
    depth_stencil_states: HashSet<u64>,
    backend_textures: HashSet<u64>,
    wrapped: HashMap<u64, u64>,
    finished: HashMap<u64, Vec<MockCommand>>,
    pending: VecDeque<SubmissionId>,
    completed: Vec<SubmissionId>,
    submitted: Vec<Vec<MockCommand>>,
    stats: MockStats,
    fail_pipeline_creation: bool,
    fail_submission: bool,
    fail_draws: bool,
    auto_complete: bool,
    creation_delay: Duration,
}

impl MockState {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn is_texture(&self, id: TextureId) -> bool {
        self.textures.contains(&id.0) || self.wrapped.contains_key(&id.0)
    }

    fn execute_copies(&mut self, commands: &[MockCommand]) -> Result<(), ResourceError> {
        for command in commands {
            if let MockCommand::CopyBufferToBuffer { src, dst, size } = command {
                let size = *size as usize;
                let out_of_bounds = || ResourceError::InvalidDescriptor(format!("copy of {size} bytes out of bounds"));
                let data = self
                    .buffers
                    .get(&src.0)
                    .ok_or_else(|| ResourceError::InvalidHandle(format!("{src:?}")))?
                    .get(..size)
                    .ok_or_else(out_of_bounds)?
                    .to_vec();
                self.buffers
                    .get_mut(&dst.0)
                    .ok_or_else(|| ResourceError::InvalidHandle(format!("{dst:?}")))?
                    .get_mut(..size)
                    .ok_or_else(out_of_bounds)?
                    .copy_from_slice(&data);
            }
        }
        Ok(())
    }
}

/// A backend that keeps all state in memory.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Creates a mock backend whose submissions stay pending until completed.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every pipeline creation fail.
    pub fn set_fail_pipeline_creation(&self, fail: bool) {
        self.state().fail_pipeline_creation = fail;
    }

    /// Makes every submission fail.
    pub fn set_fail_submission(&self, fail: bool) {
        self.state().fail_submission = fail;
    }

    /// Completes submissions on the next poll, as a fast GPU would.
    pub fn set_auto_complete(&self, auto_complete: bool) {
        self.state().auto_complete = auto_complete;
    }

    /// Makes every encoded draw fail.
    pub fn set_fail_draws(&self, fail: bool) {
        self.state().fail_draws = fail;
    }

    /// Sleeps for `delay` inside every pipeline creation.
    pub fn set_creation_delay(&self, delay: Duration) {
        self.state().creation_delay = delay;
    }

    /// Marks every pending submission complete.
    pub fn complete_all(&self) {
        let mut state = self.state();
        let pending: Vec<_> = state.pending.drain(..).collect();
        state.completed.extend(pending);
    }

    /// Submissions not yet completed.
    pub fn pending_submissions(&self) -> usize {
        self.state().pending.len()
    }

    /// Commands of the most recent submission.
    pub fn last_submitted_commands(&self) -> Option<Vec<MockCommand>> {
        self.state().submitted.last().cloned()
    }

    /// Contents of a buffer.
    pub fn buffer_contents(&self, id: BufferId) -> Option<Vec<u8>> {
        self.state().buffers.get(&id.0).cloned()
    }

    /// Creation and destruction counters.
    pub fn stats(&self) -> MockStats {
        self.state().stats
    }

    /// Native objects currently alive, backend textures excluded.
    pub fn live_objects(&self) -> usize {
        let state = self.state();
        state.buffers.len()
            + state.textures.len()
            + state.samplers.len()
            + state.pipelines.len()
            + state.depth_stencil_states.len()
            + state.wrapped.len()
    }
}

fn remove_or_invalid(set: &mut HashSet<u64>, id: u64, what: &str) -> Result<(), ResourceError> {
    if set.remove(&id) {
        Ok(())
    } else {
        Err(ResourceError::InvalidHandle(format!("{what} {id}")))
    }
}

impl GpuBackend for MockBackend {
    fn backend_api(&self) -> BackendApi {
        BackendApi::Mock
    }

    fn create_texture(&self, dimensions: Extent2D, info: &TextureInfo) -> Result<TextureId, ResourceError> {
        if !info.is_valid() || dimensions.is_empty() {
            return Err(ResourceError::InvalidDescriptor(format!("{dimensions:?} {info:?}")));
        }
        let mut state = self.state();
        let id = state.allocate();
        state.textures.insert(id);
        state.stats.textures_created += 1;
        Ok(TextureId(id))
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut state = self.state();
        remove_or_invalid(&mut state.textures, id.0, "texture")?;
        state.stats.textures_destroyed += 1;
        Ok(())
    }

    fn create_buffer(&self, desc: &BufferDesc) -> Result<BufferId, ResourceError> {
        let mut state = self.state();
        let id = state.allocate();
        state.buffers.insert(id, vec![0; desc.size as usize]);
        state.stats.buffers_created += 1;
        Ok(BufferId(id))
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut state = self.state();
        let contents = state
            .buffers
            .get_mut(&id.0)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{id:?}")))?;
        let start = offset as usize;
        let end = start + data.len();
        if end > contents.len() {
            return Err(ResourceError::InvalidDescriptor(format!(
                "write of {} bytes at {offset} overflows {} bytes",
                data.len(),
                contents.len()
            )));
        }
        contents[start..end].copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let mut state = self.state();
        state
            .buffers
            .remove(&id.0)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{id:?}")))?;
        state.stats.buffers_destroyed += 1;
        Ok(())
    }

    fn create_sampler(&self, _desc: &SamplerDesc) -> Result<SamplerId, ResourceError> {
        let mut state = self.state();
        let id = state.allocate();
        state.samplers.insert(id);
        state.stats.samplers_created += 1;
        Ok(SamplerId(id))
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        let mut state = self.state();
        remove_or_invalid(&mut state.samplers, id.0, "sampler")?;
        state.stats.samplers_destroyed += 1;
        Ok(())
    }

    fn create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDesc,
        _render_pass: &RenderPassDesc,
        source: &PipelineSource<'_>,
    ) -> Result<GraphicsPipelineId, ResourceError> {
        let (fail, delay) = {
            let state = self.state();
            (state.fail_pipeline_creation, state.creation_delay)
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        if fail {
            return Err(PipelineError::CompilationFailed {
                label: Some(source.step.name().to_string()),
                details: "mock pipeline creation disabled".into(),
            }
            .into());
        }
        if source.step.id() != desc.render_step() {
            return Err(PipelineError::UnknownRenderStep(desc.render_step()).into());
        }
        if let Some(program) = source.program {
            if program.id() != desc.shader() {
                return Err(PipelineError::MissingShaderProgram(desc.shader()).into());
            }
        }
        let mut state = self.state();
        let id = state.allocate();
        state.pipelines.insert(id);
        state.stats.pipelines_created += 1;
        Ok(GraphicsPipelineId(id))
    }

    fn destroy_graphics_pipeline(&self, id: GraphicsPipelineId) -> Result<(), ResourceError> {
        let mut state = self.state();
        remove_or_invalid(&mut state.pipelines, id.0, "pipeline")?;
        state.stats.pipelines_destroyed += 1;
        Ok(())
    }

    fn create_depth_stencil_state(&self, _settings: &DepthStencilSettings) -> Result<DepthStencilStateId, ResourceError> {
        let mut state = self.state();
        let id = state.allocate();
        state.depth_stencil_states.insert(id);
        state.stats.depth_stencil_states_created += 1;
        Ok(DepthStencilStateId(id))
    }

    fn destroy_depth_stencil_state(&self, id: DepthStencilStateId) -> Result<(), ResourceError> {
        let mut state = self.state();
        remove_or_invalid(&mut state.depth_stencil_states, id.0, "depth/stencil state")?;
        state.stats.depth_stencil_states_destroyed += 1;
        Ok(())
    }

    fn create_command_encoder(&self, _label: Option<&str>) -> Result<Box<dyn CommandEncoder>, ResourceError> {
        Ok(Box::new(MockEncoder {
            state: self.state.clone(),
            commands: Vec::new(),
            in_pass: false,
        }))
    }

    fn submit(&self, command_buffer: CommandBufferId) -> Result<SubmissionId, ResourceError> {
        let mut state = self.state();
        let commands = state
            .finished
            .remove(&command_buffer.0)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{command_buffer:?}")))?;
        if state.fail_submission {
            return Err(ResourceError::Backend("mock submission disabled".into()));
        }
        state.execute_copies(&commands)?;
        let id = SubmissionId(state.allocate());
        state.pending.push_back(id);
        state.submitted.push(commands);
        state.stats.submissions += 1;
        Ok(id)
    }

    fn discard_command_buffer(&self, command_buffer: CommandBufferId) {
        let mut state = self.state();
        if state.finished.remove(&command_buffer.0).is_some() {
            state.stats.command_buffers_discarded += 1;
        }
    }

    fn poll_completed(&self, wait: bool) -> Result<Vec<SubmissionId>, ResourceError> {
        let mut state = self.state();
        if wait || state.auto_complete {
            let pending: Vec<_> = state.pending.drain(..).collect();
            state.completed.extend(pending);
        }
        Ok(std::mem::take(&mut state.completed))
    }

    fn create_backend_texture(&self, dimensions: Extent2D, info: &TextureInfo) -> Result<BackendTexture, ResourceError> {
        if info.backend() != Some(BackendApi::Mock) {
            return Err(ResourceError::BackendMismatch {
                expected: BackendApi::Mock,
                found: info.backend(),
            });
        }
        let mut state = self.state();
        let id = state.allocate();
        state.backend_textures.insert(id);
        state.stats.backend_textures_created += 1;
        Ok(BackendTexture::new(dimensions, *info, NativeTextureHandle(id)))
    }

    fn delete_backend_texture(&self, texture: &BackendTexture) -> Result<(), ResourceError> {
        let handle = texture
            .handle()
            .ok_or_else(|| ResourceError::InvalidHandle("empty backend texture".into()))?;
        let mut state = self.state();
        remove_or_invalid(&mut state.backend_textures, handle.0, "backend texture")?;
        state.stats.backend_textures_deleted += 1;
        Ok(())
    }

    fn wrap_backend_texture(&self, texture: &BackendTexture) -> Result<TextureId, ResourceError> {
        let handle = texture
            .handle()
            .ok_or_else(|| ResourceError::InvalidHandle("empty backend texture".into()))?;
        let mut state = self.state();
        if !state.backend_textures.contains(&handle.0) {
            return Err(ResourceError::InvalidHandle(format!("backend texture {}", handle.0)));
        }
        let id = state.allocate();
        state.wrapped.insert(id, handle.0);
        state.stats.textures_wrapped += 1;
        Ok(TextureId(id))
    }

    fn unwrap_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut state = self.state();
        state
            .wrapped
            .remove(&id.0)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{id:?}")))?;
        state.stats.textures_unwrapped += 1;
        Ok(())
    }
}

struct MockEncoder {
    state: Arc<Mutex<MockState>>,
    commands: Vec<MockCommand>,
    in_pass: bool,
}

impl MockEncoder {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn require_pass(&self, inside: bool, what: &str) -> Result<(), ResourceError> {
        if self.in_pass != inside {
            let place = if inside { "inside" } else { "outside" };
            return Err(ResourceError::Backend(format!("{what} is only valid {place} a render pass")));
        }
        Ok(())
    }
}

impl CommandEncoder for MockEncoder {
    fn begin_render_pass(&mut self, begin: &RenderPassBegin) -> Result<(), ResourceError> {
        self.require_pass(false, "begin_render_pass")?;
        {
            let state = self.state();
            let attachments = std::iter::once(begin.color_target).chain(begin.depth_stencil_target);
            for texture in attachments {
                if !state.is_texture(texture) {
                    return Err(ResourceError::InvalidHandle(format!("{texture:?}")));
                }
            }
        }
        self.in_pass = true;
        self.commands.push(MockCommand::BeginRenderPass(*begin));
        Ok(())
    }

    fn bind_graphics_pipeline(&mut self, pipeline: GraphicsPipelineId) -> Result<(), ResourceError> {
        self.require_pass(true, "bind_graphics_pipeline")?;
        if !self.state().pipelines.contains(&pipeline.0) {
            return Err(ResourceError::InvalidHandle(format!("{pipeline:?}")));
        }
        self.commands.push(MockCommand::BindGraphicsPipeline(pipeline));
        Ok(())
    }

    fn set_depth_stencil_state(&mut self, state: DepthStencilStateId, stencil_reference: u32) -> Result<(), ResourceError> {
        self.require_pass(true, "set_depth_stencil_state")?;
        if !self.state().depth_stencil_states.contains(&state.0) {
            return Err(ResourceError::InvalidHandle(format!("{state:?}")));
        }
        self.commands
            .push(MockCommand::SetDepthStencilState(state, stencil_reference));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId, offset: u64) -> Result<(), ResourceError> {
        self.require_pass(true, "bind_vertex_buffer")?;
        if !self.state().buffers.contains_key(&buffer.0) {
            return Err(ResourceError::InvalidHandle(format!("{buffer:?}")));
        }
        self.commands.push(MockCommand::BindVertexBuffer(buffer, offset));
        Ok(())
    }

    fn draw(&mut self, vertices: Range<u32>) -> Result<(), ResourceError> {
        self.require_pass(true, "draw")?;
        if self.state().fail_draws {
            return Err(ResourceError::InvalidDescriptor("mock draws disabled".into()));
        }
        self.commands.push(MockCommand::Draw(vertices));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<(), ResourceError> {
        self.require_pass(true, "end_render_pass")?;
        self.in_pass = false;
        self.commands.push(MockCommand::EndRenderPass);
        Ok(())
    }

    fn copy_buffer_to_buffer(&mut self, src: BufferId, dst: BufferId, size: u64) -> Result<(), ResourceError> {
        self.require_pass(false, "copy_buffer_to_buffer")?;
        self.commands.push(MockCommand::CopyBufferToBuffer { src, dst, size });
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<CommandBufferId, ResourceError> {
        self.require_pass(false, "finish")?;
        let MockEncoder { state, commands, .. } = *self;
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        let id = state.allocate();
        state.finished.insert(id, commands);
        Ok(CommandBufferId(id))
    }
}

/// Creates [`MockBackend`]s, optionally failing like a machine without a GPU.
#[derive(Debug, Clone, Default)]
pub struct MockBackendFactory {
    backend: Option<MockBackend>,
    fail: bool,
}

impl MockBackendFactory {
    /// A factory that creates a fresh backend each time.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory that hands out clones of `backend`, so tests can keep a handle to it.
    pub fn with_backend(backend: MockBackend) -> Self {
        Self {
            backend: Some(backend),
            fail: false,
        }
    }

    /// A factory whose every creation fails.
    pub fn failing() -> Self {
        Self {
            backend: None,
            fail: true,
        }
    }
}

#[async_trait]
impl BackendFactory for MockBackendFactory {
    fn backend_api(&self) -> BackendApi {
        BackendApi::Mock
    }

    async fn create_backend(&self) -> Result<Arc<dyn GpuBackend>, SessionError> {
        if self.fail {
            return Err(SessionError::InitializationFailed("no mock device available".into()));
        }
        let backend = self.backend.clone().unwrap_or_default();
        log::info!("Created mock backend");
        Ok(Arc::new(backend))
    }
}
