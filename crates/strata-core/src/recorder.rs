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

//! Turns draw and resource requests into a [`Recording`].

use crate::api::*;
use crate::backend::{CommandEncoder, GpuBackend};
use crate::command_buffer::{CommandBuffer, TrackedResource};
use crate::dimension::Extent2D;
use crate::error::ResourceError;
use crate::global_cache::GlobalCache;
use crate::paint::{PaintParams, PaintParamsKeyBuilder};
use crate::recording::Recording;
use crate::render::{Renderer, Vertex};
use crate::resource::{Buffer, ResourceProvider, Sampler, Texture};
use crate::single_owner::SingleOwner;
use bytemuck::Pod;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

const DEPTH_STENCIL_FORMAT: TextureFormat = TextureFormat::Depth24PlusStencil8;

/// A vertex buffer range drawn by one step.
#[derive(Debug, Clone)]
pub struct DrawGeometry {
    /// Buffer of [`Vertex`] values.
    pub buffer: Arc<Buffer>,
    /// Vertices to draw.
    pub vertices: Range<u32>,
}

impl DrawGeometry {
    /// Creates a geometry range.
    pub fn new(buffer: Arc<Buffer>, vertices: Range<u32>) -> Self {
        Self { buffer, vertices }
    }

    fn validate(&self) -> Result<(), ResourceError> {
        if self.buffer.desc().buffer_type != BufferType::Vertex {
            return Err(ResourceError::InvalidDescriptor(format!(
                "{:?} buffer used as vertex input",
                self.buffer.desc().buffer_type
            )));
        }
        if u64::from(self.vertices.end) * Vertex::STRIDE > self.buffer.size() || self.vertices.start > self.vertices.end {
            return Err(ResourceError::InvalidDescriptor(format!(
                "vertex range {:?} exceeds a {}-byte buffer",
                self.vertices,
                self.buffer.size()
            )));
        }
        Ok(())
    }
}

/// One path draw: which renderer, how to shade it, and where.
#[derive(Debug, Clone)]
pub struct DrawRequest {
    /// Color attachment. Must allow `RENDER_ATTACHMENT`.
    pub target: Arc<Texture>,
    /// Renderer whose steps are executed in order.
    pub renderer: &'static Renderer,
    /// Shading of the covered pixels.
    pub paint: PaintParams,
    /// Geometry of the stencil steps.
    pub path: DrawGeometry,
    /// Geometry of the shading steps. Defaults to `path`; inverse fills usually cover the whole target.
    pub cover: Option<DrawGeometry>,
}

impl DrawRequest {
    /// A draw whose stencil and cover steps share `path`.
    pub fn new(target: Arc<Texture>, renderer: &'static Renderer, paint: PaintParams, path: DrawGeometry) -> Self {
        Self {
            target,
            renderer,
            paint,
            path,
            cover: None,
        }
    }

    /// Uses separate geometry for the shading steps.
    #[must_use]
    pub fn with_cover(mut self, cover: DrawGeometry) -> Self {
        self.cover = Some(cover);
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct ActivePass {
    target: TextureId,
    render_pass: RenderPassDesc,
}

/// Records work for a session.
///
/// A recorder shares its session's backend and caches. It can be moved to another
/// thread but must only be used by one thread at a time; debug builds panic on
/// concurrent entry.
pub struct Recorder {
    backend: Arc<dyn GpuBackend>,
    global_cache: Arc<GlobalCache>,
    resource_provider: Arc<ResourceProvider>,
    single_owner: Arc<SingleOwner>,
    key_builder: PaintParamsKeyBuilder,
    encoder: Option<Box<dyn CommandEncoder>>,
    active_pass: Option<ActivePass>,
    tracked: Vec<TrackedResource>,
    depth_stencil_attachments: HashMap<(Extent2D, SampleCount), Arc<Texture>>,
}

impl fmt::Debug for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("backend", &self.backend.backend_api())
            .field("encoding", &self.encoder.is_some())
            .field("active_pass", &self.active_pass)
            .field("tracked", &self.tracked.len())
            .finish_non_exhaustive()
    }
}

impl Recorder {
    pub(crate) fn new(
        backend: Arc<dyn GpuBackend>,
        global_cache: Arc<GlobalCache>,
        resource_provider: Arc<ResourceProvider>,
    ) -> Self {
        Self {
            backend,
            global_cache,
            resource_provider,
            single_owner: Arc::new(SingleOwner::new()),
            key_builder: PaintParamsKeyBuilder::new(),
            encoder: None,
            active_pass: None,
            tracked: Vec::new(),
            depth_stencil_attachments: HashMap::new(),
        }
    }

    /// Backend this recorder encodes for.
    pub fn backend_api(&self) -> BackendApi {
        self.backend.backend_api()
    }

    /// The shared resource provider.
    pub fn resource_provider(&self) -> &Arc<ResourceProvider> {
        &self.resource_provider
    }

    /// `true` when commands have been recorded since the last snap.
    pub fn has_pending_work(&self) -> bool {
        self.encoder.is_some()
    }

    /// Creates a buffer.
    pub fn create_buffer(
        &mut self,
        size: u64,
        buffer_type: BufferType,
        prioritize_gpu_reads: PrioritizeGpuReads,
    ) -> Result<Arc<Buffer>, ResourceError> {
        let owner = Arc::clone(&self.single_owner);
        let _guard = owner.enter();
        self.resource_provider.create_buffer(size, buffer_type, prioritize_gpu_reads)
    }

    /// Creates a vertex buffer holding `vertices`.
    pub fn create_vertex_buffer<T: Pod>(&mut self, vertices: &[T]) -> Result<Arc<Buffer>, ResourceError> {
        let owner = Arc::clone(&self.single_owner);
        let _guard = owner.enter();
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let buffer = self.resource_provider.create_buffer(
            bytes.len() as u64,
            BufferType::Vertex,
            PrioritizeGpuReads::Yes,
        )?;
        self.backend.write_buffer(buffer.id(), 0, bytes)?;
        Ok(buffer)
    }

    /// Creates an owned texture.
    pub fn create_texture(&mut self, dimensions: Extent2D, info: &TextureInfo) -> Result<Arc<Texture>, ResourceError> {
        let owner = Arc::clone(&self.single_owner);
        let _guard = owner.enter();
        self.resource_provider.create_texture(dimensions, info)
    }

    /// Wraps a host-managed backend texture so it can be drawn into.
    pub fn wrap_backend_texture(&mut self, texture: &BackendTexture) -> Result<Arc<Texture>, ResourceError> {
        let owner = Arc::clone(&self.single_owner);
        let _guard = owner.enter();
        self.resource_provider.find_or_wrap_texture(texture)
    }

    /// Returns the shared sampler for `desc`.
    pub fn sampler(&mut self, desc: SamplerDesc) -> Result<Arc<Sampler>, ResourceError> {
        let owner = Arc::clone(&self.single_owner);
        let _guard = owner.enter();
        self.resource_provider.find_or_create_sampler(&desc)
    }

    /// Clears `target` to `color`, starting a new render pass on it.
    pub fn clear(&mut self, target: &Arc<Texture>, color: Color) -> Result<(), ResourceError> {
        let owner = Arc::clone(&self.single_owner);
        let _guard = owner.enter();
        self.end_pass()?;
        self.begin_pass(target, LoadOp::Clear(color))?;
        Ok(())
    }

    /// Records a path draw.
    ///
    /// Each step of the renderer gets its pipeline from the resource provider: shading
    /// steps are keyed by the paint, the others by the "no shader" sentinel.
    pub fn draw(&mut self, request: &DrawRequest) -> Result<(), ResourceError> {
        let owner = Arc::clone(&self.single_owner);
        let _guard = owner.enter();

        request.path.validate()?;
        if let Some(cover) = &request.cover {
            cover.validate()?;
        }

        let paint_id = request
            .paint
            .to_unique_id(self.global_cache.shader_code_dictionary(), &mut self.key_builder);
        let render_pass = self.ensure_pass(&request.target)?;

        let mut steps = Vec::with_capacity(request.renderer.steps().len());
        for step in request.renderer.steps() {
            let shader = if step.performs_shading() {
                paint_id
            } else {
                UniquePaintParamsId::NONE
            };
            let desc = GraphicsPipelineDesc::new(step.id(), shader);
            let pipeline = self
                .resource_provider
                .find_or_create_graphics_pipeline(&desc, &render_pass)?;
            let state = self
                .resource_provider
                .find_or_create_depth_stencil_state(step.depth_stencil())?;
            let geometry = match &request.cover {
                Some(cover) if step.performs_shading() => cover,
                _ => &request.path,
            };
            steps.push((pipeline, state, step.depth_stencil().stencil_reference, geometry));
        }

        // Tracked before encoding: a failed step must not leave encoded commands
        // pointing at resources nothing owns.
        self.tracked.push(TrackedResource::Texture(request.target.clone()));
        let mut commands = Vec::with_capacity(steps.len());
        for (pipeline, state, reference, geometry) in steps {
            commands.push((pipeline.id(), state.id(), reference, geometry));
            self.tracked.push(TrackedResource::Pipeline(pipeline));
            self.tracked.push(TrackedResource::DepthStencil(state));
            self.tracked.push(TrackedResource::Buffer(geometry.buffer.clone()));
        }

        let encoder = self.encoder()?;
        for (pipeline, state, reference, geometry) in commands {
            encoder.bind_graphics_pipeline(pipeline)?;
            encoder.set_depth_stencil_state(state, reference)?;
            encoder.bind_vertex_buffer(geometry.buffer.id(), 0)?;
            encoder.draw(geometry.vertices.clone())?;
        }
        Ok(())
    }

    /// Copies `size` bytes between the starts of two buffers.
    pub fn copy_buffer_to_buffer(&mut self, src: &Arc<Buffer>, dst: &Arc<Buffer>, size: u64) -> Result<(), ResourceError> {
        let owner = Arc::clone(&self.single_owner);
        let _guard = owner.enter();
        if size > src.size() || size > dst.size() {
            return Err(ResourceError::InvalidDescriptor(format!(
                "copy of {size} bytes from a {}-byte into a {}-byte buffer",
                src.size(),
                dst.size()
            )));
        }
        self.end_pass()?;
        self.tracked.push(TrackedResource::Buffer(src.clone()));
        self.tracked.push(TrackedResource::Buffer(dst.clone()));
        self.encoder()?.copy_buffer_to_buffer(src.id(), dst.id(), size)
    }

    /// Finishes the recorded work into a [`Recording`] and resets the recorder.
    /// Snapping with nothing recorded yields an empty recording.
    pub fn snap(&mut self) -> Result<Recording, ResourceError> {
        let owner = Arc::clone(&self.single_owner);
        let _guard = owner.enter();
        let ended = self.end_pass();
        let tracked = std::mem::take(&mut self.tracked);
        let encoder = self.encoder.take();
        ended?;

        let encoder = match encoder {
            Some(encoder) => encoder,
            None => self.backend.create_command_encoder(Some("strata-recording"))?,
        };
        let native = encoder.finish()?;
        let recording = Recording::new(CommandBuffer::new(self.backend.clone(), native, tracked));
        log::debug!(
            "Snapped recording {} ({} tracked resources)",
            recording.id(),
            recording.tracked_resource_count()
        );
        Ok(recording)
    }

    fn encoder(&mut self) -> Result<&mut dyn CommandEncoder, ResourceError> {
        let encoder = match self.encoder.take() {
            Some(encoder) => encoder,
            None => self.backend.create_command_encoder(Some("strata-recording"))?,
        };
        Ok(&mut **self.encoder.insert(encoder))
    }

    fn ensure_pass(&mut self, target: &Arc<Texture>) -> Result<RenderPassDesc, ResourceError> {
        match self.active_pass {
            Some(pass) if pass.target == target.id() => Ok(pass.render_pass),
            _ => {
                self.end_pass()?;
                self.begin_pass(target, LoadOp::Load)
            }
        }
    }

    fn begin_pass(&mut self, target: &Arc<Texture>, load: LoadOp) -> Result<RenderPassDesc, ResourceError> {
        let info = *target.info();
        if !info.usage().contains(TextureUsage::RENDER_ATTACHMENT) {
            return Err(ResourceError::InvalidDescriptor(format!(
                "texture {:?} is not a render attachment",
                target.id()
            )));
        }
        let depth_stencil = self.depth_stencil_attachment(target.dimensions(), info.sample_count())?;
        let render_pass = RenderPassDesc {
            color_format: info.format(),
            depth_stencil_format: Some(DEPTH_STENCIL_FORMAT),
            sample_count: info.sample_count(),
        };
        let begin = RenderPassBegin {
            color_target: target.id(),
            depth_stencil_target: Some(depth_stencil.id()),
            load,
            store: StoreOp::Store,
        };
        self.tracked.push(TrackedResource::Texture(target.clone()));
        self.tracked.push(TrackedResource::Texture(depth_stencil));
        self.encoder()?.begin_render_pass(&begin)?;
        self.active_pass = Some(ActivePass {
            target: target.id(),
            render_pass,
        });
        Ok(render_pass)
    }

    fn end_pass(&mut self) -> Result<(), ResourceError> {
        if self.active_pass.take().is_some() {
            self.encoder()?.end_render_pass()?;
        }
        Ok(())
    }

    fn depth_stencil_attachment(
        &mut self,
        dimensions: Extent2D,
        sample_count: SampleCount,
    ) -> Result<Arc<Texture>, ResourceError> {
        if let Some(texture) = self.depth_stencil_attachments.get(&(dimensions, sample_count)) {
            return Ok(texture.clone());
        }
        let info = TextureInfo::new(self.backend.backend_api(), DEPTH_STENCIL_FORMAT, TextureUsage::RENDER_ATTACHMENT)
            .with_sample_count(sample_count);
        let texture = self.resource_provider.create_texture(dimensions, &info)?;
        self.depth_stencil_attachments
            .insert((dimensions, sample_count), texture.clone());
        Ok(texture)
    }
}
