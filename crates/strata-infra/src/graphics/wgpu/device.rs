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

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use strata_core::api::{
    BackendApi, BackendTexture, BufferDesc, BufferId, CommandBufferId, DepthStencilSettings,
    DepthStencilStateId, GraphicsPipelineDesc, GraphicsPipelineId, NativeTextureHandle, RenderPassDesc,
    SamplerDesc, SamplerId, SubmissionId, TextureId, TextureInfo,
};
use strata_core::backend::{CommandEncoder, GpuBackend, PipelineSource};
use strata_core::render::Vertex;
use strata_core::{Extent2D, PipelineError, ResourceError};

use super::command::WgpuCommandEncoder;
use super::context::WgpuGraphicsContext;
use super::conversions::{depth_stencil_state, tile_mode_to_address_mode, IntoWgpu};
use super::shaders;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct WgpuTextureEntry {
    /// Views keep their texture alive.
    view: Arc<wgpu::TextureView>,
    format: wgpu::TextureFormat,
    wrapped: bool,
}

#[derive(Debug)]
struct WgpuBufferEntry {
    buffer: Arc<wgpu::Buffer>,
    /// Requested size; the native allocation is padded to the copy alignment.
    size: u64,
}

/// Submissions whose `on_submitted_work_done` callback has fired.
#[derive(Debug, Default)]
struct CompletedSubmissions {
    ids: Mutex<Vec<SubmissionId>>,
}

/// The internal, non-clonable state of the WgpuBackend.
#[derive(Debug)]
struct WgpuBackendInternal {
    context: WgpuGraphicsContext,
    textures: Mutex<HashMap<TextureId, WgpuTextureEntry>>,
    /// Host-managed textures, keyed by their native handle.
    backend_textures: Mutex<HashMap<u64, Arc<wgpu::Texture>>>,
    buffers: Mutex<HashMap<BufferId, WgpuBufferEntry>>,
    samplers: Mutex<HashMap<SamplerId, Arc<wgpu::Sampler>>>,
    pipelines: Mutex<HashMap<GraphicsPipelineId, Arc<wgpu::RenderPipeline>>>,
    depth_stencil_states: Mutex<HashMap<DepthStencilStateId, DepthStencilSettings>>,

    /// Command buffers that have been finished but not yet submitted.
    pending_command_buffers: Mutex<HashMap<CommandBufferId, wgpu::CommandBuffer>>,
    completed: Arc<CompletedSubmissions>,
    /// Error scopes are device-wide, so compiles are serialized to attribute errors.
    compile_lock: Mutex<()>,

    next_texture_id: AtomicU64,
    next_backend_texture_handle: AtomicU64,
    next_buffer_id: AtomicU64,
    next_sampler_id: AtomicU64,
    next_pipeline_id: AtomicU64,
    next_depth_stencil_id: AtomicU64,
    next_command_buffer_id: AtomicU64,
    next_submission_id: AtomicU64,
}

/// A clonable, thread-safe handle to a `wgpu` device implementing [`GpuBackend`].
///
/// Native objects live in registries keyed by Strata ids; command encoders share the
/// handle to resolve them.
#[derive(Clone, Debug)]
pub struct WgpuBackend {
    internal: Arc<WgpuBackendInternal>,
}

impl WgpuBackend {
    pub fn new(context: WgpuGraphicsContext) -> Self {
        Self {
            internal: Arc::new(WgpuBackendInternal {
                context,
                textures: Mutex::new(HashMap::new()),
                backend_textures: Mutex::new(HashMap::new()),
                buffers: Mutex::new(HashMap::new()),
                samplers: Mutex::new(HashMap::new()),
                pipelines: Mutex::new(HashMap::new()),
                depth_stencil_states: Mutex::new(HashMap::new()),
                pending_command_buffers: Mutex::new(HashMap::new()),
                completed: Arc::new(CompletedSubmissions::default()),
                compile_lock: Mutex::new(()),
                next_texture_id: AtomicU64::new(0),
                next_backend_texture_handle: AtomicU64::new(1),
                next_buffer_id: AtomicU64::new(0),
                next_sampler_id: AtomicU64::new(0),
                next_pipeline_id: AtomicU64::new(0),
                next_depth_stencil_id: AtomicU64::new(0),
                next_command_buffer_id: AtomicU64::new(0),
                next_submission_id: AtomicU64::new(0),
            }),
        }
    }

    /// Name of the adapter the device was created on.
    pub fn adapter_name(&self) -> &str {
        &self.internal.context.adapter_name
    }

    /// Native API `wgpu` selected for the adapter.
    pub fn adapter_backend(&self) -> wgpu::Backend {
        self.internal.context.adapter_backend
    }

    /// Whether the adapter is integrated, discrete, virtual or a software rasterizer.
    pub fn adapter_device_type(&self) -> wgpu::DeviceType {
        self.internal.context.adapter_device_type
    }

    pub(crate) fn device(&self) -> &wgpu::Device {
        self.internal.context.device()
    }

    // --- Lookups used by the command encoder ---

    pub(crate) fn texture_view(&self, id: TextureId) -> Option<(Arc<wgpu::TextureView>, wgpu::TextureFormat)> {
        lock(&self.internal.textures)
            .get(&id)
            .map(|entry| (entry.view.clone(), entry.format))
    }

    pub(crate) fn buffer(&self, id: BufferId) -> Option<(Arc<wgpu::Buffer>, u64)> {
        lock(&self.internal.buffers)
            .get(&id)
            .map(|entry| (entry.buffer.clone(), entry.size))
    }

    pub(crate) fn render_pipeline(&self, id: GraphicsPipelineId) -> Option<Arc<wgpu::RenderPipeline>> {
        lock(&self.internal.pipelines).get(&id).cloned()
    }

    pub(crate) fn has_depth_stencil_state(&self, id: DepthStencilStateId) -> bool {
        lock(&self.internal.depth_stencil_states).contains_key(&id)
    }

    pub(crate) fn register_command_buffer(&self, command_buffer: wgpu::CommandBuffer) -> CommandBufferId {
        let id = CommandBufferId(
            self.internal
                .next_command_buffer_id
                .fetch_add(1, Ordering::Relaxed),
        );
        lock(&self.internal.pending_command_buffers).insert(id, command_buffer);
        id
    }

    fn check_texture_request(&self, dimensions: Extent2D, info: &TextureInfo) -> Result<(), ResourceError> {
        if info.backend() != Some(BackendApi::Wgpu) {
            return Err(ResourceError::BackendMismatch {
                expected: BackendApi::Wgpu,
                found: info.backend(),
            });
        }
        if !info.is_valid() || dimensions.is_empty() {
            return Err(ResourceError::InvalidDescriptor(format!(
                "cannot allocate a {}x{} texture from {info:?}",
                dimensions.width, dimensions.height
            )));
        }
        Ok(())
    }

    fn allocate_texture(&self, dimensions: Extent2D, info: &TextureInfo, label: &str) -> wgpu::Texture {
        self.device().create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: dimensions.into_wgpu(),
            mip_level_count: info.mip_level_count(),
            sample_count: info.sample_count().into_wgpu(),
            dimension: wgpu::TextureDimension::D2,
            format: info.format().into_wgpu(),
            usage: info.usage().into_wgpu(),
            view_formats: &[],
        })
    }

    fn register_texture(&self, texture: Arc<wgpu::Texture>, wrapped: bool) -> TextureId {
        let view = Arc::new(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        let format = texture.format();
        let id = TextureId(self.internal.next_texture_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.internal.textures).insert(
            id,
            WgpuTextureEntry {
                view,
                format,
                wrapped,
            },
        );
        id
    }

    fn remove_texture(&self, id: TextureId, wrapped: bool) -> Result<(), ResourceError> {
        let mut textures = lock(&self.internal.textures);
        match textures.get(&id) {
            Some(entry) if entry.wrapped == wrapped => {
                textures.remove(&id);
                Ok(())
            }
            Some(_) => Err(ResourceError::InvalidHandle(format!(
                "{id:?} is {}",
                if wrapped { "owned" } else { "wrapped" }
            ))),
            None => Err(ResourceError::InvalidHandle(format!("{id:?}"))),
        }
    }

    fn build_pipeline(
        &self,
        desc: &GraphicsPipelineDesc,
        render_pass: &RenderPassDesc,
        source: &PipelineSource<'_>,
    ) -> wgpu::RenderPipeline {
        let device = self.device();
        let label = format!("{}/{:?}", source.step.name(), desc.shader());

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(shaders::pipeline_module_source(source))),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&label),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let (blend, write_mask) = match (source.step.performs_shading(), source.program) {
            (false, _) => (None, wgpu::ColorWrites::empty()),
            (true, Some(program)) => (Some(program.blend_formula().into_wgpu()), wgpu::ColorWrites::ALL),
            (true, None) => (Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING), wgpu::ColorWrites::ALL),
        };
        let targets = [Some(wgpu::ColorTargetState {
            format: render_pass.color_format.into_wgpu(),
            blend,
            write_mask,
        })];

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(shaders::VERTEX_ENTRY_POINT),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: Vertex::STRIDE,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(shaders::FRAGMENT_ENTRY_POINT),
                targets: &targets,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: source.step.topology().into_wgpu(),
                ..Default::default()
            },
            depth_stencil: render_pass
                .depth_stencil_format
                .map(|format| depth_stencil_state(source.step.depth_stencil(), format)),
            multisample: wgpu::MultisampleState {
                count: render_pass.sample_count.into_wgpu(),
                ..Default::default()
            },
            multiview: None,
            cache: None,
        })
    }
}

impl GpuBackend for WgpuBackend {
    fn backend_api(&self) -> BackendApi {
        BackendApi::Wgpu
    }

    // --- Texture Operations ---

    fn create_texture(&self, dimensions: Extent2D, info: &TextureInfo) -> Result<TextureId, ResourceError> {
        self.check_texture_request(dimensions, info)?;
        let texture = self.allocate_texture(dimensions, info, "Strata Texture");
        let id = self.register_texture(Arc::new(texture), false);
        log::debug!(
            "WgpuBackend: Created {:?} texture {}x{} with ID: {id:?}",
            info.format(),
            dimensions.width,
            dimensions.height
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        self.remove_texture(id, false)?;
        log::debug!("WgpuBackend: Destroyed texture with ID: {id:?}");
        Ok(())
    }

    // --- Buffer Operations ---

    fn create_buffer(&self, desc: &BufferDesc) -> Result<BufferId, ResourceError> {
        if desc.size == 0 {
            return Err(ResourceError::InvalidDescriptor("buffer size must be non-zero".into()));
        }
        let buffer = self.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("Strata Buffer"),
            size: wgpu::util::align_to(desc.size, wgpu::COPY_BUFFER_ALIGNMENT),
            usage: desc.buffer_type.into_wgpu(),
            mapped_at_creation: false,
        });
        let id = BufferId(self.internal.next_buffer_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.internal.buffers).insert(
            id,
            WgpuBufferEntry {
                buffer: Arc::new(buffer),
                size: desc.size,
            },
        );
        log::debug!("WgpuBackend: Created {:?} buffer of {} bytes with ID: {id:?}", desc.buffer_type, desc.size);
        Ok(id)
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let (buffer, size) = self
            .buffer(id)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{id:?}")))?;
        let end = offset.checked_add(data.len() as u64);
        if end.is_none_or(|end| end > size) {
            return Err(ResourceError::InvalidDescriptor(format!(
                "write of {} bytes at {offset} exceeds {id:?} ({size} bytes)",
                data.len()
            )));
        }
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(ResourceError::InvalidDescriptor(format!(
                "write offset {offset} is not {}-byte aligned",
                wgpu::COPY_BUFFER_ALIGNMENT
            )));
        }

        // Queue writes must be a multiple of the copy alignment; the padding lands in
        // the allocation's slack.
        let padded_len = wgpu::util::align_to(data.len() as u64, wgpu::COPY_BUFFER_ALIGNMENT) as usize;
        let queue = self.internal.context.queue();
        if padded_len == data.len() {
            queue.write_buffer(&buffer, offset, data);
        } else {
            let mut padded = data.to_vec();
            padded.resize(padded_len, 0);
            queue.write_buffer(&buffer, offset, &padded);
        }
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        if lock(&self.internal.buffers).remove(&id).is_some() {
            log::debug!("WgpuBackend: Destroyed buffer with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::InvalidHandle(format!("{id:?}")))
        }
    }

    // --- Sampler Operations ---

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<SamplerId, ResourceError> {
        let border_supported = self.internal.context.supports_clamp_to_border();
        let [tile_x, tile_y] = desc.tile_modes;
        let sampler = self.device().create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Strata Sampler"),
            address_mode_u: tile_mode_to_address_mode(tile_x, border_supported),
            address_mode_v: tile_mode_to_address_mode(tile_y, border_supported),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: desc.filter.into_wgpu(),
            min_filter: desc.filter.into_wgpu(),
            mipmap_filter: desc.mipmap_filter.into_wgpu(),
            border_color: border_supported.then_some(wgpu::SamplerBorderColor::TransparentBlack),
            ..Default::default()
        });
        let id = SamplerId(self.internal.next_sampler_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.internal.samplers).insert(id, Arc::new(sampler));
        log::debug!("WgpuBackend: Created sampler {desc:?} with ID: {id:?}");
        Ok(id)
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        if lock(&self.internal.samplers).remove(&id).is_some() {
            log::debug!("WgpuBackend: Destroyed sampler with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::InvalidHandle(format!("{id:?}")))
        }
    }

    // --- Pipeline Operations ---

    fn create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDesc,
        render_pass: &RenderPassDesc,
        source: &PipelineSource<'_>,
    ) -> Result<GraphicsPipelineId, ResourceError> {
        log::debug!(
            "WgpuBackend: Creating pipeline for step '{}' with shader {:?}",
            source.step.name(),
            desc.shader()
        );

        let pipeline = {
            let _compiling = lock(&self.internal.compile_lock);
            let device = self.device();
            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let pipeline = self.build_pipeline(desc, render_pass, source);
            if let Some(error) = pollster::block_on(device.pop_error_scope()) {
                log::error!("WgpuBackend: Pipeline '{}' failed to compile: {error}", source.step.name());
                return Err(PipelineError::CompilationFailed {
                    label: Some(source.step.name().to_owned()),
                    details: error.to_string(),
                }
                .into());
            }
            pipeline
        };

        let id = GraphicsPipelineId(self.internal.next_pipeline_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.internal.pipelines).insert(id, Arc::new(pipeline));
        log::debug!("WgpuBackend: Successfully created pipeline with ID: {id:?}");
        Ok(id)
    }

    fn destroy_graphics_pipeline(&self, id: GraphicsPipelineId) -> Result<(), ResourceError> {
        if lock(&self.internal.pipelines).remove(&id).is_some() {
            log::debug!("WgpuBackend: Destroyed pipeline with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::InvalidHandle(format!("{id:?}")))
        }
    }

    fn create_depth_stencil_state(&self, settings: &DepthStencilSettings) -> Result<DepthStencilStateId, ResourceError> {
        // WGPU has no standalone depth/stencil object; the settings are recorded so
        // encoders can validate ids, and pipelines bake the state in.
        let id = DepthStencilStateId(
            self.internal
                .next_depth_stencil_id
                .fetch_add(1, Ordering::Relaxed),
        );
        lock(&self.internal.depth_stencil_states).insert(id, *settings);
        Ok(id)
    }

    fn destroy_depth_stencil_state(&self, id: DepthStencilStateId) -> Result<(), ResourceError> {
        lock(&self.internal.depth_stencil_states)
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{id:?}")))
    }

    // --- Commands ---

    fn create_command_encoder(&self, label: Option<&str>) -> Result<Box<dyn CommandEncoder>, ResourceError> {
        Ok(Box::new(WgpuCommandEncoder::new(self.clone(), label)))
    }

    fn submit(&self, command_buffer: CommandBufferId) -> Result<SubmissionId, ResourceError> {
        let buffer = lock(&self.internal.pending_command_buffers)
            .remove(&command_buffer)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{command_buffer:?}")))?;

        let id = SubmissionId(self.internal.next_submission_id.fetch_add(1, Ordering::Relaxed));
        let queue = self.internal.context.queue();
        queue.submit(std::iter::once(buffer));

        let completed = Arc::clone(&self.internal.completed);
        queue.on_submitted_work_done(move || {
            lock(&completed.ids).push(id);
        });
        log::trace!("WgpuBackend: Submitted {command_buffer:?} as {id:?}");
        Ok(id)
    }

    fn discard_command_buffer(&self, command_buffer: CommandBufferId) {
        if lock(&self.internal.pending_command_buffers)
            .remove(&command_buffer)
            .is_none()
        {
            log::warn!("WgpuBackend: Discarding unknown {command_buffer:?}");
        }
    }

    fn poll_completed(&self, wait: bool) -> Result<Vec<SubmissionId>, ResourceError> {
        let poll_type = if wait {
            wgpu::PollType::Wait
        } else {
            wgpu::PollType::Poll
        };
        self.device()
            .poll(poll_type)
            .map_err(|e| ResourceError::Backend(format!("device poll failed: {e}")))?;

        let mut done = std::mem::take(&mut *lock(&self.internal.completed.ids));
        done.sort();
        Ok(done)
    }

    // --- Host-managed textures ---

    fn create_backend_texture(&self, dimensions: Extent2D, info: &TextureInfo) -> Result<BackendTexture, ResourceError> {
        self.check_texture_request(dimensions, info)?;
        let texture = self.allocate_texture(dimensions, info, "Strata Backend Texture");
        let handle = self
            .internal
            .next_backend_texture_handle
            .fetch_add(1, Ordering::Relaxed);
        lock(&self.internal.backend_textures).insert(handle, Arc::new(texture));
        log::debug!("WgpuBackend: Allocated backend texture {handle}");
        Ok(BackendTexture::new(dimensions, *info, NativeTextureHandle(handle)))
    }

    fn delete_backend_texture(&self, texture: &BackendTexture) -> Result<(), ResourceError> {
        let handle = texture
            .handle()
            .ok_or_else(|| ResourceError::InvalidHandle("empty backend texture".into()))?;
        lock(&self.internal.backend_textures)
            .remove(&handle.0)
            .map(|_| log::debug!("WgpuBackend: Deleted backend texture {}", handle.0))
            .ok_or_else(|| ResourceError::InvalidHandle(format!("backend texture {}", handle.0)))
    }

    fn wrap_backend_texture(&self, texture: &BackendTexture) -> Result<TextureId, ResourceError> {
        let handle = texture
            .handle()
            .ok_or_else(|| ResourceError::InvalidHandle("empty backend texture".into()))?;
        let native = lock(&self.internal.backend_textures)
            .get(&handle.0)
            .cloned()
            .ok_or_else(|| ResourceError::InvalidHandle(format!("backend texture {}", handle.0)))?;
        Ok(self.register_texture(native, true))
    }

    fn unwrap_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        self.remove_texture(id, true)
    }
}
