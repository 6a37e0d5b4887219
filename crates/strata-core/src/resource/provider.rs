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

//! The per-session resource provider.

use super::cache::{KeyedCache, ResourceCacheStats};
use super::{Buffer, DepthStencilState, GraphicsPipeline, Ownership, Sampler, Texture};
use crate::api::*;
use crate::backend::{GpuBackend, PipelineSource};
use crate::config::ResourceCacheConfig;
use crate::dimension::Extent2D;
use crate::error::{PipelineError, ResourceError};
use crate::global_cache::GlobalCache;
use crate::render::RenderStep;
use std::sync::Arc;

/// Creates backend resources and deduplicates the ones that are pure functions of a key.
///
/// Pipelines, depth/stencil states, samplers and wrapped textures are cached; buffers and
/// owned textures are created fresh on every request. Shared by the session and all of
/// its recorders.
#[derive(Debug)]
pub struct ResourceProvider {
    backend: Arc<dyn GpuBackend>,
    global_cache: Arc<GlobalCache>,
    graphics_pipelines: KeyedCache<GraphicsPipelineKey, GraphicsPipeline>,
    depth_stencil_states: KeyedCache<DepthStencilSettings, DepthStencilState>,
    samplers: KeyedCache<SamplerDesc, Sampler>,
    wrapped_textures: KeyedCache<BackendTexture, Texture>,
}

impl ResourceProvider {
    /// Creates an empty provider for `backend`.
    pub fn new(backend: Arc<dyn GpuBackend>, global_cache: Arc<GlobalCache>, config: ResourceCacheConfig) -> Self {
        let policy = config.eviction;
        Self {
            backend,
            global_cache,
            graphics_pipelines: KeyedCache::new("graphics pipeline", policy),
            depth_stencil_states: KeyedCache::new("depth/stencil state", policy),
            samplers: KeyedCache::new("sampler", policy),
            wrapped_textures: KeyedCache::new("wrapped texture", policy),
        }
    }

    /// The backend resources are created on.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    fn check_backend(&self, info: &TextureInfo) -> Result<(), ResourceError> {
        let expected = self.backend.backend_api();
        if info.backend() != Some(expected) {
            return Err(ResourceError::BackendMismatch {
                expected,
                found: info.backend(),
            });
        }
        Ok(())
    }

    /// Returns the pipeline for `desc` compiled against `render_pass`, compiling it on first use.
    pub fn find_or_create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDesc,
        render_pass: &RenderPassDesc,
    ) -> Result<Arc<GraphicsPipeline>, ResourceError> {
        let key = GraphicsPipelineKey {
            desc: *desc,
            render_pass: *render_pass,
        };
        self.graphics_pipelines.find_or_create(&key, || {
            let step = RenderStep::find(desc.render_step())
                .ok_or(PipelineError::UnknownRenderStep(desc.render_step()))?;
            if step.depth_stencil().needs_attachment()
                && !render_pass.depth_stencil_format.is_some_and(|f| f.has_stencil())
            {
                return Err(PipelineError::IncompatibleRenderPass(format!(
                    "step '{}' needs a stencil attachment",
                    step.name()
                ))
                .into());
            }

            let program = match (step.performs_shading(), desc.shader()) {
                (false, _) => None,
                (true, shader) if shader.is_none() => None,
                (true, shader) => Some(
                    self.global_cache
                        .lookup(shader)
                        .ok_or(PipelineError::MissingShaderProgram(shader))?,
                ),
            };
            let source = PipelineSource {
                step,
                program: program.as_deref(),
            };
            let id = self.backend.create_graphics_pipeline(desc, render_pass, &source)?;
            log::debug!("Compiled pipeline {id:?} for {} / {:?}", step.name(), desc.shader());
            Ok(GraphicsPipeline {
                backend: self.backend.clone(),
                id,
                key,
            })
        })
    }

    /// Returns the depth/stencil state for `settings`, creating it on first use.
    pub fn find_or_create_depth_stencil_state(
        &self,
        settings: &DepthStencilSettings,
    ) -> Result<Arc<DepthStencilState>, ResourceError> {
        self.depth_stencil_states.find_or_create(settings, || {
            let id = self.backend.create_depth_stencil_state(settings)?;
            Ok(DepthStencilState {
                backend: self.backend.clone(),
                id,
                settings: *settings,
            })
        })
    }

    /// Returns the sampler for `desc`, creating it on first use.
    pub fn find_or_create_sampler(&self, desc: &SamplerDesc) -> Result<Arc<Sampler>, ResourceError> {
        self.samplers.find_or_create(desc, || {
            let id = self.backend.create_sampler(desc)?;
            Ok(Sampler {
                backend: self.backend.clone(),
                id,
                desc: *desc,
            })
        })
    }

    /// Wraps a host-managed backend texture. Wrapping the same texture twice returns
    /// the same [`Texture`].
    pub fn find_or_wrap_texture(&self, texture: &BackendTexture) -> Result<Arc<Texture>, ResourceError> {
        self.check_backend(texture.info())?;
        if !texture.is_valid() {
            return Err(ResourceError::InvalidDescriptor("backend texture is empty".into()));
        }
        self.wrapped_textures.find_or_create(texture, || {
            let id = self.backend.wrap_backend_texture(texture)?;
            Ok(Texture::new(
                self.backend.clone(),
                id,
                texture.dimensions(),
                *texture.info(),
                Ownership::Wrapped,
            ))
        })
    }

    /// Forgets the cached wrapper of `texture`, so a later wrap goes back to the backend.
    /// Called before the backend texture is deleted.
    pub fn forget_wrapped_texture(&self, texture: &BackendTexture) -> bool {
        self.wrapped_textures.remove(texture)
    }

    /// Creates a new owned texture.
    pub fn create_texture(&self, dimensions: Extent2D, info: &TextureInfo) -> Result<Arc<Texture>, ResourceError> {
        self.check_backend(info)?;
        if !info.is_valid() || dimensions.is_empty() {
            return Err(ResourceError::InvalidDescriptor(format!(
                "cannot create a {}x{} texture from {info:?}",
                dimensions.width, dimensions.height
            )));
        }
        let id = self.backend.create_texture(dimensions, info)?;
        Ok(Arc::new(Texture::new(
            self.backend.clone(),
            id,
            dimensions,
            *info,
            Ownership::Owned,
        )))
    }

    /// Creates a new buffer.
    pub fn create_buffer(
        &self,
        size: u64,
        buffer_type: BufferType,
        prioritize_gpu_reads: PrioritizeGpuReads,
    ) -> Result<Arc<Buffer>, ResourceError> {
        if size == 0 {
            return Err(ResourceError::InvalidDescriptor("buffer size must be non-zero".into()));
        }
        let desc = BufferDesc::new(size, buffer_type, prioritize_gpu_reads);
        let id = self.backend.create_buffer(&desc)?;
        Ok(Arc::new(Buffer::new(self.backend.clone(), id, desc)))
    }

    /// Drops every cached resource that nothing else references.
    pub fn purge_unreferenced(&self) -> usize {
        self.graphics_pipelines.purge_unreferenced()
            + self.depth_stencil_states.purge_unreferenced()
            + self.samplers.purge_unreferenced()
            + self.wrapped_textures.purge_unreferenced()
    }

    /// Hit, miss, creation and eviction counters per cache.
    pub fn stats(&self) -> ResourceCacheStats {
        ResourceCacheStats {
            graphics_pipelines: self.graphics_pipelines.stats(),
            depth_stencil_states: self.depth_stencil_states.stats(),
            samplers: self.samplers.stats(),
            wrapped_textures: self.wrapped_textures.stats(),
        }
    }
}
