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

//! Backend resources owned through `Arc` and the cache that shares them.
//!
//! Each wrapper holds the backend that created it and releases the native object
//! when the last reference drops.

pub mod cache;
pub mod provider;

pub use self::cache::{CacheStats, ResourceCacheStats};
pub use self::provider::ResourceProvider;

use crate::api::*;
use crate::backend::GpuBackend;
use crate::dimension::Extent2D;
use std::sync::Arc;

/// Whether a [`Texture`] owns its native object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Created by the cache; destroyed on drop.
    Owned,
    /// Wrapped from a [`BackendTexture`]; only unwrapped on drop.
    Wrapped,
}

/// A texture usable as a draw target or copy endpoint.
#[derive(Debug)]
pub struct Texture {
    backend: Arc<dyn GpuBackend>,
    id: TextureId,
    dimensions: Extent2D,
    info: TextureInfo,
    ownership: Ownership,
}

impl Texture {
    pub(crate) fn new(
        backend: Arc<dyn GpuBackend>,
        id: TextureId,
        dimensions: Extent2D,
        info: TextureInfo,
        ownership: Ownership,
    ) -> Self {
        Self {
            backend,
            id,
            dimensions,
            info,
            ownership,
        }
    }

    /// Backend id.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Size in texels.
    pub fn dimensions(&self) -> Extent2D {
        self.dimensions
    }

    /// Format and usage.
    pub fn info(&self) -> &TextureInfo {
        &self.info
    }

    /// Owned or wrapped.
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        let result = match self.ownership {
            Ownership::Owned => self.backend.destroy_texture(self.id),
            Ownership::Wrapped => self.backend.unwrap_texture(self.id),
        };
        if let Err(e) = result {
            log::warn!("Failed to release texture {:?}: {e}", self.id);
        }
    }
}

/// A GPU buffer.
#[derive(Debug)]
pub struct Buffer {
    backend: Arc<dyn GpuBackend>,
    id: BufferId,
    desc: BufferDesc,
}

impl Buffer {
    pub(crate) fn new(backend: Arc<dyn GpuBackend>, id: BufferId, desc: BufferDesc) -> Self {
        Self { backend, id, desc }
    }

    /// Backend id.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Size, kind and placement hint.
    pub fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.desc.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Err(e) = self.backend.destroy_buffer(self.id) {
            log::warn!("Failed to destroy buffer {:?}: {e}", self.id);
        }
    }
}

/// A sampler.
#[derive(Debug)]
pub struct Sampler {
    backend: Arc<dyn GpuBackend>,
    id: SamplerId,
    desc: SamplerDesc,
}

impl Sampler {
    /// Backend id.
    pub fn id(&self) -> SamplerId {
        self.id
    }

    /// Key the sampler was created from.
    pub fn desc(&self) -> &SamplerDesc {
        &self.desc
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        if let Err(e) = self.backend.destroy_sampler(self.id) {
            log::warn!("Failed to destroy sampler {:?}: {e}", self.id);
        }
    }
}

/// A compiled graphics pipeline.
#[derive(Debug)]
pub struct GraphicsPipeline {
    backend: Arc<dyn GpuBackend>,
    id: GraphicsPipelineId,
    key: GraphicsPipelineKey,
}

impl GraphicsPipeline {
    /// Backend id.
    pub fn id(&self) -> GraphicsPipelineId {
        self.id
    }

    /// Key the pipeline was compiled for.
    pub fn key(&self) -> &GraphicsPipelineKey {
        &self.key
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        if let Err(e) = self.backend.destroy_graphics_pipeline(self.id) {
            log::warn!("Failed to destroy pipeline {:?}: {e}", self.id);
        }
    }
}

/// A depth/stencil state object.
#[derive(Debug)]
pub struct DepthStencilState {
    backend: Arc<dyn GpuBackend>,
    id: DepthStencilStateId,
    settings: DepthStencilSettings,
}

impl DepthStencilState {
    /// Backend id.
    pub fn id(&self) -> DepthStencilStateId {
        self.id
    }

    /// Settings the state was created from.
    pub fn settings(&self) -> &DepthStencilSettings {
        &self.settings
    }
}

impl Drop for DepthStencilState {
    fn drop(&mut self) {
        if let Err(e) = self.backend.destroy_depth_stencil_state(self.id) {
            log::warn!("Failed to destroy depth/stencil state {:?}: {e}", self.id);
        }
    }
}
