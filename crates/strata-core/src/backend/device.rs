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

//! The [`GpuBackend`] trait.

use crate::api::*;
use crate::backend::CommandEncoder;
use crate::dimension::Extent2D;
use crate::error::ResourceError;
use crate::paint::ShaderProgram;
use crate::render::RenderStep;
use std::fmt::Debug;

/// Everything a backend needs to compile a pipeline besides its key.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSource<'a> {
    /// The render step the pipeline draws.
    pub step: &'a RenderStep,
    /// The shading program, `None` for non-shading steps.
    pub program: Option<&'a ShaderProgram>,
}

/// A logical GPU device able to create resources, record commands and report completion.
///
/// Handles returned by the backend are opaque ids; the owning wrappers in
/// [`crate::resource`] release them on drop.
pub trait GpuBackend: Send + Sync + Debug + 'static {
    /// The native API this backend drives.
    fn backend_api(&self) -> BackendApi;

    /// Creates a texture owned by the backend.
    /// ## Arguments
    /// * `dimensions` - Size in texels. Must not be empty.
    /// * `info` - Format, usage, sample and mip counts.
    /// ## Errors
    /// * `ResourceError::InvalidDescriptor` - If the info is malformed.
    fn create_texture(&self, dimensions: Extent2D, info: &TextureInfo) -> Result<TextureId, ResourceError>;

    /// Destroys a texture created with [`create_texture`](Self::create_texture).
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Creates a buffer.
    /// ## Arguments
    /// * `desc` - Size, contents kind and placement hint.
    /// ## Returns
    /// The id of the new buffer.
    fn create_buffer(&self, desc: &BufferDesc) -> Result<BufferId, ResourceError>;

    /// Writes `data` into a buffer at `offset`.
    /// ## Errors
    /// * `ResourceError::InvalidDescriptor` - If the write is out of bounds.
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Destroys a buffer.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Creates a sampler.
    fn create_sampler(&self, desc: &SamplerDesc) -> Result<SamplerId, ResourceError>;

    /// Destroys a sampler.
    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError>;

    /// Compiles a graphics pipeline.
    /// ## Arguments
    /// * `desc` - Render step and shading key.
    /// * `render_pass` - Attachment formats the pipeline must be compatible with.
    /// * `source` - The resolved render step and shading program for `desc`.
    /// ## Errors
    /// * `ResourceError::Pipeline` - If the backend fails to compile the pipeline.
    fn create_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDesc,
        render_pass: &RenderPassDesc,
        source: &PipelineSource<'_>,
    ) -> Result<GraphicsPipelineId, ResourceError>;

    /// Destroys a graphics pipeline.
    fn destroy_graphics_pipeline(&self, id: GraphicsPipelineId) -> Result<(), ResourceError>;

    /// Creates a depth/stencil state object.
    fn create_depth_stencil_state(&self, settings: &DepthStencilSettings) -> Result<DepthStencilStateId, ResourceError>;

    /// Destroys a depth/stencil state object.
    fn destroy_depth_stencil_state(&self, id: DepthStencilStateId) -> Result<(), ResourceError>;

    /// Creates a command encoder.
    /// ## Arguments
    /// * `label` - Optional debug label.
    fn create_command_encoder(&self, label: Option<&str>) -> Result<Box<dyn CommandEncoder>, ResourceError>;

    /// Submits a finished command buffer. Buffers are executed in submission order.
    /// ## Returns
    /// A [`SubmissionId`] that [`poll_completed`](Self::poll_completed) reports once the work is done.
    fn submit(&self, command_buffer: CommandBufferId) -> Result<SubmissionId, ResourceError>;

    /// Releases a finished command buffer that will never be submitted.
    fn discard_command_buffer(&self, command_buffer: CommandBufferId);

    /// Reports submissions that completed since the previous call.
    /// ## Arguments
    /// * `wait` - Block until every outstanding submission has completed.
    fn poll_completed(&self, wait: bool) -> Result<Vec<SubmissionId>, ResourceError>;

    /// Allocates a texture outside the resource cache, for the host to manage.
    fn create_backend_texture(&self, dimensions: Extent2D, info: &TextureInfo) -> Result<BackendTexture, ResourceError>;

    /// Frees a texture allocated by [`create_backend_texture`](Self::create_backend_texture).
    fn delete_backend_texture(&self, texture: &BackendTexture) -> Result<(), ResourceError>;

    /// Exposes a backend texture as a [`TextureId`] usable in command encoders.
    /// The native texture is not owned by the returned id.
    fn wrap_backend_texture(&self, texture: &BackendTexture) -> Result<TextureId, ResourceError>;

    /// Releases an id obtained from [`wrap_backend_texture`](Self::wrap_backend_texture)
    /// without freeing the native texture.
    fn unwrap_texture(&self, id: TextureId) -> Result<(), ResourceError>;
}
