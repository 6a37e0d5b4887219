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

//! The [`CommandEncoder`] trait.

use crate::api::{BufferId, CommandBufferId, DepthStencilStateId, GraphicsPipelineId, RenderPassBegin};
use crate::error::ResourceError;
use std::ops::Range;

/// Records commands into a native command buffer.
///
/// Render pass commands are only valid between [`begin_render_pass`](Self::begin_render_pass)
/// and [`end_render_pass`](Self::end_render_pass); copies are only valid outside a pass.
pub trait CommandEncoder: Send {
    /// Opens a render pass.
    fn begin_render_pass(&mut self, begin: &RenderPassBegin) -> Result<(), ResourceError>;

    /// Binds a pipeline for subsequent draws.
    fn bind_graphics_pipeline(&mut self, pipeline: GraphicsPipelineId) -> Result<(), ResourceError>;

    /// Binds a depth/stencil state and its stencil reference value.
    fn set_depth_stencil_state(&mut self, state: DepthStencilStateId, stencil_reference: u32) -> Result<(), ResourceError>;

    /// Binds a vertex buffer to slot 0.
    fn bind_vertex_buffer(&mut self, buffer: BufferId, offset: u64) -> Result<(), ResourceError>;

    /// Records a non-indexed draw.
    fn draw(&mut self, vertices: Range<u32>) -> Result<(), ResourceError>;

    /// Closes the open render pass.
    fn end_render_pass(&mut self) -> Result<(), ResourceError>;

    /// Copies `size` bytes from the start of `src` to the start of `dst`.
    fn copy_buffer_to_buffer(&mut self, src: BufferId, dst: BufferId, size: u64) -> Result<(), ResourceError>;

    /// Finishes encoding.
    fn finish(self: Box<Self>) -> Result<CommandBufferId, ResourceError>;
}
