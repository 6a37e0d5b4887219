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

use std::ops::Range;
use std::sync::Arc;

use strata_core::api::{
    BufferId, CommandBufferId, DepthStencilStateId, GraphicsPipelineId, LoadOp, RenderPassBegin, StoreOp,
};
use strata_core::backend::CommandEncoder;
use strata_core::ResourceError;

use super::conversions::IntoWgpu;
use super::device::WgpuBackend;

/// A command recorded inside a render pass, with its native objects already resolved.
enum PassCommand {
    SetPipeline(Arc<wgpu::RenderPipeline>),
    SetStencilReference(u32),
    SetVertexBuffer(Arc<wgpu::Buffer>, u64),
    Draw(Range<u32>),
}

struct RecordedPass {
    color: Arc<wgpu::TextureView>,
    depth_stencil: Option<(Arc<wgpu::TextureView>, wgpu::TextureFormat)>,
    load: LoadOp,
    store: StoreOp,
    commands: Vec<PassCommand>,
}

enum RecordedCommand {
    RenderPass(RecordedPass),
    CopyBuffer {
        src: Arc<wgpu::Buffer>,
        dst: Arc<wgpu::Buffer>,
        size: u64,
    },
}

/// Records Strata commands and encodes them into a `wgpu::CommandBuffer` on `finish`.
///
/// `wgpu::RenderPass` borrows its encoder, so passes are buffered and replayed.
/// Handles are resolved while recording: an unknown id fails the call that names it.
pub struct WgpuCommandEncoder {
    backend: WgpuBackend,
    label: Option<String>,
    recorded: Vec<RecordedCommand>,
    open_pass: Option<RecordedPass>,
}

impl WgpuCommandEncoder {
    pub(crate) fn new(backend: WgpuBackend, label: Option<&str>) -> Self {
        Self {
            backend,
            label: label.map(str::to_owned),
            recorded: Vec::new(),
            open_pass: None,
        }
    }

    fn pass_mut(&mut self, what: &str) -> Result<&mut RecordedPass, ResourceError> {
        self.open_pass
            .as_mut()
            .ok_or_else(|| ResourceError::InvalidDescriptor(format!("{what} outside a render pass")))
    }

    fn encode_pass(encoder: &mut wgpu::CommandEncoder, pass: &RecordedPass) {
        let color_attachments = [Some(wgpu::RenderPassColorAttachment {
            view: &pass.color,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: pass.load.into_wgpu(),
                store: pass.store.into_wgpu(),
            },
        })];

        let depth_stencil_attachment =
            pass.depth_stencil
                .as_ref()
                .map(|(view, format)| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: format.has_depth_aspect().then_some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: format.has_stencil_aspect().then_some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Discard,
                    }),
                });

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Strata Render Pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        for command in &pass.commands {
            match command {
                PassCommand::SetPipeline(pipeline) => render_pass.set_pipeline(pipeline),
                PassCommand::SetStencilReference(reference) => render_pass.set_stencil_reference(*reference),
                PassCommand::SetVertexBuffer(buffer, offset) => {
                    render_pass.set_vertex_buffer(0, buffer.slice(*offset..))
                }
                PassCommand::Draw(vertices) => render_pass.draw(vertices.clone(), 0..1),
            }
        }
    }
}

impl CommandEncoder for WgpuCommandEncoder {
    fn begin_render_pass(&mut self, begin: &RenderPassBegin) -> Result<(), ResourceError> {
        if self.open_pass.is_some() {
            return Err(ResourceError::InvalidDescriptor(
                "render pass begun while another is open".into(),
            ));
        }
        let (color, _) = self
            .backend
            .texture_view(begin.color_target)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{:?}", begin.color_target)))?;
        let depth_stencil = begin
            .depth_stencil_target
            .map(|id| {
                self.backend
                    .texture_view(id)
                    .ok_or_else(|| ResourceError::InvalidHandle(format!("{id:?}")))
            })
            .transpose()?;

        self.open_pass = Some(RecordedPass {
            color,
            depth_stencil,
            load: begin.load,
            store: begin.store,
            commands: Vec::new(),
        });
        Ok(())
    }

    fn bind_graphics_pipeline(&mut self, pipeline: GraphicsPipelineId) -> Result<(), ResourceError> {
        let native = self
            .backend
            .render_pipeline(pipeline)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{pipeline:?}")))?;
        self.pass_mut("pipeline bind")?
            .commands
            .push(PassCommand::SetPipeline(native));
        Ok(())
    }

    fn set_depth_stencil_state(
        &mut self,
        state: DepthStencilStateId,
        stencil_reference: u32,
    ) -> Result<(), ResourceError> {
        // The state itself is part of the bound pipeline; only the reference is dynamic.
        if !self.backend.has_depth_stencil_state(state) {
            return Err(ResourceError::InvalidHandle(format!("{state:?}")));
        }
        self.pass_mut("depth/stencil bind")?
            .commands
            .push(PassCommand::SetStencilReference(stencil_reference));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId, offset: u64) -> Result<(), ResourceError> {
        let (native, size) = self
            .backend
            .buffer(buffer)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{buffer:?}")))?;
        if offset > size {
            return Err(ResourceError::InvalidDescriptor(format!(
                "vertex offset {offset} past the end of {buffer:?} ({size} bytes)"
            )));
        }
        self.pass_mut("vertex buffer bind")?
            .commands
            .push(PassCommand::SetVertexBuffer(native, offset));
        Ok(())
    }

    fn draw(&mut self, vertices: Range<u32>) -> Result<(), ResourceError> {
        self.pass_mut("draw")?.commands.push(PassCommand::Draw(vertices));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<(), ResourceError> {
        let pass = self
            .open_pass
            .take()
            .ok_or_else(|| ResourceError::InvalidDescriptor("no render pass to end".into()))?;
        self.recorded.push(RecordedCommand::RenderPass(pass));
        Ok(())
    }

    fn copy_buffer_to_buffer(&mut self, src: BufferId, dst: BufferId, size: u64) -> Result<(), ResourceError> {
        if self.open_pass.is_some() {
            return Err(ResourceError::InvalidDescriptor("copy inside a render pass".into()));
        }
        let (src_native, src_size) = self
            .backend
            .buffer(src)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{src:?}")))?;
        let (dst_native, dst_size) = self
            .backend
            .buffer(dst)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{dst:?}")))?;
        if size > src_size || size > dst_size {
            return Err(ResourceError::InvalidDescriptor(format!(
                "copy of {size} bytes exceeds {src:?} ({src_size}) or {dst:?} ({dst_size})"
            )));
        }
        self.recorded.push(RecordedCommand::CopyBuffer {
            src: src_native,
            dst: dst_native,
            size,
        });
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<CommandBufferId, ResourceError> {
        if self.open_pass.is_some() {
            return Err(ResourceError::InvalidDescriptor(
                "command encoder finished inside a render pass".into(),
            ));
        }

        let mut encoder = self
            .backend
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: self.label.as_deref(),
            });
        for command in &self.recorded {
            match command {
                RecordedCommand::RenderPass(pass) => Self::encode_pass(&mut encoder, pass),
                RecordedCommand::CopyBuffer { src, dst, size } => {
                    // Native allocations are padded to the copy alignment.
                    let size = wgpu::util::align_to(*size, wgpu::COPY_BUFFER_ALIGNMENT);
                    if size > 0 {
                        encoder.copy_buffer_to_buffer(src, 0, dst, 0, size);
                    }
                }
            }
        }
        Ok(self.backend.register_command_buffer(encoder.finish()))
    }
}
