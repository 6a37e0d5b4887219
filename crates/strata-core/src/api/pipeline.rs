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

//! Pipeline descriptions and the keys the resource cache stores pipelines under.

use super::enums::{SampleCount, TextureFormat};
use serde::{Deserialize, Serialize};

/// Opaque handle to a compiled graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphicsPipelineId(pub u64);

/// Identity of a render step. Stable for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderStepId(pub u32);

/// Identifier of an interned shading key in the shader code dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniquePaintParamsId(pub u32);

impl UniquePaintParamsId {
    /// Sentinel used by render steps that do not shade.
    pub const NONE: Self = Self(u32::MAX);

    /// `true` for the "no shader" sentinel.
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// Identifies the program of a pipeline: which render step draws, and which
/// shading key colors its fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphicsPipelineDesc {
    render_step: RenderStepId,
    shader: UniquePaintParamsId,
}

impl GraphicsPipelineDesc {
    /// Creates a description.
    pub const fn new(render_step: RenderStepId, shader: UniquePaintParamsId) -> Self {
        Self { render_step, shader }
    }

    /// Render step half.
    pub fn render_step(&self) -> RenderStepId {
        self.render_step
    }

    /// Shading half, [`UniquePaintParamsId::NONE`] for non-shading steps.
    pub fn shader(&self) -> UniquePaintParamsId {
        self.shader
    }
}

/// Attachment configuration a pipeline is compiled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPassDesc {
    /// Format of the color attachment.
    pub color_format: TextureFormat,
    /// Format of the depth/stencil attachment, if any.
    pub depth_stencil_format: Option<TextureFormat>,
    /// Sample count of every attachment.
    pub sample_count: SampleCount,
}

impl Default for RenderPassDesc {
    fn default() -> Self {
        Self {
            color_format: TextureFormat::Rgba8Unorm,
            depth_stencil_format: Some(TextureFormat::Depth24PlusStencil8),
            sample_count: SampleCount::X1,
        }
    }
}

/// Full cache key of a compiled pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphicsPipelineKey {
    /// Program half.
    pub desc: GraphicsPipelineDesc,
    /// Attachment half.
    pub render_pass: RenderPassDesc,
}

/// Fixed-function blend coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// 0
    Zero,
    /// 1
    One,
    /// Source color.
    Src,
    /// 1 - source color.
    OneMinusSrc,
    /// Destination color.
    Dst,
    /// 1 - destination color.
    OneMinusDst,
    /// Source alpha.
    SrcAlpha,
    /// 1 - source alpha.
    OneMinusSrcAlpha,
    /// Destination alpha.
    DstAlpha,
    /// 1 - destination alpha.
    OneMinusDstAlpha,
}

/// `src * src_factor + dst * dst_factor`, applied to every channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFormula {
    /// Coefficient of the source color.
    pub src_factor: BlendFactor,
    /// Coefficient of the destination color.
    pub dst_factor: BlendFactor,
}

impl BlendFormula {
    /// Creates a formula.
    pub const fn new(src_factor: BlendFactor, dst_factor: BlendFactor) -> Self {
        Self { src_factor, dst_factor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_differ_by_either_half() {
        let stencil = GraphicsPipelineDesc::new(RenderStepId(0), UniquePaintParamsId::NONE);
        assert!(stencil.shader().is_none());

        let cover = GraphicsPipelineDesc::new(RenderStepId(4), UniquePaintParamsId(7));
        assert_eq!(cover.render_step(), RenderStepId(4));
        assert_eq!(cover.shader(), UniquePaintParamsId(7));
        assert_ne!(cover, GraphicsPipelineDesc::new(RenderStepId(4), UniquePaintParamsId(8)));
        assert_ne!(cover, GraphicsPipelineDesc::new(RenderStepId(5), UniquePaintParamsId(7)));
    }

    #[test]
    fn render_pass_desc_fills_missing_json_fields() {
        let desc: RenderPassDesc = serde_json::from_str(r#"{ "color_format": "Bgra8Unorm" }"#).unwrap();
        assert_eq!(desc.color_format, TextureFormat::Bgra8Unorm);
        assert_eq!(desc.depth_stencil_format, Some(TextureFormat::Depth24PlusStencil8));
        assert_eq!(desc.sample_count, SampleCount::X1);
    }
}
