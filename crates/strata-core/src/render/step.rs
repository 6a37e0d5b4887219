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

//! A [`RenderStep`] is one geometric pass of a draw: stencil the path, or cover it
//! and shade. A [`Renderer`] is the ordered list of steps for one way of filling paths.

use crate::api::{
    CompareFunction, DepthStencilSettings, PrimitiveTopology, RenderStepId, StencilFaceSettings,
    StencilOperation,
};
use bytemuck::{Pod, Zeroable};

/// Vertex layout shared by every stock render step.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Position in normalized device coordinates.
    pub position: [f32; 2],
    /// Premultiplied RGBA color.
    pub color: [f32; 4],
}

impl Vertex {
    /// Size of one vertex in bytes.
    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

    /// Creates a vertex.
    pub const fn new(position: [f32; 2], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// How the interior of a path is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillType {
    /// Non-zero winding.
    Winding,
    /// Even-odd parity.
    EvenOdd,
    /// Complement of non-zero winding.
    InverseWinding,
    /// Complement of even-odd parity.
    InverseEvenOdd,
}

impl FillType {
    /// All fill types, in declaration order.
    pub const ALL: [FillType; 4] = [
        FillType::Winding,
        FillType::EvenOdd,
        FillType::InverseWinding,
        FillType::InverseEvenOdd,
    ];

    /// `true` for the inverse fills.
    pub const fn is_inverse(self) -> bool {
        matches!(self, FillType::InverseWinding | FillType::InverseEvenOdd)
    }

    /// `true` for the even-odd fills.
    pub const fn is_even_odd(self) -> bool {
        matches!(self, FillType::EvenOdd | FillType::InverseEvenOdd)
    }

    const fn index(self) -> usize {
        match self {
            FillType::Winding => 0,
            FillType::EvenOdd => 1,
            FillType::InverseWinding => 2,
            FillType::InverseEvenOdd => 3,
        }
    }
}

/// One pass of a renderer.
#[derive(Debug, PartialEq, Eq)]
pub struct RenderStep {
    id: RenderStepId,
    name: &'static str,
    performs_shading: bool,
    topology: PrimitiveTopology,
    depth_stencil: DepthStencilSettings,
}

impl RenderStep {
    /// Stable id.
    pub fn id(&self) -> RenderStepId {
        self.id
    }

    /// Name used in labels and logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `true` when the step writes color and therefore takes a shading key.
    pub fn performs_shading(&self) -> bool {
        self.performs_shading
    }

    /// Primitive assembly.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Depth/stencil state the step runs with.
    pub fn depth_stencil(&self) -> &DepthStencilSettings {
        &self.depth_stencil
    }

    /// Looks up a stock step by id.
    pub fn find(id: RenderStepId) -> Option<&'static RenderStep> {
        ALL_STEPS.iter().copied().find(|step| step.id == id)
    }

    /// All stock steps.
    pub fn all() -> &'static [&'static RenderStep] {
        &ALL_STEPS
    }
}

const fn face(compare: CompareFunction, fail: StencilOperation, pass: StencilOperation, write_mask: u32) -> StencilFaceSettings {
    StencilFaceSettings {
        compare,
        fail_op: fail,
        depth_fail_op: pass,
        pass_op: pass,
        read_mask: 0xff,
        write_mask,
    }
}

const WINDING_STENCIL: DepthStencilSettings = DepthStencilSettings::two_sided(
    face(CompareFunction::Always, StencilOperation::Keep, StencilOperation::IncrementWrap, 0xff),
    face(CompareFunction::Always, StencilOperation::Keep, StencilOperation::DecrementWrap, 0xff),
    0,
);

const EVEN_ODD_STENCIL: DepthStencilSettings = DepthStencilSettings::stencil(
    face(CompareFunction::Always, StencilOperation::Keep, StencilOperation::Invert, 0xff),
    0,
);

/// Passes where the path stencilled a non-zero value and resets it.
const COVER: DepthStencilSettings = DepthStencilSettings::stencil(
    face(CompareFunction::NotEqual, StencilOperation::Zero, StencilOperation::Zero, 0xff),
    0,
);

/// Passes where the path left zero; resets the covered interior.
const INVERSE_COVER: DepthStencilSettings = DepthStencilSettings::stencil(
    face(CompareFunction::Equal, StencilOperation::Zero, StencilOperation::Keep, 0xff),
    0,
);

const fn stencil_step(id: u32, name: &'static str, depth_stencil: DepthStencilSettings) -> RenderStep {
    RenderStep {
        id: RenderStepId(id),
        name,
        performs_shading: false,
        topology: PrimitiveTopology::TriangleList,
        depth_stencil,
    }
}

const fn cover_step(id: u32, name: &'static str, depth_stencil: DepthStencilSettings) -> RenderStep {
    RenderStep {
        id: RenderStepId(id),
        name,
        performs_shading: true,
        topology: PrimitiveTopology::TriangleList,
        depth_stencil,
    }
}

static STENCIL_CURVES_WINDING: RenderStep = stencil_step(0, "stencil-curves-winding", WINDING_STENCIL);
static STENCIL_CURVES_EVEN_ODD: RenderStep = stencil_step(1, "stencil-curves-evenodd", EVEN_ODD_STENCIL);
static STENCIL_WEDGES_WINDING: RenderStep = stencil_step(2, "stencil-wedges-winding", WINDING_STENCIL);
static STENCIL_WEDGES_EVEN_ODD: RenderStep = stencil_step(3, "stencil-wedges-evenodd", EVEN_ODD_STENCIL);
static COVER_STEP: RenderStep = cover_step(4, "cover", COVER);
static INVERSE_COVER_STEP: RenderStep = cover_step(5, "cover-inverse", INVERSE_COVER);

static ALL_STEPS: [&RenderStep; 6] = [
    &STENCIL_CURVES_WINDING,
    &STENCIL_CURVES_EVEN_ODD,
    &STENCIL_WEDGES_WINDING,
    &STENCIL_WEDGES_EVEN_ODD,
    &COVER_STEP,
    &INVERSE_COVER_STEP,
];

/// An ordered list of render steps drawing one kind of geometry.
#[derive(Debug, PartialEq, Eq)]
pub struct Renderer {
    name: &'static str,
    fill: FillType,
    steps: [&'static RenderStep; 2],
}

impl Renderer {
    /// Name used in labels and logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fill rule the renderer implements.
    pub fn fill_type(&self) -> FillType {
        self.fill
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[&'static RenderStep] {
        &self.steps
    }

    /// Stencils a tessellation of curves and triangles, then covers its bounds.
    pub fn stencil_tessellated_curves_and_tris(fill: FillType) -> &'static Renderer {
        &CURVES_AND_TRIS[fill.index()]
    }

    /// Stencils a fan of wedges, then covers its bounds.
    pub fn stencil_tessellated_wedges(fill: FillType) -> &'static Renderer {
        &WEDGES[fill.index()]
    }

    /// Every stock renderer.
    pub fn stock() -> impl Iterator<Item = &'static Renderer> {
        CURVES_AND_TRIS.iter().chain(WEDGES.iter())
    }
}

const fn renderer(
    name: &'static str,
    fill: FillType,
    stencil: &'static RenderStep,
    cover: &'static RenderStep,
) -> Renderer {
    Renderer {
        name,
        fill,
        steps: [stencil, cover],
    }
}

static CURVES_AND_TRIS: [Renderer; 4] = [
    renderer("curves-winding", FillType::Winding, &STENCIL_CURVES_WINDING, &COVER_STEP),
    renderer("curves-evenodd", FillType::EvenOdd, &STENCIL_CURVES_EVEN_ODD, &COVER_STEP),
    renderer("curves-inverse-winding", FillType::InverseWinding, &STENCIL_CURVES_WINDING, &INVERSE_COVER_STEP),
    renderer("curves-inverse-evenodd", FillType::InverseEvenOdd, &STENCIL_CURVES_EVEN_ODD, &INVERSE_COVER_STEP),
];

static WEDGES: [Renderer; 4] = [
    renderer("wedges-winding", FillType::Winding, &STENCIL_WEDGES_WINDING, &COVER_STEP),
    renderer("wedges-evenodd", FillType::EvenOdd, &STENCIL_WEDGES_EVEN_ODD, &COVER_STEP),
    renderer("wedges-inverse-winding", FillType::InverseWinding, &STENCIL_WEDGES_WINDING, &INVERSE_COVER_STEP),
    renderer("wedges-inverse-evenodd", FillType::InverseEvenOdd, &STENCIL_WEDGES_EVEN_ODD, &INVERSE_COVER_STEP),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn eight_stock_renderers_over_six_steps() {
        assert_eq!(Renderer::stock().count(), 8);
        let ids: HashSet<_> = Renderer::stock()
            .flat_map(|r| r.steps().iter().map(|s| s.id()))
            .collect();
        assert_eq!(ids.len(), 6);
        for id in ids {
            assert_eq!(RenderStep::find(id).map(|s| s.id()), Some(id));
        }
    }

    #[test]
    fn first_step_stencils_second_step_shades() {
        for renderer in Renderer::stock() {
            let [stencil, cover] = renderer.steps() else {
                panic!("stock renderers have two steps");
            };
            assert!(!stencil.performs_shading());
            assert!(cover.performs_shading());
            assert_ne!(stencil.depth_stencil(), cover.depth_stencil());
            assert_eq!(renderer.fill_type().is_inverse(), cover.id() == INVERSE_COVER_STEP.id());
        }
    }

    #[test]
    fn winding_increments_front_and_decrements_back() {
        let winding = Renderer::stencil_tessellated_wedges(FillType::Winding).steps()[0].depth_stencil();
        assert_eq!(winding.front.pass_op, StencilOperation::IncrementWrap);
        assert_eq!(winding.back.pass_op, StencilOperation::DecrementWrap);

        let even_odd = Renderer::stencil_tessellated_curves_and_tris(FillType::EvenOdd).steps()[0].depth_stencil();
        assert_eq!(even_odd.front.pass_op, StencilOperation::Invert);
        assert!(even_odd.needs_attachment());
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 24);
        let vertex = Vertex::new([1.0, 2.0], [0.0; 4]);
        let bytes = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 24);
    }
}
