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

//! WGSL module assembly around the generated shading programs.

use strata_core::backend::PipelineSource;

/// Vertex stage shared by every render step. Positions arrive in normalized device
/// coordinates and double as the local coordinates the shading programs sample.
const VERTEX_STAGE: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(in.position, 0.0, 1.0);
    out.local = in.position;
    out.color = in.color;
    return out;
}
"#;

const SHADING_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return shade(in.local, in.color);
}
"#;

/// Stencil steps write no color; the pipeline masks every channel.
const STENCIL_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(0.0);
}
"#;

/// Used by shading steps compiled without a shading key.
const PASSTHROUGH_SHADE: &str = r#"
fn shade(local: vec2<f32>, color: vec4<f32>) -> vec4<f32> {
    return color;
}
"#;

pub(crate) const VERTEX_ENTRY_POINT: &str = "vs_main";
pub(crate) const FRAGMENT_ENTRY_POINT: &str = "fs_main";

/// Builds the complete WGSL module for a pipeline.
pub(crate) fn pipeline_module_source(source: &PipelineSource<'_>) -> String {
    let mut module = format!("// {}\n", source.step.name());
    module.push_str(VERTEX_STAGE);

    if source.step.performs_shading() {
        match source.program {
            Some(program) => module.push_str(program.text()),
            None => module.push_str(PASSTHROUGH_SHADE),
        }
        module.push_str(SHADING_FRAGMENT);
    } else {
        module.push_str(STENCIL_FRAGMENT);
    }
    module
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::api::TileMode;
    use strata_core::paint::{BlendMode, PaintParams, PaintParamsKeyBuilder, ShaderCodeDictionary, ShaderType};
    use strata_core::render::{FillType, Renderer};

    #[test]
    fn stencil_steps_ignore_the_program() {
        let step = Renderer::stencil_tessellated_curves_and_tris(FillType::EvenOdd).steps()[0];
        let text = pipeline_module_source(&PipelineSource { step, program: None });
        assert!(text.contains("fn vs_main"));
        assert!(text.contains("vec4<f32>(0.0)"));
        assert!(!text.contains("fn shade"));
    }

    #[test]
    fn cover_steps_call_the_generated_shade_function() {
        let dict = ShaderCodeDictionary::new();
        let key = PaintParams::new(ShaderType::Image, TileMode::Mirror, BlendMode::SrcOver)
            .to_key(&mut PaintParamsKeyBuilder::new());
        let program = dict.find_or_create(key);
        let step = Renderer::stencil_tessellated_wedges(FillType::Winding).steps()[1];

        let text = pipeline_module_source(&PipelineSource {
            step,
            program: Some(&*program),
        });
        assert!(text.contains(program.text()));
        assert!(text.contains("return shade(in.local, in.color);"));
        assert_eq!(text.matches("fn shade(").count(), 1);
    }

    #[test]
    fn cover_steps_without_a_key_pass_the_color_through() {
        let step = Renderer::stencil_tessellated_wedges(FillType::InverseWinding).steps()[1];
        let text = pipeline_module_source(&PipelineSource { step, program: None });
        assert!(text.contains(PASSTHROUGH_SHADE));
    }
}
