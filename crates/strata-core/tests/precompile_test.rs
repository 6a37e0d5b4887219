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

use std::collections::HashSet;
use std::sync::Arc;
use strata_core::api::*;
use strata_core::mock::MockBackend;
use strata_core::paint::{BlendMode, PaintCombo, ShaderType};
use strata_core::render::RenderStep;
use strata_core::{Session, SessionOptions};

fn session(eager: bool) -> (MockBackend, Session) {
    let mock = MockBackend::new();
    let options = SessionOptions {
        eager_pipeline_compilation: eager,
        ..Default::default()
    };
    (mock.clone(), Session::make_with_backend(Arc::new(mock), options))
}

#[test]
fn warm_up_is_idempotent() {
    let (_mock, session) = session(false);
    let combo = PaintCombo::all();

    let first = session.pre_compile(&combo);
    let programs = session.global_cache().len();
    let second = session.pre_compile(&combo);

    assert_eq!(first, second);
    assert_eq!(session.global_cache().len(), programs);
}

#[test]
fn full_warm_up_collapses_equivalent_configurations() {
    let (_mock, session) = session(false);
    let descs = session.pre_compile(&PaintCombo::all());

    // 15 distinct blends (multiply shares modulate) times 17 distinct shaders:
    // one solid color, three gradients with four tile modes each, and four images.
    assert_eq!(session.global_cache().len(), 255);
    // Four stencil steps without a shader plus two cover steps per key.
    assert_eq!(descs.len(), 4 + 2 * 255);
}

#[test]
fn non_shading_steps_use_the_none_sentinel() {
    let (_mock, session) = session(false);
    let combo = PaintCombo::new(
        [BlendMode::SrcOver],
        [ShaderType::LinearGradient],
        [TileMode::Clamp, TileMode::Repeat],
    );
    let descs = session.pre_compile(&combo);

    for desc in &descs {
        let step = RenderStep::find(desc.render_step()).unwrap();
        assert_eq!(step.performs_shading(), !desc.shader().is_none(), "{desc:?}");
    }
    assert_eq!(descs.len(), 4 + 2 * 2);
}

#[test]
fn tile_modes_do_not_multiply_solid_color_keys() {
    let (_mock, session) = session(false);
    let combo = PaintCombo::new(
        [BlendMode::SrcOver],
        [ShaderType::SolidColor, ShaderType::None],
        TileMode::ALL,
    );
    let descs = session.pre_compile(&combo);
    let shaders: HashSet<_> = descs.iter().map(|d| d.shader()).filter(|s| !s.is_none()).collect();
    assert_eq!(shaders.len(), 1);
}

#[test]
fn conical_gradients_reuse_the_radial_key() {
    let (_mock, session) = session(false);
    let radial = session.pre_compile(&PaintCombo::new([BlendMode::Src], [ShaderType::RadialGradient], [TileMode::Decal]));
    let conical = session.pre_compile(&PaintCombo::new(
        [BlendMode::Src],
        [ShaderType::TwoPointConicalGradient],
        [TileMode::Decal],
    ));
    assert_eq!(radial, conical);
}

#[test]
fn warm_up_is_lazy_by_default() {
    let (mock, session) = session(false);
    session.pre_compile(&PaintCombo::all());
    assert_eq!(mock.stats().pipelines_created, 0);
}

#[test]
fn eager_warm_up_compiles_each_description_once() {
    let (mock, session) = session(true);
    let combo = PaintCombo::new(
        [BlendMode::SrcOver, BlendMode::Plus],
        [ShaderType::Image],
        [TileMode::Clamp],
    );

    let descs = session.pre_compile(&combo);
    assert_eq!(mock.stats().pipelines_created, descs.len());

    session.pre_compile(&combo);
    assert_eq!(mock.stats().pipelines_created, descs.len());
}

#[test]
fn eager_warm_up_failures_are_not_fatal() {
    let (mock, session) = session(true);
    mock.set_fail_pipeline_creation(true);
    let combo = PaintCombo::new([BlendMode::SrcOver], [ShaderType::SolidColor], [TileMode::Clamp]);

    let descs = session.pre_compile(&combo);

    assert_eq!(descs.len(), 4 + 2);
    assert_eq!(mock.stats().pipelines_created, 0);
    let stats = session.resource_provider().stats().graphics_pipelines;
    assert_eq!(stats.creations, 0);
    assert_eq!(stats.misses, descs.len() as u64);
}
