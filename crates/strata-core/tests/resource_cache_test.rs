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
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use strata_core::api::*;
use strata_core::mock::MockBackend;
use strata_core::paint::{create_key, BlendMode, PaintParamsKeyBuilder, ShaderType};
use strata_core::render::{FillType, RenderStep, Renderer};
use strata_core::{EvictionPolicy, Extent2D, PipelineError, ResourceCacheConfig, ResourceError, Session, SessionOptions};

fn session_with(policy: EvictionPolicy) -> (MockBackend, Session) {
    let mock = MockBackend::new();
    let options = SessionOptions {
        resource_cache: ResourceCacheConfig { eviction: policy },
        ..Default::default()
    };
    (mock.clone(), Session::make_with_backend(Arc::new(mock), options))
}

fn cover_desc(session: &Session, shader_type: ShaderType, tile_mode: TileMode) -> GraphicsPipelineDesc {
    let shading = create_key(
        session.global_cache().shader_code_dictionary(),
        &mut PaintParamsKeyBuilder::new(),
        shader_type,
        tile_mode,
        BlendMode::SrcOver,
    );
    let cover = Renderer::stencil_tessellated_wedges(FillType::Winding).steps()[1];
    GraphicsPipelineDesc::new(cover.id(), shading)
}

#[test]
fn equal_descriptions_share_one_pipeline() {
    let (mock, session) = session_with(EvictionPolicy::RetainAll);
    let provider = session.resource_provider();
    let desc = cover_desc(&session, ShaderType::LinearGradient, TileMode::Repeat);
    let render_pass = RenderPassDesc::default();

    let a = provider.find_or_create_graphics_pipeline(&desc, &render_pass).unwrap();
    let b = provider.find_or_create_graphics_pipeline(&desc, &render_pass).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(mock.stats().pipelines_created, 1);
    let stats = provider.stats().graphics_pipelines;
    assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
}

#[test]
fn render_pass_is_part_of_the_pipeline_key() {
    let (mock, session) = session_with(EvictionPolicy::RetainAll);
    let provider = session.resource_provider();
    let desc = cover_desc(&session, ShaderType::SolidColor, TileMode::Clamp);
    let bgra = RenderPassDesc {
        color_format: TextureFormat::Bgra8Unorm,
        ..Default::default()
    };

    let a = provider.find_or_create_graphics_pipeline(&desc, &RenderPassDesc::default()).unwrap();
    let b = provider.find_or_create_graphics_pipeline(&desc, &bgra).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(mock.stats().pipelines_created, 2);
}

#[test]
fn concurrent_requests_compile_once() {
    let (mock, session) = session_with(EvictionPolicy::RetainAll);
    mock.set_creation_delay(Duration::from_millis(25));
    let provider = Arc::clone(session.resource_provider());
    let desc = cover_desc(&session, ShaderType::Image, TileMode::Mirror);
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let provider = Arc::clone(&provider);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                provider
                    .find_or_create_graphics_pipeline(&desc, &RenderPassDesc::default())
                    .unwrap()
            })
        })
        .collect();
    let pipelines: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(mock.stats().pipelines_created, 1);
    assert!(pipelines.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

#[test]
fn distinct_descriptions_compile_in_parallel() {
    let (mock, session) = session_with(EvictionPolicy::RetainAll);
    let delay = Duration::from_millis(100);
    mock.set_creation_delay(delay);
    let provider = Arc::clone(session.resource_provider());

    let descs: HashSet<GraphicsPipelineDesc> = [ShaderType::LinearGradient, ShaderType::SweepGradient]
        .into_iter()
        .flat_map(|shader| {
            [TileMode::Clamp, TileMode::Repeat, TileMode::Mirror, TileMode::Decal]
                .into_iter()
                .map(move |tile| (shader, tile))
        })
        .map(|(shader, tile)| cover_desc(&session, shader, tile))
        .collect();
    let count = descs.len();
    assert!(count >= 4, "expected several distinct keys, got {count}");
    let barrier = Arc::new(Barrier::new(count));

    let started = Instant::now();
    let handles: Vec<_> = descs
        .into_iter()
        .map(|desc| {
            let provider = Arc::clone(&provider);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                provider
                    .find_or_create_graphics_pipeline(&desc, &RenderPassDesc::default())
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let elapsed = started.elapsed();

    assert_eq!(mock.stats().pipelines_created, count);
    assert!(
        elapsed < delay * (count as u32) / 2,
        "{count} creations took {elapsed:?}; distinct keys were serialized"
    );
}

#[test]
fn failed_compilation_is_retried() {
    let (mock, session) = session_with(EvictionPolicy::RetainAll);
    let provider = session.resource_provider();
    let desc = cover_desc(&session, ShaderType::SweepGradient, TileMode::Clamp);

    mock.set_fail_pipeline_creation(true);
    let err = provider
        .find_or_create_graphics_pipeline(&desc, &RenderPassDesc::default())
        .unwrap_err();
    assert!(matches!(err, ResourceError::Pipeline(PipelineError::CompilationFailed { .. })));

    mock.set_fail_pipeline_creation(false);
    provider
        .find_or_create_graphics_pipeline(&desc, &RenderPassDesc::default())
        .unwrap();
    assert_eq!(mock.stats().pipelines_created, 1);
    assert_eq!(provider.stats().graphics_pipelines.misses, 2);
}

#[test]
fn malformed_descriptions_are_rejected() {
    let (mock, session) = session_with(EvictionPolicy::RetainAll);
    let provider = session.resource_provider();
    let render_pass = RenderPassDesc::default();

    let unknown_step = GraphicsPipelineDesc::new(RenderStepId(99), UniquePaintParamsId::NONE);
    assert_eq!(
        provider
            .find_or_create_graphics_pipeline(&unknown_step, &render_pass)
            .unwrap_err(),
        ResourceError::Pipeline(PipelineError::UnknownRenderStep(RenderStepId(99)))
    );

    let cover = RenderStep::all().iter().find(|s| s.performs_shading()).unwrap();
    let unknown_shader = GraphicsPipelineDesc::new(cover.id(), UniquePaintParamsId(4096));
    assert_eq!(
        provider
            .find_or_create_graphics_pipeline(&unknown_shader, &render_pass)
            .unwrap_err(),
        ResourceError::Pipeline(PipelineError::MissingShaderProgram(UniquePaintParamsId(4096)))
    );

    let no_stencil = RenderPassDesc {
        depth_stencil_format: None,
        ..Default::default()
    };
    let stencil = GraphicsPipelineDesc::new(RenderStep::all()[0].id(), UniquePaintParamsId::NONE);
    assert!(matches!(
        provider.find_or_create_graphics_pipeline(&stencil, &no_stencil),
        Err(ResourceError::Pipeline(PipelineError::IncompatibleRenderPass(_)))
    ));
    assert_eq!(mock.stats().pipelines_created, 0);
}

#[test]
fn depth_stencil_states_and_samplers_are_shared() {
    let (mock, session) = session_with(EvictionPolicy::RetainAll);
    let provider = session.resource_provider();
    let settings = *Renderer::stencil_tessellated_wedges(FillType::EvenOdd).steps()[0].depth_stencil();

    let a = provider.find_or_create_depth_stencil_state(&settings).unwrap();
    let b = provider.find_or_create_depth_stencil_state(&settings).unwrap();
    let c = provider
        .find_or_create_depth_stencil_state(&DepthStencilSettings::DISABLED)
        .unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));

    let linear = SamplerDesc::new(FilterMode::Linear, TileMode::Repeat, TileMode::Clamp);
    let s1 = provider.find_or_create_sampler(&linear).unwrap();
    let s2 = provider.find_or_create_sampler(&linear).unwrap();
    assert!(Arc::ptr_eq(&s1, &s2));

    let stats = mock.stats();
    assert_eq!(stats.depth_stencil_states_created, 2);
    assert_eq!(stats.samplers_created, 1);
}

#[test]
fn buffers_and_owned_textures_are_never_shared() {
    let (mock, session) = session_with(EvictionPolicy::RetainAll);
    let provider = session.resource_provider();
    let info = TextureInfo::new(BackendApi::Mock, TextureFormat::R8Unorm, TextureUsage::SAMPLED);

    let t1 = provider.create_texture(Extent2D::new(4, 4), &info).unwrap();
    let t2 = provider.create_texture(Extent2D::new(4, 4), &info).unwrap();
    assert_ne!(t1.id(), t2.id());

    let b1 = provider.create_buffer(64, BufferType::Uniform, PrioritizeGpuReads::No).unwrap();
    let b2 = provider.create_buffer(64, BufferType::Uniform, PrioritizeGpuReads::No).unwrap();
    assert_ne!(b1.id(), b2.id());
    assert!(provider.create_buffer(0, BufferType::Vertex, PrioritizeGpuReads::No).is_err());

    drop((t1, t2, b1, b2));
    let stats = mock.stats();
    assert_eq!(stats.textures_destroyed, 2);
    assert_eq!(stats.buffers_destroyed, 2);
}

#[test]
fn wrapped_textures_are_keyed_by_backend_texture() {
    let (mock, session) = session_with(EvictionPolicy::RetainAll);
    let provider = session.resource_provider();
    let info = TextureInfo::new(BackendApi::Mock, TextureFormat::Rgba8Unorm, TextureUsage::RENDER_ATTACHMENT);
    let backend_texture = session.create_backend_texture(Extent2D::new(16, 16), &info);

    let a = provider.find_or_wrap_texture(&backend_texture).unwrap();
    let b = provider.find_or_wrap_texture(&backend_texture).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(mock.stats().textures_wrapped, 1);

    let foreign_info = TextureInfo::new(BackendApi::Wgpu, TextureFormat::Rgba8Unorm, TextureUsage::SAMPLED);
    let foreign = BackendTexture::new(Extent2D::new(16, 16), foreign_info, NativeTextureHandle(7));
    assert_eq!(
        provider.find_or_wrap_texture(&foreign).unwrap_err(),
        ResourceError::BackendMismatch {
            expected: BackendApi::Mock,
            found: Some(BackendApi::Wgpu),
        }
    );
}

#[test]
fn bounded_eviction_never_drops_live_pipelines() {
    let (mock, session) = session_with(EvictionPolicy::Bounded { max_entries: 2 });
    let provider = session.resource_provider();
    let render_pass = RenderPassDesc::default();

    let held_desc = cover_desc(&session, ShaderType::SolidColor, TileMode::Clamp);
    let held = provider.find_or_create_graphics_pipeline(&held_desc, &render_pass).unwrap();

    for tile_mode in TileMode::ALL {
        let desc = cover_desc(&session, ShaderType::LinearGradient, tile_mode);
        provider.find_or_create_graphics_pipeline(&desc, &render_pass).unwrap();
    }

    let stats = provider.stats().graphics_pipelines;
    assert!(stats.entries <= 2);
    assert!(stats.evictions >= 3);
    assert_eq!(mock.stats().pipelines_destroyed as u64, stats.evictions);

    let again = provider.find_or_create_graphics_pipeline(&held_desc, &render_pass).unwrap();
    assert!(Arc::ptr_eq(&held, &again));
}

#[test]
fn retain_all_keeps_unreferenced_entries_until_purged() {
    let (mock, session) = session_with(EvictionPolicy::RetainAll);
    let provider = session.resource_provider();
    for tile_mode in TileMode::ALL {
        provider
            .find_or_create_sampler(&SamplerDesc::new(FilterMode::Nearest, tile_mode, tile_mode))
            .unwrap();
    }
    assert_eq!(provider.stats().samplers.entries, 4);
    assert_eq!(mock.stats().samplers_destroyed, 0);

    assert_eq!(provider.purge_unreferenced(), 4);
    assert_eq!(mock.stats().samplers_destroyed, 4);
    assert_eq!(provider.stats().samplers.entries, 0);
}
