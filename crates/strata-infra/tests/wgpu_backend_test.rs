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

//! These tests need a GPU adapter (a software one such as lavapipe is enough). They
//! return early when none is available.

use strata_core::api::*;
use strata_core::paint::{BlendMode, PaintCombo, PaintParams, ShaderType};
use strata_core::render::{FillType, Renderer, Vertex};
use strata_core::{
    CallbackResult, DrawGeometry, DrawRequest, Extent2D, FinishedCallback, InsertRecordingInfo, ResourceError,
    Session, SessionOptions, SyncToCpu,
};
use strata_infra::graphics::wgpu::WgpuGraphicsContext;
use strata_infra::{make_wgpu_session, WgpuBackend, WgpuBackendConfig};

fn wgpu_session(options: SessionOptions) -> Option<Session> {
    match make_wgpu_session(WgpuBackendConfig::default(), options) {
        Ok(session) => Some(session),
        Err(e) => {
            eprintln!("skipping: no wgpu adapter available ({e})");
            None
        }
    }
}

fn target_info() -> TextureInfo {
    TextureInfo::new(
        BackendApi::Wgpu,
        TextureFormat::Rgba8Unorm,
        TextureUsage::RENDER_ATTACHMENT | TextureUsage::COPY_SRC,
    )
}

fn triangle() -> [Vertex; 3] {
    let color = [0.0, 0.5, 0.0, 0.5];
    [
        Vertex::new([-1.0, -1.0], color),
        Vertex::new([1.0, -1.0], color),
        Vertex::new([0.0, 1.0], color),
    ]
}

#[test]
fn every_generated_program_compiles() {
    let Some(session) = wgpu_session(SessionOptions {
        eager_pipeline_compilation: true,
        ..Default::default()
    }) else {
        return;
    };

    let shaders = PaintCombo::new([BlendMode::SrcOver], ShaderType::ALL, TileMode::ALL);
    let blends = PaintCombo::new(BlendMode::ALL, [ShaderType::SolidColor], [TileMode::Clamp]);
    let shader_descs = session.pre_compile(&shaders);
    let blend_descs = session.pre_compile(&blends);

    let stats = session.resource_provider().stats().graphics_pipelines;
    assert_eq!(stats.creations as usize, stats.entries);
    assert_eq!(stats.misses, stats.creations, "a generated program failed to compile");
    assert_eq!(stats.entries, shader_descs.union(&blend_descs).count());
}

#[test]
fn draws_complete_and_report_success() {
    let Some(mut session) = wgpu_session(SessionOptions::default()) else {
        return;
    };
    let mut recorder = session.make_recorder();
    let target = recorder.create_texture(Extent2D::new(32, 32), &target_info()).unwrap();
    let vertices = recorder.create_vertex_buffer(&triangle()).unwrap();

    recorder.clear(&target, Color::WHITE).unwrap();
    for fill in FillType::ALL {
        let request = DrawRequest::new(
            target.clone(),
            Renderer::stencil_tessellated_curves_and_tris(fill),
            PaintParams::new(ShaderType::LinearGradient, TileMode::Mirror, BlendMode::SrcOver),
            DrawGeometry::new(vertices.clone(), 0..3),
        );
        recorder.draw(&request).unwrap();
    }
    let recording = recorder.snap().unwrap();

    let (callback, rx) = FinishedCallback::channel();
    assert!(session.insert_recording(InsertRecordingInfo::new(recording).with_finished_callback(callback)));
    session.submit(SyncToCpu::Yes);

    assert_eq!(rx.try_recv(), Ok(CallbackResult::Success));
    assert_eq!(session.outstanding_submissions(), 0);
}

#[test]
fn asynchronous_work_is_reported_by_polling() {
    let Some(mut session) = wgpu_session(SessionOptions::default()) else {
        return;
    };
    let mut recorder = session.make_recorder();
    let src = recorder.create_vertex_buffer(&triangle()).unwrap();
    let dst = recorder
        .create_buffer(src.size(), BufferType::Xfer, PrioritizeGpuReads::No)
        .unwrap();
    recorder.copy_buffer_to_buffer(&src, &dst, src.size()).unwrap();
    let recording = recorder.snap().unwrap();

    let (callback, rx) = FinishedCallback::channel();
    session.insert_recording(InsertRecordingInfo::new(recording).with_finished_callback(callback));
    session.submit(SyncToCpu::No);

    for _ in 0..1000 {
        session.check_async_work_completion();
        if session.outstanding_submissions() == 0 {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    drop(session);
    assert_eq!(rx.try_recv(), Ok(CallbackResult::Success));
}

#[test]
fn backend_textures_can_be_wrapped_and_deleted() {
    let Some(mut session) = wgpu_session(SessionOptions::default()) else {
        return;
    };
    let mut backend_texture = session.create_backend_texture(Extent2D::new(16, 16), &target_info());
    assert!(backend_texture.is_valid());

    let mut recorder = session.make_recorder();
    let target = recorder.wrap_backend_texture(&backend_texture).unwrap();
    let again = recorder.wrap_backend_texture(&backend_texture).unwrap();
    assert!(std::sync::Arc::ptr_eq(&target, &again));
    recorder.clear(&target, Color::BLACK).unwrap();
    let recording = recorder.snap().unwrap();
    session.insert_recording(InsertRecordingInfo::new(recording));
    session.submit(SyncToCpu::Yes);

    drop((target, again, recorder));
    let stale_copy = backend_texture;
    session.delete_backend_texture(&mut backend_texture);
    assert!(!backend_texture.is_valid());
    assert_eq!(session.resource_provider().stats().wrapped_textures.entries, 0);

    let mut recorder = session.make_recorder();
    let rewrap = recorder.wrap_backend_texture(&stale_copy);
    assert!(matches!(rewrap, Err(ResourceError::InvalidHandle(_))), "{rewrap:?}");
}

#[test]
fn adapter_details_are_reported() {
    let context = match pollster::block_on(WgpuGraphicsContext::new_headless(&WgpuBackendConfig::default())) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("skipping: no wgpu adapter available ({e:#})");
            return;
        }
    };
    let (name, api, device_type) = (
        context.adapter_name.clone(),
        context.adapter_backend,
        context.adapter_device_type,
    );
    let backend = WgpuBackend::new(context);
    assert_eq!(backend.adapter_name(), name);
    assert_eq!(backend.adapter_backend(), api);
    assert_eq!(backend.adapter_device_type(), device_type);
}

#[test]
fn mock_textures_are_rejected() {
    let Some(session) = wgpu_session(SessionOptions::default()) else {
        return;
    };
    let info = TextureInfo::new(BackendApi::Mock, TextureFormat::Rgba8Unorm, TextureUsage::SAMPLED);

    let backend_texture = session.create_backend_texture(Extent2D::new(4, 4), &info);
    assert!(!backend_texture.is_valid());

    let err = session
        .resource_provider()
        .create_texture(Extent2D::new(4, 4), &info)
        .unwrap_err();
    assert_eq!(
        err,
        ResourceError::BackendMismatch {
            expected: BackendApi::Wgpu,
            found: Some(BackendApi::Mock),
        }
    );
}
