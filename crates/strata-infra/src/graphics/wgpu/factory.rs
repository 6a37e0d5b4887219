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

use std::sync::Arc;

use async_trait::async_trait;
use strata_core::api::BackendApi;
use strata_core::backend::{BackendFactory, GpuBackend};
use strata_core::{Session, SessionError, SessionOptions};

use super::context::{WgpuBackendConfig, WgpuGraphicsContext};
use super::device::WgpuBackend;

/// Creates [`WgpuBackend`]s on the adapter selected by its configuration.
#[derive(Debug, Clone, Default)]
pub struct WgpuBackendFactory {
    config: WgpuBackendConfig,
}

impl WgpuBackendFactory {
    pub fn new(config: WgpuBackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WgpuBackendConfig {
        &self.config
    }
}

#[async_trait]
impl BackendFactory for WgpuBackendFactory {
    fn backend_api(&self) -> BackendApi {
        BackendApi::Wgpu
    }

    async fn create_backend(&self) -> Result<Arc<dyn GpuBackend>, SessionError> {
        let context = WgpuGraphicsContext::new_headless(&self.config)
            .await
            .map_err(|e| SessionError::InitializationFailed(format!("{e:#}")))?;
        let backend = WgpuBackend::new(context);
        log::info!(
            "WGPU backend ready on \"{}\" ({:?}, {:?})",
            backend.adapter_name(),
            backend.adapter_backend(),
            backend.adapter_device_type()
        );
        Ok(Arc::new(backend))
    }
}

/// Blocking convenience for hosts without an async runtime.
///
/// ## Errors
/// * `SessionError::InitializationFailed` - If no adapter or device is available.
pub fn make_wgpu_session(config: WgpuBackendConfig, options: SessionOptions) -> Result<Session, SessionError> {
    let factory = WgpuBackendFactory::new(config);
    pollster::block_on(Session::make(&factory, options))
}
