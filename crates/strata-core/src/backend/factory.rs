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

//! Asynchronous backend creation.

use crate::api::BackendApi;
use crate::backend::GpuBackend;
use crate::error::SessionError;
use async_trait::async_trait;
use std::sync::Arc;

/// Brings up a backend. Adapter and device requests are asynchronous on most APIs,
/// so creation is an `async` method.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    /// The API of the backends this factory creates.
    fn backend_api(&self) -> BackendApi;

    /// Creates a new logical device.
    /// ## Errors
    /// * `SessionError::InitializationFailed` - If no adapter or device is available.
    async fn create_backend(&self) -> Result<Arc<dyn GpuBackend>, SessionError>;
}
