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

//! The `wgpu` implementation of [`strata_core::backend::GpuBackend`].

mod command;
mod context;
pub mod conversions;
mod device;
mod factory;
mod shaders;

pub use self::context::{WgpuBackendConfig, WgpuGraphicsContext};
pub use self::device::WgpuBackend;
pub use self::factory::{make_wgpu_session, WgpuBackendFactory};
