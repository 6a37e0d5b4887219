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

//! # Strata Core
//!
//! Backend-agnostic session and recording layer: resource key types, the backend
//! capability traits, the resource and shader caches, recorders, recordings and the
//! session that submits them.
//!
//! ```no_run
//! use strata_core::mock::MockBackend;
//! use strata_core::{InsertRecordingInfo, Session, SessionOptions, SyncToCpu};
//! use std::sync::Arc;
//!
//! let mut session = Session::make_with_backend(Arc::new(MockBackend::new()), SessionOptions::default());
//! let mut recorder = session.make_recorder();
//! let recording = recorder.snap().expect("snap");
//! session.insert_recording(InsertRecordingInfo::new(recording));
//! session.submit(SyncToCpu::Yes);
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod backend;
pub mod callback;
mod command_buffer;
pub mod config;
pub mod dimension;
pub mod error;
pub mod global_cache;
mod gpu;
mod macros;
pub mod mock;
pub mod paint;
pub mod recorder;
pub mod recording;
pub mod render;
pub mod resource;
pub mod session;
pub mod single_owner;

pub use callback::{CallbackResult, FinishedCallback};
pub use config::{EvictionPolicy, ResourceCacheConfig, SessionOptions};
pub use dimension::Extent2D;
pub use error::{PipelineError, ResourceError, SessionError};
pub use recorder::{DrawGeometry, DrawRequest, Recorder};
pub use recording::Recording;
pub use session::{InsertRecordingInfo, Session, SyncToCpu};
