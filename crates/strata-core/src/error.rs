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

//! Error types for resource creation, pipeline compilation and session bring-up.

use crate::api::{BackendApi, RenderStepId, UniquePaintParamsId};
use std::fmt;

/// An error raised while compiling a graphics pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The backend rejected the pipeline.
    CompilationFailed {
        /// Label of the pipeline, if any.
        label: Option<String>,
        /// Backend diagnostics.
        details: String,
    },
    /// The description names a shading key the dictionary never produced.
    MissingShaderProgram(UniquePaintParamsId),
    /// The description names a render step that does not exist.
    UnknownRenderStep(RenderStepId),
    /// The render pass cannot host the pipeline (e.g. a stencil step without a stencil attachment).
    IncompatibleRenderPass(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::CompilationFailed { label, details } => {
                let label = label.as_deref().unwrap_or("<unlabeled>");
                write!(f, "Pipeline '{label}' failed to compile: {details}")
            }
            PipelineError::MissingShaderProgram(id) => {
                write!(f, "No shader program registered for {id:?}")
            }
            PipelineError::UnknownRenderStep(id) => write!(f, "Unknown render step {id:?}"),
            PipelineError::IncompatibleRenderPass(details) => {
                write!(f, "Render pass is incompatible with the pipeline: {details}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error raised while creating or using a backend resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The device ran out of memory.
    OutOfMemory,
    /// The device has been lost.
    DeviceLost,
    /// A description was malformed.
    InvalidDescriptor(String),
    /// The handle does not name a live resource.
    InvalidHandle(String),
    /// The resource belongs to another backend.
    BackendMismatch {
        /// Backend of this session.
        expected: BackendApi,
        /// Backend named by the resource.
        found: Option<BackendApi>,
    },
    /// The requested feature is not available on this backend.
    Unsupported(String),
    /// Pipeline compilation failed.
    Pipeline(PipelineError),
    /// Any other backend-reported failure.
    Backend(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::OutOfMemory => write!(f, "Out of device memory"),
            ResourceError::DeviceLost => write!(f, "Device lost"),
            ResourceError::InvalidDescriptor(details) => write!(f, "Invalid descriptor: {details}"),
            ResourceError::InvalidHandle(details) => write!(f, "Invalid handle: {details}"),
            ResourceError::BackendMismatch { expected, found } => match found {
                Some(found) => write!(f, "Resource targets backend '{found}', session uses '{expected}'"),
                None => write!(f, "Resource names no backend, session uses '{expected}'"),
            },
            ResourceError::Unsupported(details) => write!(f, "Unsupported: {details}"),
            ResourceError::Pipeline(e) => write!(f, "Pipeline error: {e}"),
            ResourceError::Backend(details) => write!(f, "Backend error: {details}"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PipelineError> for ResourceError {
    fn from(e: PipelineError) -> Self {
        ResourceError::Pipeline(e)
    }
}

/// An error raised while creating a session.
#[derive(Debug)]
pub enum SessionError {
    /// The backend could not be brought up.
    InitializationFailed(String),
    /// The factory produced a backend for a different API than it advertises.
    BackendMismatch {
        /// Advertised by the factory.
        expected: BackendApi,
        /// Reported by the created backend.
        found: BackendApi,
    },
    /// A resource operation failed during bring-up.
    Resource(ResourceError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InitializationFailed(details) => {
                write!(f, "Session initialization failed: {details}")
            }
            SessionError::BackendMismatch { expected, found } => {
                write!(f, "Factory advertised backend '{expected}' but created '{found}'")
            }
            SessionError::Resource(e) => write!(f, "Resource error during session setup: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Resource(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ResourceError> for SessionError {
    fn from(e: ResourceError) -> Self {
        SessionError::Resource(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn pipeline_error_is_the_source_of_resource_error() {
        let err: ResourceError = PipelineError::UnknownRenderStep(RenderStepId(42)).into();
        assert!(err.source().is_some());
        assert!(err.to_string().contains("Unknown render step"));
    }

    #[test]
    fn mismatch_message_names_both_backends() {
        let err = ResourceError::BackendMismatch {
            expected: BackendApi::Wgpu,
            found: Some(BackendApi::Mock),
        };
        let text = err.to_string();
        assert!(text.contains("wgpu") && text.contains("mock"));
    }
}
