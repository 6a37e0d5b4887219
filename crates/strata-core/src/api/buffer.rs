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

//! Buffer descriptions.

/// Opaque handle to a buffer created by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// What a buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// Vertex data.
    Vertex,
    /// Index data.
    Index,
    /// Staging memory for transfers.
    Xfer,
    /// Uniform data.
    Uniform,
    /// Shader storage.
    Storage,
}

/// Hint for where a buffer should live.
///
/// `Yes` favours device-local memory; `No` favours memory the CPU writes cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrioritizeGpuReads {
    /// Optimize for CPU writes.
    #[default]
    No,
    /// Optimize for GPU reads.
    Yes,
}

/// Size, kind and placement hint of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    /// Size in bytes.
    pub size: u64,
    /// Contents kind.
    pub buffer_type: BufferType,
    /// Placement hint.
    pub prioritize_gpu_reads: PrioritizeGpuReads,
}

impl BufferDesc {
    /// Creates a buffer description.
    pub fn new(size: u64, buffer_type: BufferType, prioritize_gpu_reads: PrioritizeGpuReads) -> Self {
        Self {
            size,
            buffer_type,
            prioritize_gpu_reads,
        }
    }
}
