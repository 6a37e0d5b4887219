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

//! Shared enumerations used across resource descriptions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies which native API a backend object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendApi {
    /// The `wgpu` backend.
    Wgpu,
    /// The in-process mock backend used for headless runs and tests.
    Mock,
}

impl fmt::Display for BackendApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendApi::Wgpu => write!(f, "wgpu"),
            BackendApi::Mock => write!(f, "mock"),
        }
    }
}

/// Pixel formats a texture or attachment can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    /// 8-bit RGBA, normalized.
    Rgba8Unorm,
    /// 8-bit BGRA, normalized.
    Bgra8Unorm,
    /// 16-bit float RGBA.
    Rgba16Float,
    /// Single 8-bit channel, normalized.
    R8Unorm,
    /// 32-bit float depth.
    Depth32Float,
    /// 24-bit depth with an 8-bit stencil.
    Depth24PlusStencil8,
    /// 8-bit stencil only.
    Stencil8,
}

impl TextureFormat {
    /// `true` for depth and/or stencil formats.
    pub const fn is_depth_stencil(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth32Float | TextureFormat::Depth24PlusStencil8 | TextureFormat::Stencil8
        )
    }

    /// `true` when the format carries a stencil aspect.
    pub const fn has_stencil(self) -> bool {
        matches!(self, TextureFormat::Depth24PlusStencil8 | TextureFormat::Stencil8)
    }

    /// Size of one texel in bytes.
    pub const fn bytes_per_texel(self) -> u32 {
        match self {
            TextureFormat::R8Unorm | TextureFormat::Stencil8 => 1,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Bgra8Unorm
            | TextureFormat::Depth32Float
            | TextureFormat::Depth24PlusStencil8 => 4,
            TextureFormat::Rgba16Float => 8,
        }
    }
}

/// Multisample count of a texture or render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleCount {
    /// One sample per pixel.
    #[default]
    X1,
    /// Four samples per pixel.
    X4,
}

impl SampleCount {
    /// The sample count as an integer.
    pub const fn as_u32(self) -> u32 {
        match self {
            SampleCount::X1 => 1,
            SampleCount::X4 => 4,
        }
    }
}

/// Texel filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest texel.
    #[default]
    Nearest,
    /// Linear interpolation.
    Linear,
}

/// How coordinates outside `[0, 1]` are resolved by samplers and shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileMode {
    /// Clamp to the edge.
    #[default]
    Clamp,
    /// Wrap around.
    Repeat,
    /// Wrap around, flipping every other tile.
    Mirror,
    /// Transparent outside the unit range.
    Decal,
}

impl TileMode {
    /// All tile modes, in declaration order.
    pub const ALL: [TileMode; 4] = [TileMode::Clamp, TileMode::Repeat, TileMode::Mirror, TileMode::Decal];
}

/// Primitive assembly for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Independent triangles.
    #[default]
    TriangleList,
    /// Connected triangle strip.
    TriangleStrip,
}
