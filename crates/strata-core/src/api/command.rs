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

//! Types passed to command encoders.

use super::texture::TextureId;

/// Handle to a finished, not yet submitted, native command buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandBufferId(pub u64);

/// Handle to a submission whose completion can be polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionId(pub u64);

/// RGBA color with `f32` channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    /// Creates a color.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// What happens to an attachment when a pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LoadOp {
    /// Keep the existing contents.
    #[default]
    Load,
    /// Clear to a color.
    Clear(Color),
}

/// What happens to an attachment when a pass ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreOp {
    /// Write the results.
    #[default]
    Store,
    /// Results may be discarded.
    Discard,
}

/// Everything an encoder needs to open a render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPassBegin {
    /// Color attachment.
    pub color_target: TextureId,
    /// Depth/stencil attachment, if any. Its stencil aspect is cleared to zero.
    pub depth_stencil_target: Option<TextureId>,
    /// Color load operation.
    pub load: LoadOp,
    /// Color store operation.
    pub store: StoreOp,
}
