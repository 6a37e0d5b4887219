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

//! Texture, backend-texture and sampler descriptions.

use super::enums::{BackendApi, FilterMode, SampleCount, TextureFormat, TileMode};
use crate::dimension::Extent2D;
use crate::strata_bitflags;

/// Opaque handle to a texture created or wrapped by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Opaque handle to a sampler created by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerId(pub u64);

/// Backend-native handle stored inside a [`BackendTexture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeTextureHandle(pub u64);

strata_bitflags! {
    /// How a texture may be used.
    pub struct TextureUsage: u32 {
        /// Can be sampled in a shader.
        const SAMPLED = 1 << 0;
        /// Can be used as a color or depth/stencil attachment.
        const RENDER_ATTACHMENT = 1 << 1;
        /// Can be the source of a copy.
        const COPY_SRC = 1 << 2;
        /// Can be the destination of a copy.
        const COPY_DST = 1 << 3;
    }
}

/// Format, usage and backend of a texture.
///
/// The default value is invalid: it names no backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureInfo {
    backend: Option<BackendApi>,
    format: TextureFormat,
    usage: TextureUsage,
    sample_count: SampleCount,
    mip_level_count: u32,
}

impl Default for TextureInfo {
    fn default() -> Self {
        Self {
            backend: None,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsage::EMPTY,
            sample_count: SampleCount::X1,
            mip_level_count: 0,
        }
    }
}

impl TextureInfo {
    /// Single-sampled, single-mip texture info for `backend`.
    pub fn new(backend: BackendApi, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            backend: Some(backend),
            format,
            usage,
            sample_count: SampleCount::X1,
            mip_level_count: 1,
        }
    }

    /// Replaces the sample count.
    #[must_use]
    pub fn with_sample_count(mut self, sample_count: SampleCount) -> Self {
        self.sample_count = sample_count;
        self
    }

    /// Replaces the mip level count.
    #[must_use]
    pub fn with_mip_level_count(mut self, mip_level_count: u32) -> Self {
        self.mip_level_count = mip_level_count;
        self
    }

    /// Backend the texture belongs to, `None` for an invalid info.
    pub fn backend(&self) -> Option<BackendApi> {
        self.backend
    }

    /// Pixel format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Allowed usages.
    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    /// Multisample count.
    pub fn sample_count(&self) -> SampleCount {
        self.sample_count
    }

    /// Number of mip levels.
    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }

    /// A well-formed info names a backend, at least one mip level and one usage.
    /// Multisampled textures must have exactly one mip level.
    pub fn is_valid(&self) -> bool {
        self.backend.is_some()
            && self.mip_level_count > 0
            && !self.usage.is_empty()
            && (self.sample_count == SampleCount::X1 || self.mip_level_count == 1)
    }
}

/// A texture allocated directly on the backend, outside the resource cache.
///
/// The default value is the invalid ("empty") texture returned when creation is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BackendTexture {
    dimensions: Extent2D,
    info: TextureInfo,
    handle: Option<NativeTextureHandle>,
}

impl BackendTexture {
    /// Builds a backend texture from its native handle. Called by backends.
    pub fn new(dimensions: Extent2D, info: TextureInfo, handle: NativeTextureHandle) -> Self {
        Self {
            dimensions,
            info,
            handle: Some(handle),
        }
    }

    /// Texture size.
    pub fn dimensions(&self) -> Extent2D {
        self.dimensions
    }

    /// Texture info.
    pub fn info(&self) -> &TextureInfo {
        &self.info
    }

    /// Native handle, `None` when invalid.
    pub fn handle(&self) -> Option<NativeTextureHandle> {
        self.handle
    }

    /// Backend that owns the native texture.
    pub fn backend(&self) -> Option<BackendApi> {
        self.info.backend()
    }

    /// `true` when the texture refers to a live native object.
    pub fn is_valid(&self) -> bool {
        self.handle.is_some() && self.info.is_valid() && !self.dimensions.is_empty()
    }

    /// Resets to the invalid state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Sampler key: filtering plus the tile mode of each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerDesc {
    /// Minification and magnification filter.
    pub filter: FilterMode,
    /// Filter between mip levels.
    pub mipmap_filter: FilterMode,
    /// Tile modes for the x and y axes.
    pub tile_modes: [TileMode; 2],
}

impl SamplerDesc {
    /// Sampler without mip filtering.
    pub fn new(filter: FilterMode, tile_x: TileMode, tile_y: TileMode) -> Self {
        Self {
            filter,
            mipmap_filter: FilterMode::Nearest,
            tile_modes: [tile_x, tile_y],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_texture_info_is_invalid() {
        assert!(!TextureInfo::default().is_valid());
        assert_eq!(TextureInfo::default().backend(), None);
    }

    #[test]
    fn texture_info_validity_rules() {
        let info = TextureInfo::new(BackendApi::Mock, TextureFormat::Rgba8Unorm, TextureUsage::SAMPLED);
        assert!(info.is_valid());
        assert!(!info.with_mip_level_count(0).is_valid());
        assert!(!info
            .with_sample_count(SampleCount::X4)
            .with_mip_level_count(3)
            .is_valid());

        let no_usage = TextureInfo::new(BackendApi::Mock, TextureFormat::Rgba8Unorm, TextureUsage::EMPTY);
        assert!(!no_usage.is_valid());
    }

    #[test]
    fn backend_texture_reset_invalidates() {
        let info = TextureInfo::new(BackendApi::Wgpu, TextureFormat::Bgra8Unorm, TextureUsage::RENDER_ATTACHMENT);
        let mut texture = BackendTexture::new(Extent2D::new(8, 8), info, NativeTextureHandle(3));
        assert!(texture.is_valid());
        assert_eq!(texture.backend(), Some(BackendApi::Wgpu));

        texture.reset();
        assert!(!texture.is_valid());
        assert_eq!(texture, BackendTexture::default());
    }
}
