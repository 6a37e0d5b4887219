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

use strata_core::api::{
    BlendFactor, BlendFormula, BufferType, Color, CompareFunction, DepthStencilSettings, FilterMode,
    LoadOp, PrimitiveTopology, SampleCount, StencilFaceSettings, StencilOperation, StoreOp,
    TextureFormat, TextureUsage, TileMode,
};
use strata_core::Extent2D;

/// A local extension trait to convert Strata types into WGPU types.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_wgpu()` syntax.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a WGPU-compatible type.
    fn into_wgpu(self) -> T;
}

// --- Textures ---

impl IntoWgpu<wgpu::Extent3d> for Extent2D {
    fn into_wgpu(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl IntoWgpu<wgpu::TextureFormat> for TextureFormat {
    fn into_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
            TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            TextureFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
            TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
            TextureFormat::Depth24PlusStencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
            TextureFormat::Stencil8 => wgpu::TextureFormat::Stencil8,
        }
    }
}

/// Maps a WGPU format back to Strata's, for the formats Strata knows about.
pub fn from_wgpu_texture_format(format: wgpu::TextureFormat) -> Option<TextureFormat> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => Some(TextureFormat::Rgba8Unorm),
        wgpu::TextureFormat::Bgra8Unorm => Some(TextureFormat::Bgra8Unorm),
        wgpu::TextureFormat::Rgba16Float => Some(TextureFormat::Rgba16Float),
        wgpu::TextureFormat::R8Unorm => Some(TextureFormat::R8Unorm),
        wgpu::TextureFormat::Depth32Float => Some(TextureFormat::Depth32Float),
        wgpu::TextureFormat::Depth24PlusStencil8 => Some(TextureFormat::Depth24PlusStencil8),
        wgpu::TextureFormat::Stencil8 => Some(TextureFormat::Stencil8),
        _ => None,
    }
}

impl IntoWgpu<wgpu::TextureUsages> for TextureUsage {
    fn into_wgpu(self) -> wgpu::TextureUsages {
        let mut usages = wgpu::TextureUsages::empty();
        if self.contains(TextureUsage::SAMPLED) {
            usages |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if self.contains(TextureUsage::RENDER_ATTACHMENT) {
            usages |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        if self.contains(TextureUsage::COPY_SRC) {
            usages |= wgpu::TextureUsages::COPY_SRC;
        }
        if self.contains(TextureUsage::COPY_DST) {
            usages |= wgpu::TextureUsages::COPY_DST;
        }
        usages
    }
}

impl IntoWgpu<u32> for SampleCount {
    fn into_wgpu(self) -> u32 {
        self.as_u32()
    }
}

// --- Samplers ---

impl IntoWgpu<wgpu::FilterMode> for FilterMode {
    fn into_wgpu(self) -> wgpu::FilterMode {
        match self {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }
}

/// `Decal` needs a transparent border; without border support it samples like `Clamp`.
pub fn tile_mode_to_address_mode(tile_mode: TileMode, border_supported: bool) -> wgpu::AddressMode {
    match tile_mode {
        TileMode::Clamp => wgpu::AddressMode::ClampToEdge,
        TileMode::Repeat => wgpu::AddressMode::Repeat,
        TileMode::Mirror => wgpu::AddressMode::MirrorRepeat,
        TileMode::Decal if border_supported => wgpu::AddressMode::ClampToBorder,
        TileMode::Decal => wgpu::AddressMode::ClampToEdge,
    }
}

// --- Buffers ---

impl IntoWgpu<wgpu::BufferUsages> for BufferType {
    fn into_wgpu(self) -> wgpu::BufferUsages {
        let copies = wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST;
        match self {
            BufferType::Vertex => wgpu::BufferUsages::VERTEX | copies,
            BufferType::Index => wgpu::BufferUsages::INDEX | copies,
            BufferType::Xfer => copies,
            BufferType::Uniform => wgpu::BufferUsages::UNIFORM | copies,
            BufferType::Storage => wgpu::BufferUsages::STORAGE | copies,
        }
    }
}

// --- Pipeline state ---

impl IntoWgpu<wgpu::PrimitiveTopology> for PrimitiveTopology {
    fn into_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

impl IntoWgpu<wgpu::CompareFunction> for CompareFunction {
    fn into_wgpu(self) -> wgpu::CompareFunction {
        match self {
            CompareFunction::Never => wgpu::CompareFunction::Never,
            CompareFunction::Less => wgpu::CompareFunction::Less,
            CompareFunction::Equal => wgpu::CompareFunction::Equal,
            CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
            CompareFunction::Greater => wgpu::CompareFunction::Greater,
            CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
            CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
            CompareFunction::Always => wgpu::CompareFunction::Always,
        }
    }
}

impl IntoWgpu<wgpu::StencilOperation> for StencilOperation {
    fn into_wgpu(self) -> wgpu::StencilOperation {
        match self {
            StencilOperation::Keep => wgpu::StencilOperation::Keep,
            StencilOperation::Zero => wgpu::StencilOperation::Zero,
            StencilOperation::Replace => wgpu::StencilOperation::Replace,
            StencilOperation::Invert => wgpu::StencilOperation::Invert,
            StencilOperation::IncrementClamp => wgpu::StencilOperation::IncrementClamp,
            StencilOperation::DecrementClamp => wgpu::StencilOperation::DecrementClamp,
            StencilOperation::IncrementWrap => wgpu::StencilOperation::IncrementWrap,
            StencilOperation::DecrementWrap => wgpu::StencilOperation::DecrementWrap,
        }
    }
}

impl IntoWgpu<wgpu::StencilFaceState> for StencilFaceSettings {
    fn into_wgpu(self) -> wgpu::StencilFaceState {
        wgpu::StencilFaceState {
            compare: self.compare.into_wgpu(),
            fail_op: self.fail_op.into_wgpu(),
            depth_fail_op: self.depth_fail_op.into_wgpu(),
            pass_op: self.pass_op.into_wgpu(),
        }
    }
}

/// Builds the depth/stencil state of a pipeline targeting an attachment of `format`.
///
/// WGPU bakes depth/stencil state into the pipeline; only the stencil reference is
/// dynamic. Stencil faces are ignored when the format has no stencil aspect.
pub fn depth_stencil_state(settings: &DepthStencilSettings, format: TextureFormat) -> wgpu::DepthStencilState {
    let stencil = if settings.stencil_test_enabled && format.has_stencil() {
        wgpu::StencilState {
            front: settings.front.into_wgpu(),
            back: settings.back.into_wgpu(),
            // Both faces share masks in WGPU.
            read_mask: settings.front.read_mask,
            write_mask: settings.front.write_mask | settings.back.write_mask,
        }
    } else {
        wgpu::StencilState::default()
    };

    wgpu::DepthStencilState {
        format: format.into_wgpu(),
        depth_write_enabled: settings.depth_write_enabled,
        depth_compare: settings.depth_compare.into_wgpu(),
        stencil,
        bias: wgpu::DepthBiasState::default(),
    }
}

impl IntoWgpu<wgpu::BlendFactor> for BlendFactor {
    fn into_wgpu(self) -> wgpu::BlendFactor {
        match self {
            BlendFactor::Zero => wgpu::BlendFactor::Zero,
            BlendFactor::One => wgpu::BlendFactor::One,
            BlendFactor::Src => wgpu::BlendFactor::Src,
            BlendFactor::OneMinusSrc => wgpu::BlendFactor::OneMinusSrc,
            BlendFactor::Dst => wgpu::BlendFactor::Dst,
            BlendFactor::OneMinusDst => wgpu::BlendFactor::OneMinusDst,
            BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
            BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        }
    }
}

impl IntoWgpu<wgpu::BlendState> for BlendFormula {
    fn into_wgpu(self) -> wgpu::BlendState {
        let component = wgpu::BlendComponent {
            src_factor: self.src_factor.into_wgpu(),
            dst_factor: self.dst_factor.into_wgpu(),
            operation: wgpu::BlendOperation::Add,
        };
        wgpu::BlendState {
            color: component,
            alpha: component,
        }
    }
}

// --- Passes ---

impl IntoWgpu<wgpu::Color> for Color {
    fn into_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

impl IntoWgpu<wgpu::LoadOp<wgpu::Color>> for LoadOp {
    fn into_wgpu(self) -> wgpu::LoadOp<wgpu::Color> {
        match self {
            LoadOp::Load => wgpu::LoadOp::Load,
            LoadOp::Clear(color) => wgpu::LoadOp::Clear(color.into_wgpu()),
        }
    }
}

impl IntoWgpu<wgpu::StoreOp> for StoreOp {
    fn into_wgpu(self) -> wgpu::StoreOp {
        match self {
            StoreOp::Store => wgpu::StoreOp::Store,
            StoreOp::Discard => wgpu::StoreOp::Discard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::render::{FillType, Renderer};

    #[test]
    fn texture_formats_convert_both_ways() {
        for format in [
            TextureFormat::Rgba8Unorm,
            TextureFormat::Bgra8Unorm,
            TextureFormat::Rgba16Float,
            TextureFormat::R8Unorm,
            TextureFormat::Depth32Float,
            TextureFormat::Depth24PlusStencil8,
            TextureFormat::Stencil8,
        ] {
            assert_eq!(from_wgpu_texture_format(format.into_wgpu()), Some(format));
        }
        assert_eq!(from_wgpu_texture_format(wgpu::TextureFormat::Rg11b10Ufloat), None);
    }

    #[test]
    fn texture_usage_maps_each_flag() {
        let usage: wgpu::TextureUsages = (TextureUsage::SAMPLED | TextureUsage::COPY_DST).into_wgpu();
        assert_eq!(
            usage,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST
        );
        let empty: wgpu::TextureUsages = TextureUsage::EMPTY.into_wgpu();
        assert!(empty.is_empty());
    }

    #[test]
    fn decal_degrades_without_border_support() {
        assert_eq!(
            tile_mode_to_address_mode(TileMode::Decal, true),
            wgpu::AddressMode::ClampToBorder
        );
        assert_eq!(
            tile_mode_to_address_mode(TileMode::Decal, false),
            wgpu::AddressMode::ClampToEdge
        );
        assert_eq!(
            tile_mode_to_address_mode(TileMode::Mirror, false),
            wgpu::AddressMode::MirrorRepeat
        );
    }

    #[test]
    fn every_buffer_type_can_be_copied() {
        for buffer_type in [
            BufferType::Vertex,
            BufferType::Index,
            BufferType::Xfer,
            BufferType::Uniform,
            BufferType::Storage,
        ] {
            let usages: wgpu::BufferUsages = buffer_type.into_wgpu();
            assert!(usages.contains(wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST));
        }
    }

    #[test]
    fn stencil_steps_keep_their_faces() {
        let step = Renderer::stencil_tessellated_wedges(FillType::Winding).steps()[0];
        let state = depth_stencil_state(step.depth_stencil(), TextureFormat::Depth24PlusStencil8);
        assert!(state.stencil.is_enabled());
        assert!(!state.depth_write_enabled);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Always);

        let no_stencil = depth_stencil_state(step.depth_stencil(), TextureFormat::Depth32Float);
        assert!(!no_stencil.stencil.is_enabled());
    }

    #[test]
    fn disabled_settings_produce_no_stencil_test() {
        let state = depth_stencil_state(&DepthStencilSettings::DISABLED, TextureFormat::Depth24PlusStencil8);
        assert!(!state.stencil.is_enabled());
        assert_eq!(state.format, wgpu::TextureFormat::Depth24PlusStencil8);
    }

    #[test]
    fn clear_colors_widen_to_f64() {
        let load: wgpu::LoadOp<wgpu::Color> = LoadOp::Clear(Color::rgba(0.5, 0.25, 0.0, 1.0)).into_wgpu();
        assert_eq!(
            load,
            wgpu::LoadOp::Clear(wgpu::Color {
                r: 0.5,
                g: 0.25,
                b: 0.0,
                a: 1.0
            })
        );
        let store: wgpu::StoreOp = StoreOp::Discard.into_wgpu();
        assert_eq!(store, wgpu::StoreOp::Discard);
    }
}
