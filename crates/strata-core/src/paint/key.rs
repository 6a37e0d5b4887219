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

//! Block-structured shading keys.
//!
//! A key is a byte string of blocks. Each block is `[snippet id, payload length, payload...]`.
//! A complete paint key holds one shader block followed by one blender block.

use super::combination::{BlendMode, PaintParams, ShaderType};
use super::dictionary::ShaderCodeDictionary;
use crate::api::{TileMode, UniquePaintParamsId};
use std::sync::Once;

static CONICAL_FALLBACK: Once = Once::new();
static MULTIPLY_FALLBACK: Once = Once::new();

/// Identifies the code snippet a key block expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CodeSnippetId {
    /// Constant color from the vertex.
    SolidColorShader = 1,
    /// Linear gradient; payload: tile mode.
    LinearGradientShader = 2,
    /// Radial gradient; payload: tile mode.
    RadialGradientShader = 3,
    /// Sweep gradient; payload: tile mode.
    SweepGradientShader = 4,
    /// Image; payload: x and y tile modes.
    ImageShader = 5,
    /// Fixed-function blend; payload: blend mode.
    FixedFunctionBlender = 6,
}

impl CodeSnippetId {
    fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => CodeSnippetId::SolidColorShader,
            2 => CodeSnippetId::LinearGradientShader,
            3 => CodeSnippetId::RadialGradientShader,
            4 => CodeSnippetId::SweepGradientShader,
            5 => CodeSnippetId::ImageShader,
            6 => CodeSnippetId::FixedFunctionBlender,
            _ => return None,
        })
    }
}

/// An immutable, hashable shading key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaintParamsKey {
    data: Box<[u8]>,
}

/// One decoded block of a [`PaintParamsKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBlock<'a> {
    /// Snippet the block expands to.
    pub snippet: CodeSnippetId,
    /// Block payload.
    pub payload: &'a [u8],
}

impl PaintParamsKey {
    /// Raw bytes of the key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decodes the blocks of the key. Stops at the first malformed block.
    pub fn blocks(&self) -> impl Iterator<Item = KeyBlock<'_>> + '_ {
        let mut rest: &[u8] = &self.data;
        std::iter::from_fn(move || {
            let (&id, tail) = rest.split_first()?;
            let (&len, tail) = tail.split_first()?;
            let snippet = CodeSnippetId::from_u8(id)?;
            let len = usize::from(len);
            if tail.len() < len {
                return None;
            }
            let (payload, tail) = tail.split_at(len);
            rest = tail;
            Some(KeyBlock { snippet, payload })
        })
    }
}

/// Accumulates blocks into a [`PaintParamsKey`]. Reusable after [`lock_as_key`](Self::lock_as_key).
#[derive(Debug, Default)]
pub struct PaintParamsKeyBuilder {
    data: Vec<u8>,
    open_block: Option<usize>,
}

impl PaintParamsKeyBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a block. Blocks do not nest.
    pub fn begin_block(&mut self, snippet: CodeSnippetId) {
        assert!(self.open_block.is_none(), "a key block is already open");
        self.data.push(snippet as u8);
        self.open_block = Some(self.data.len());
        self.data.push(0);
    }

    /// Appends one payload byte to the open block.
    pub fn add_byte(&mut self, byte: u8) {
        assert!(self.open_block.is_some(), "no key block is open");
        self.data.push(byte);
    }

    /// Closes the open block and records its payload length.
    pub fn end_block(&mut self) {
        let Some(size_at) = self.open_block.take() else {
            panic!("no key block is open");
        };
        let len = self.data.len() - size_at - 1;
        self.data[size_at] = u8::try_from(len).unwrap_or_else(|_| panic!("key block payload too large: {len}"));
    }

    /// Finishes the key and resets the builder.
    pub fn lock_as_key(&mut self) -> PaintParamsKey {
        assert!(self.open_block.is_none(), "cannot lock a key with an open block");
        PaintParamsKey {
            data: std::mem::take(&mut self.data).into_boxed_slice(),
        }
    }

    /// Discards any partial key.
    pub fn reset(&mut self) {
        self.data.clear();
        self.open_block = None;
    }
}

pub(crate) fn tile_mode_to_byte(mode: TileMode) -> u8 {
    match mode {
        TileMode::Clamp => 0,
        TileMode::Repeat => 1,
        TileMode::Mirror => 2,
        TileMode::Decal => 3,
    }
}

pub(crate) fn tile_mode_from_byte(byte: u8) -> Option<TileMode> {
    TileMode::ALL.get(usize::from(byte)).copied()
}

pub(crate) fn blend_mode_from_byte(byte: u8) -> Option<BlendMode> {
    BlendMode::ALL.get(usize::from(byte)).copied()
}

fn blend_mode_to_byte(mode: BlendMode) -> u8 {
    BlendMode::ALL.iter().position(|m| *m == mode).unwrap_or(0) as u8
}

/// Repeating or mirroring a single texel samples the same texel as clamping.
fn optimize_tile_mode(mode: TileMode, extent: Option<u32>) -> TileMode {
    match (mode, extent) {
        (TileMode::Repeat | TileMode::Mirror, Some(1)) => TileMode::Clamp,
        _ => mode,
    }
}

fn effective_shader_type(shader_type: ShaderType) -> ShaderType {
    if shader_type == ShaderType::TwoPointConicalGradient {
        CONICAL_FALLBACK.call_once(|| {
            log::warn!("Two-point conical gradients are not generated natively; using a radial approximation.");
        });
        return ShaderType::RadialGradient;
    }
    shader_type
}

fn effective_blend_mode(blend_mode: BlendMode) -> BlendMode {
    if !blend_mode.is_fixed_function() {
        MULTIPLY_FALLBACK.call_once(|| {
            log::warn!("{blend_mode:?} blending needs destination reads; using modulate coefficients.");
        });
        return BlendMode::Modulate;
    }
    blend_mode
}

fn add_shader_block(builder: &mut PaintParamsKeyBuilder, params: &PaintParams) {
    let gradient = |builder: &mut PaintParamsKeyBuilder, snippet| {
        builder.begin_block(snippet);
        builder.add_byte(tile_mode_to_byte(params.tile_modes[0]));
        builder.end_block();
    };
    match effective_shader_type(params.shader_type) {
        ShaderType::None | ShaderType::SolidColor => {
            builder.begin_block(CodeSnippetId::SolidColorShader);
            builder.end_block();
        }
        ShaderType::LinearGradient => gradient(builder, CodeSnippetId::LinearGradientShader),
        ShaderType::RadialGradient | ShaderType::TwoPointConicalGradient => {
            gradient(builder, CodeSnippetId::RadialGradientShader)
        }
        ShaderType::SweepGradient => gradient(builder, CodeSnippetId::SweepGradientShader),
        ShaderType::Image => {
            let dims = params.image_dimensions;
            let tile_x = optimize_tile_mode(params.tile_modes[0], dims.map(|d| d.width));
            let tile_y = optimize_tile_mode(params.tile_modes[1], dims.map(|d| d.height));
            builder.begin_block(CodeSnippetId::ImageShader);
            builder.add_byte(tile_mode_to_byte(tile_x));
            builder.add_byte(tile_mode_to_byte(tile_y));
            builder.end_block();
        }
    }
}

impl PaintParams {
    /// Builds the shading key of these params.
    pub fn to_key(&self, builder: &mut PaintParamsKeyBuilder) -> PaintParamsKey {
        builder.reset();
        add_shader_block(builder, self);
        builder.begin_block(CodeSnippetId::FixedFunctionBlender);
        builder.add_byte(blend_mode_to_byte(effective_blend_mode(self.blend_mode)));
        builder.end_block();
        builder.lock_as_key()
    }

    /// Builds the shading key and interns it in `dict`.
    pub fn to_unique_id(&self, dict: &ShaderCodeDictionary, builder: &mut PaintParamsKeyBuilder) -> UniquePaintParamsId {
        dict.find_or_create(self.to_key(builder)).id()
    }
}

/// Creates the shading key of `(shader_type, tile_mode, blend_mode)` and interns it.
///
/// Configurations that generate identical code share an id: tile modes are dropped for
/// shaders that never tile, two-point conical gradients share the radial key, and
/// `Multiply` shares the `Modulate` key.
pub fn create_key(
    dict: &ShaderCodeDictionary,
    builder: &mut PaintParamsKeyBuilder,
    shader_type: ShaderType,
    tile_mode: TileMode,
    blend_mode: BlendMode,
) -> UniquePaintParamsId {
    PaintParams::new(shader_type, tile_mode, blend_mode).to_unique_id(dict, builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::Extent2D;

    fn key_of(params: PaintParams) -> PaintParamsKey {
        params.to_key(&mut PaintParamsKeyBuilder::new())
    }

    #[test]
    fn blocks_round_trip_through_the_builder() {
        let key = key_of(PaintParams::new(ShaderType::LinearGradient, TileMode::Mirror, BlendMode::Plus));
        let blocks: Vec<_> = key.blocks().collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].snippet, CodeSnippetId::LinearGradientShader);
        assert_eq!(blocks[0].payload, &[tile_mode_to_byte(TileMode::Mirror)]);
        assert_eq!(blocks[1].snippet, CodeSnippetId::FixedFunctionBlender);
        assert_eq!(blend_mode_from_byte(blocks[1].payload[0]), Some(BlendMode::Plus));
    }

    #[test]
    fn tile_mode_is_ignored_for_solid_colors() {
        let clamp = key_of(PaintParams::new(ShaderType::SolidColor, TileMode::Clamp, BlendMode::SrcOver));
        let repeat = key_of(PaintParams::new(ShaderType::SolidColor, TileMode::Repeat, BlendMode::SrcOver));
        let none = key_of(PaintParams::new(ShaderType::None, TileMode::Decal, BlendMode::SrcOver));
        assert_eq!(clamp, repeat);
        assert_eq!(clamp, none);
    }

    #[test]
    fn tile_mode_matters_for_gradients() {
        let clamp = key_of(PaintParams::new(ShaderType::SweepGradient, TileMode::Clamp, BlendMode::SrcOver));
        let repeat = key_of(PaintParams::new(ShaderType::SweepGradient, TileMode::Repeat, BlendMode::SrcOver));
        assert_ne!(clamp, repeat);
    }

    #[test]
    fn single_texel_axes_clamp() {
        let strip = PaintParams::new(ShaderType::Image, TileMode::Repeat, BlendMode::SrcOver)
            .with_image_dimensions(Extent2D::new(1, 64));
        let expected = PaintParams::new(ShaderType::Image, TileMode::Clamp, BlendMode::SrcOver)
            .with_tile_modes(TileMode::Clamp, TileMode::Repeat)
            .with_image_dimensions(Extent2D::new(1, 64));
        assert_eq!(key_of(strip), key_of(expected));
    }

    #[test]
    fn conical_and_multiply_degrade() {
        let conical = key_of(PaintParams::new(ShaderType::TwoPointConicalGradient, TileMode::Clamp, BlendMode::Multiply));
        let radial = key_of(PaintParams::new(ShaderType::RadialGradient, TileMode::Clamp, BlendMode::Modulate));
        assert_eq!(conical, radial);
    }

    #[test]
    #[should_panic(expected = "already open")]
    fn nested_blocks_are_rejected() {
        let mut builder = PaintParamsKeyBuilder::new();
        builder.begin_block(CodeSnippetId::SolidColorShader);
        builder.begin_block(CodeSnippetId::FixedFunctionBlender);
    }

    #[test]
    fn create_key_interns_equal_configurations_once() {
        let dict = ShaderCodeDictionary::new();
        let mut builder = PaintParamsKeyBuilder::new();
        let a = create_key(&dict, &mut builder, ShaderType::SolidColor, TileMode::Clamp, BlendMode::Src);
        let b = create_key(&dict, &mut builder, ShaderType::None, TileMode::Mirror, BlendMode::Src);
        let c = create_key(&dict, &mut builder, ShaderType::SolidColor, TileMode::Clamp, BlendMode::Dst);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(dict.len(), 2);
    }
}
