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

//! Shader kinds, blend modes and the combination sets used for warm-up.

use crate::api::{BlendFactor, BlendFormula, TileMode};
use crate::dimension::Extent2D;

/// Kind of shader coloring a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    /// No shader: the paint color is used.
    None,
    /// A constant color.
    SolidColor,
    /// Linear gradient along x.
    LinearGradient,
    /// Radial gradient around the origin.
    RadialGradient,
    /// Angular gradient around the origin.
    SweepGradient,
    /// Two-point conical gradient.
    TwoPointConicalGradient,
    /// Sampled image.
    Image,
}

impl ShaderType {
    /// All shader types, in declaration order.
    pub const ALL: [ShaderType; 7] = [
        ShaderType::None,
        ShaderType::SolidColor,
        ShaderType::LinearGradient,
        ShaderType::RadialGradient,
        ShaderType::SweepGradient,
        ShaderType::TwoPointConicalGradient,
        ShaderType::Image,
    ];

    /// `true` when the shader's output depends on its tile modes.
    pub const fn uses_tile_modes(self) -> bool {
        !matches!(self, ShaderType::None | ShaderType::SolidColor)
    }
}

/// How a draw's color combines with the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// r = 0
    Clear,
    /// r = s
    Src,
    /// r = d
    Dst,
    /// r = s + (1-sa)*d
    #[default]
    SrcOver,
    /// r = d + (1-da)*s
    DstOver,
    /// r = s * da
    SrcIn,
    /// r = d * sa
    DstIn,
    /// r = s * (1-da)
    SrcOut,
    /// r = d * (1-sa)
    DstOut,
    /// r = s*da + d*(1-sa)
    SrcATop,
    /// r = d*sa + s*(1-da)
    DstATop,
    /// r = s*(1-da) + d*(1-sa)
    Xor,
    /// r = min(s + d, 1)
    Plus,
    /// r = s*d
    Modulate,
    /// r = s + d - s*d
    Screen,
    /// r = s*(1-da) + d*(1-sa) + s*d
    Multiply,
}

impl BlendMode {
    /// All blend modes, in declaration order.
    pub const ALL: [BlendMode; 16] = [
        BlendMode::Clear,
        BlendMode::Src,
        BlendMode::Dst,
        BlendMode::SrcOver,
        BlendMode::DstOver,
        BlendMode::SrcIn,
        BlendMode::DstIn,
        BlendMode::SrcOut,
        BlendMode::DstOut,
        BlendMode::SrcATop,
        BlendMode::DstATop,
        BlendMode::Xor,
        BlendMode::Plus,
        BlendMode::Modulate,
        BlendMode::Screen,
        BlendMode::Multiply,
    ];

    /// `true` when the mode is expressible with fixed-function coefficients.
    pub const fn is_fixed_function(self) -> bool {
        !matches!(self, BlendMode::Multiply)
    }

    /// Fixed-function coefficients for the mode, on premultiplied colors.
    ///
    /// `Multiply` needs the destination in the shader; it reports the `Modulate`
    /// coefficients, which agree with it for opaque inputs.
    pub const fn formula(self) -> BlendFormula {
        use BlendFactor::*;
        let (src, dst) = match self {
            BlendMode::Clear => (Zero, Zero),
            BlendMode::Src => (One, Zero),
            BlendMode::Dst => (Zero, One),
            BlendMode::SrcOver => (One, OneMinusSrcAlpha),
            BlendMode::DstOver => (OneMinusDstAlpha, One),
            BlendMode::SrcIn => (DstAlpha, Zero),
            BlendMode::DstIn => (Zero, SrcAlpha),
            BlendMode::SrcOut => (OneMinusDstAlpha, Zero),
            BlendMode::DstOut => (Zero, OneMinusSrcAlpha),
            BlendMode::SrcATop => (DstAlpha, OneMinusSrcAlpha),
            BlendMode::DstATop => (OneMinusDstAlpha, SrcAlpha),
            BlendMode::Xor => (OneMinusDstAlpha, OneMinusSrcAlpha),
            BlendMode::Plus => (One, One),
            BlendMode::Modulate | BlendMode::Multiply => (Zero, Src),
            BlendMode::Screen => (One, OneMinusSrc),
        };
        BlendFormula::new(src, dst)
    }
}

/// Shading configuration of a single draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaintParams {
    /// Shader kind.
    pub shader_type: ShaderType,
    /// Tile modes along x and y. Gradients only use the first.
    pub tile_modes: [TileMode; 2],
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// Size of the sampled image, for `ShaderType::Image`.
    pub image_dimensions: Option<Extent2D>,
}

impl PaintParams {
    /// Same tile mode on both axes.
    pub fn new(shader_type: ShaderType, tile_mode: TileMode, blend_mode: BlendMode) -> Self {
        Self {
            shader_type,
            tile_modes: [tile_mode, tile_mode],
            blend_mode,
            image_dimensions: None,
        }
    }

    /// A solid-color source-over paint.
    pub fn solid() -> Self {
        Self::new(ShaderType::SolidColor, TileMode::Clamp, BlendMode::SrcOver)
    }

    /// Sets the tile mode of each axis.
    #[must_use]
    pub fn with_tile_modes(mut self, tile_x: TileMode, tile_y: TileMode) -> Self {
        self.tile_modes = [tile_x, tile_y];
        self
    }

    /// Sets the size of the sampled image.
    #[must_use]
    pub fn with_image_dimensions(mut self, dimensions: Extent2D) -> Self {
        self.image_dimensions = Some(dimensions);
        self
    }
}

/// The sets of blend modes, shader types and tile modes a warm-up should cover.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaintCombo {
    /// Blend modes to cover.
    pub blend_modes: Vec<BlendMode>,
    /// Shader types to cover.
    pub shader_types: Vec<ShaderType>,
    /// Tile modes to cover.
    pub tile_modes: Vec<TileMode>,
}

impl PaintCombo {
    /// Creates a combination set.
    pub fn new(
        blend_modes: impl Into<Vec<BlendMode>>,
        shader_types: impl Into<Vec<ShaderType>>,
        tile_modes: impl Into<Vec<TileMode>>,
    ) -> Self {
        Self {
            blend_modes: blend_modes.into(),
            shader_types: shader_types.into(),
            tile_modes: tile_modes.into(),
        }
    }

    /// Every blend mode, shader type and tile mode.
    pub fn all() -> Self {
        Self::new(BlendMode::ALL, ShaderType::ALL, TileMode::ALL)
    }

    /// Number of combinations in the Cartesian product.
    pub fn len(&self) -> usize {
        self.blend_modes.len() * self.shader_types.len() * self.tile_modes.len()
    }

    /// `true` when any of the sets is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the Cartesian product as `(blend, shader, tile)`.
    pub fn combinations(&self) -> impl Iterator<Item = (BlendMode, ShaderType, TileMode)> + '_ {
        self.blend_modes.iter().flat_map(move |&blend| {
            self.shader_types.iter().flat_map(move |&shader| {
                self.tile_modes.iter().map(move |&tile| (blend, shader, tile))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinations_cover_the_cartesian_product() {
        let combo = PaintCombo::new(
            [BlendMode::SrcOver, BlendMode::Plus],
            [ShaderType::SolidColor, ShaderType::Image],
            [TileMode::Clamp, TileMode::Repeat, TileMode::Mirror],
        );
        assert_eq!(combo.len(), 12);
        assert_eq!(combo.combinations().count(), 12);
        assert!(combo
            .combinations()
            .any(|c| c == (BlendMode::Plus, ShaderType::Image, TileMode::Mirror)));
        assert!(PaintCombo::default().is_empty());
    }

    #[test]
    fn porter_duff_coefficients() {
        let src_over = BlendMode::SrcOver.formula();
        assert_eq!(src_over.src_factor, BlendFactor::One);
        assert_eq!(src_over.dst_factor, BlendFactor::OneMinusSrcAlpha);
        assert_eq!(BlendMode::Screen.formula(), BlendFormula::new(BlendFactor::One, BlendFactor::OneMinusSrc));
        assert_eq!(BlendMode::Multiply.formula(), BlendMode::Modulate.formula());
        assert!(!BlendMode::Multiply.is_fixed_function());
    }
}
