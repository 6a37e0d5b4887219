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

//! The append-only shader code dictionary.

use super::combination::BlendMode;
use super::key::{blend_mode_from_byte, tile_mode_from_byte, CodeSnippetId, PaintParamsKey};
use crate::api::{BlendFormula, TileMode, UniquePaintParamsId};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, PoisonError, RwLock};

/// A generated shading program.
///
/// `text` is a WGSL snippet defining
/// `fn shade(local: vec2<f32>, color: vec4<f32>) -> vec4<f32>`, which a backend links
/// into its fragment stage. Blending is not part of the text: it is fixed-function
/// state described by [`blend_formula`](Self::blend_formula).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    id: UniquePaintParamsId,
    key: PaintParamsKey,
    blend_mode: BlendMode,
    text: String,
}

impl ShaderProgram {
    /// Interned id.
    pub fn id(&self) -> UniquePaintParamsId {
        self.id
    }

    /// Key the program was generated from.
    pub fn key(&self) -> &PaintParamsKey {
        &self.key
    }

    /// Blend mode encoded in the key.
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Fixed-function blend coefficients.
    pub fn blend_formula(&self) -> BlendFormula {
        self.blend_mode.formula()
    }

    /// Generated WGSL snippet.
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Default)]
struct DictionaryInner {
    by_key: HashMap<PaintParamsKey, Arc<ShaderProgram>>,
    by_id: Vec<Arc<ShaderProgram>>,
}

/// Maps shading keys to generated programs. Entries are never removed, so ids stay
/// valid for the dictionary's lifetime.
#[derive(Debug, Default)]
pub struct ShaderCodeDictionary {
    inner: RwLock<DictionaryInner>,
}

impl ShaderCodeDictionary {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the program for `key`, generating it on first request.
    pub fn find_or_create(&self, key: PaintParamsKey) -> Arc<ShaderProgram> {
        if let Some(program) = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_key
            .get(&key)
        {
            return program.clone();
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(program) = inner.by_key.get(&key) {
            return program.clone();
        }

        let id = UniquePaintParamsId(inner.by_id.len() as u32);
        let (blend_mode, text) = generate_program(&key);
        let program = Arc::new(ShaderProgram {
            id,
            key: key.clone(),
            blend_mode,
            text,
        });
        log::debug!("Shader dictionary: new program {id:?} ({} bytes of WGSL)", program.text.len());
        inner.by_id.push(program.clone());
        inner.by_key.insert(key, program.clone());
        program
    }

    /// Looks up a program by id.
    pub fn lookup(&self, id: UniquePaintParamsId) -> Option<Arc<ShaderProgram>> {
        if id.is_none() {
            return None;
        }
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .get(id.0 as usize)
            .cloned()
    }

    /// Number of interned programs.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).by_id.len()
    }

    /// `true` when nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn tile_function(out: &mut String, name: &str, mode: TileMode) {
    let body = match mode {
        TileMode::Clamp => "vec2<f32>(clamp(t, 0.0, 1.0), 1.0)",
        TileMode::Repeat => "vec2<f32>(fract(t), 1.0)",
        TileMode::Mirror => "vec2<f32>(1.0 - abs(fract(t * 0.5) * 2.0 - 1.0), 1.0)",
        TileMode::Decal => "vec2<f32>(t, select(0.0, 1.0, t >= 0.0 && t <= 1.0))",
    };
    let _ = writeln!(out, "fn {name}(t: f32) -> vec2<f32> {{ return {body}; }}");
}

fn tile_at(payload: &[u8], index: usize) -> TileMode {
    payload
        .get(index)
        .and_then(|b| tile_mode_from_byte(*b))
        .unwrap_or_default()
}

fn generate_program(key: &PaintParamsKey) -> (BlendMode, String) {
    let mut out = String::new();
    let mut blend_mode = BlendMode::default();
    let mut shade_body = String::from("    return color;\n");

    for block in key.blocks() {
        let _ = writeln!(out, "// {:?} {:?}", block.snippet, block.payload);
        match block.snippet {
            CodeSnippetId::SolidColorShader => {
                shade_body = String::from("    return color;\n");
            }
            CodeSnippetId::LinearGradientShader => {
                tile_function(&mut out, "strata_tile", tile_at(block.payload, 0));
                shade_body = String::from(
                    "    let t = strata_tile((local.x + 1.0) * 0.5);\n    return color * t.x * t.y;\n",
                );
            }
            CodeSnippetId::RadialGradientShader => {
                tile_function(&mut out, "strata_tile", tile_at(block.payload, 0));
                shade_body =
                    String::from("    let t = strata_tile(length(local));\n    return color * (1.0 - t.x) * t.y;\n");
            }
            CodeSnippetId::SweepGradientShader => {
                tile_function(&mut out, "strata_tile", tile_at(block.payload, 0));
                shade_body = String::from(
                    "    let t = strata_tile(atan2(local.y, local.x) / 6.2831853 + 0.5);\n    return color * t.x * t.y;\n",
                );
            }
            CodeSnippetId::ImageShader => {
                tile_function(&mut out, "strata_tile_x", tile_at(block.payload, 0));
                tile_function(&mut out, "strata_tile_y", tile_at(block.payload, 1));
                shade_body = String::from(concat!(
                    "    let u = strata_tile_x((local.x + 1.0) * 0.5);\n",
                    "    let v = strata_tile_y((local.y + 1.0) * 0.5);\n",
                    "    let checker = (floor(u.x * 8.0) + floor(v.x * 8.0)) % 2.0;\n",
                    "    return color * mix(0.25, 1.0, checker) * u.y * v.y;\n",
                ));
            }
            CodeSnippetId::FixedFunctionBlender => {
                blend_mode = block
                    .payload
                    .first()
                    .and_then(|b| blend_mode_from_byte(*b))
                    .unwrap_or_default();
            }
        }
    }

    let _ = write!(out, "fn shade(local: vec2<f32>, color: vec4<f32>) -> vec4<f32> {{\n{shade_body}}}\n");
    (blend_mode, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{PaintParams, PaintParamsKeyBuilder, ShaderType};

    fn program_for(dict: &ShaderCodeDictionary, params: PaintParams) -> Arc<ShaderProgram> {
        dict.find_or_create(params.to_key(&mut PaintParamsKeyBuilder::new()))
    }

    #[test]
    fn ids_are_dense_and_stable() {
        let dict = ShaderCodeDictionary::new();
        let a = program_for(&dict, PaintParams::solid());
        let b = program_for(&dict, PaintParams::new(ShaderType::Image, TileMode::Repeat, BlendMode::Src));
        let a_again = program_for(&dict, PaintParams::solid());

        assert_eq!(a.id(), UniquePaintParamsId(0));
        assert_eq!(b.id(), UniquePaintParamsId(1));
        assert!(Arc::ptr_eq(&a, &a_again));
        assert_eq!(dict.len(), 2);
        assert!(Arc::ptr_eq(&dict.lookup(b.id()).unwrap(), &b));
        assert!(dict.lookup(UniquePaintParamsId::NONE).is_none());
    }

    #[test]
    fn generated_text_defines_shade_and_tiling() {
        let dict = ShaderCodeDictionary::new();
        let program = program_for(&dict, PaintParams::new(ShaderType::Image, TileMode::Decal, BlendMode::Screen));
        assert!(program.text().contains("fn shade(local: vec2<f32>, color: vec4<f32>) -> vec4<f32>"));
        assert!(program.text().contains("fn strata_tile_x"));
        assert!(program.text().contains("select(0.0, 1.0"));
        assert_eq!(program.blend_mode(), BlendMode::Screen);
    }
}
