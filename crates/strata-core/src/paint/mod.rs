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

//! Shading configurations and pipeline key generation.
//!
//! A draw's shading is described by [`PaintParams`]. Key generation turns it into a
//! [`PaintParamsKey`], a compact byte string of blocks, and interns that key in the
//! [`ShaderCodeDictionary`] to obtain a [`UniquePaintParamsId`](crate::api::UniquePaintParamsId).
//! Configurations that compile to the same code produce the same key.

pub mod combination;
pub mod dictionary;
pub mod key;

pub use self::combination::{BlendMode, PaintCombo, PaintParams, ShaderType};
pub use self::dictionary::{ShaderCodeDictionary, ShaderProgram};
pub use self::key::{create_key, CodeSnippetId, KeyBlock, PaintParamsKey, PaintParamsKeyBuilder};
pub use crate::api::TileMode;
