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

//! Session-wide state shared by every recorder.

use crate::api::UniquePaintParamsId;
use crate::paint::{PaintParamsKey, ShaderCodeDictionary, ShaderProgram};
use std::sync::Arc;

/// Caches that outlive individual recorders: currently the shader code dictionary.
#[derive(Debug, Default)]
pub struct GlobalCache {
    shader_code_dictionary: ShaderCodeDictionary,
}

impl GlobalCache {
    /// Creates an empty global cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shader code dictionary.
    pub fn shader_code_dictionary(&self) -> &ShaderCodeDictionary {
        &self.shader_code_dictionary
    }

    /// Interns `key`, generating its program on first request.
    pub fn find_or_create(&self, key: PaintParamsKey) -> Arc<ShaderProgram> {
        self.shader_code_dictionary.find_or_create(key)
    }

    /// Program previously interned under `id`.
    pub fn lookup(&self, id: UniquePaintParamsId) -> Option<Arc<ShaderProgram>> {
        self.shader_code_dictionary.lookup(id)
    }

    /// Number of interned programs.
    pub fn len(&self) -> usize {
        self.shader_code_dictionary.len()
    }

    /// `true` when no program has been interned.
    pub fn is_empty(&self) -> bool {
        self.shader_code_dictionary.is_empty()
    }
}
