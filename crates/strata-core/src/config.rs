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

//! Session configuration.

use crate::api::RenderPassDesc;
use serde::{Deserialize, Serialize};

/// When the resource cache drops entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Keep every entry for the lifetime of the session.
    #[default]
    RetainAll,
    /// Keep at most `max_entries` per cache, dropping least recently used entries
    /// that nothing outside the cache references.
    Bounded {
        /// Soft limit on entries per cache.
        max_entries: usize,
    },
}

/// Resource cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceCacheConfig {
    /// Eviction policy applied to every keyed cache.
    pub eviction: EvictionPolicy,
}

/// Options for creating a [`Session`](crate::session::Session).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Resource cache settings.
    pub resource_cache: ResourceCacheConfig,
    /// Compile native pipelines during [`pre_compile`](crate::session::Session::pre_compile)
    /// instead of on first use.
    pub eager_pipeline_compilation: bool,
    /// Render pass pipelines are compiled against during eager warm-up.
    pub default_render_pass: RenderPassDesc,
}

impl SessionOptions {
    /// Parses options from JSON. Missing fields take their default.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serializes the options to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
