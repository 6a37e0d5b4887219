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

//! Integer extents used for textures and render targets.

use serde::{Deserialize, Serialize};

/// Width and height in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent2D {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either side is zero.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of texels covered by the extent.
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl From<(u32, u32)> for Extent2D {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_when_any_side_is_zero() {
        assert!(Extent2D::new(0, 16).is_empty());
        assert!(Extent2D::new(16, 0).is_empty());
        assert!(!Extent2D::new(1, 1).is_empty());
        assert_eq!(Extent2D::from((4, 8)).area(), 32);
    }
}
