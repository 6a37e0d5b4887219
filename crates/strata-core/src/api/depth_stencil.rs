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

//! Depth and stencil state descriptions.

/// Opaque handle to a depth/stencil state object created by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilStateId(pub u64);

/// Comparison used by depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes if new < old.
    Less,
    /// Passes if new == old.
    Equal,
    /// Passes if new <= old.
    LessEqual,
    /// Passes if new > old.
    Greater,
    /// Passes if new != old.
    NotEqual,
    /// Passes if new >= old.
    GreaterEqual,
    /// Always passes.
    Always,
}

/// What happens to a stencil value after a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOperation {
    /// Leave the value.
    Keep,
    /// Set to zero.
    Zero,
    /// Set to the reference value.
    Replace,
    /// Bitwise invert.
    Invert,
    /// Increment, clamping at the maximum.
    IncrementClamp,
    /// Decrement, clamping at zero.
    DecrementClamp,
    /// Increment, wrapping to zero.
    IncrementWrap,
    /// Decrement, wrapping to the maximum.
    DecrementWrap,
}

/// Stencil behaviour for one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFaceSettings {
    /// Test applied against the stored value.
    pub compare: CompareFunction,
    /// Applied when the stencil test fails.
    pub fail_op: StencilOperation,
    /// Applied when the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// Applied when both tests pass.
    pub pass_op: StencilOperation,
    /// Mask applied before comparing.
    pub read_mask: u32,
    /// Mask applied when writing.
    pub write_mask: u32,
}

impl StencilFaceSettings {
    /// A face that always passes and never writes.
    pub const IGNORE: Self = Self {
        compare: CompareFunction::Always,
        fail_op: StencilOperation::Keep,
        depth_fail_op: StencilOperation::Keep,
        pass_op: StencilOperation::Keep,
        read_mask: 0xff,
        write_mask: 0,
    };
}

/// Full depth/stencil state. Used as a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilSettings {
    /// Front-facing stencil behaviour.
    pub front: StencilFaceSettings,
    /// Back-facing stencil behaviour.
    pub back: StencilFaceSettings,
    /// Reference value for stencil comparisons and `Replace`.
    pub stencil_reference: u32,
    /// Whether the stencil test runs at all.
    pub stencil_test_enabled: bool,
    /// Depth comparison.
    pub depth_compare: CompareFunction,
    /// Whether depth values are written.
    pub depth_write_enabled: bool,
}

impl DepthStencilSettings {
    /// Depth and stencil both disabled.
    pub const DISABLED: Self = Self {
        front: StencilFaceSettings::IGNORE,
        back: StencilFaceSettings::IGNORE,
        stencil_reference: 0,
        stencil_test_enabled: false,
        depth_compare: CompareFunction::Always,
        depth_write_enabled: false,
    };

    /// Same stencil behaviour on both faces, depth disabled.
    pub const fn stencil(face: StencilFaceSettings, reference: u32) -> Self {
        Self {
            front: face,
            back: face,
            stencil_reference: reference,
            stencil_test_enabled: true,
            depth_compare: CompareFunction::Always,
            depth_write_enabled: false,
        }
    }

    /// Separate front/back stencil behaviour, depth disabled.
    pub const fn two_sided(front: StencilFaceSettings, back: StencilFaceSettings, reference: u32) -> Self {
        Self {
            front,
            back,
            stencil_reference: reference,
            stencil_test_enabled: true,
            depth_compare: CompareFunction::Always,
            depth_write_enabled: false,
        }
    }

    /// `true` when the settings touch the depth/stencil attachment.
    pub fn needs_attachment(&self) -> bool {
        self.stencil_test_enabled || self.depth_write_enabled || self.depth_compare != CompareFunction::Always
    }
}

impl Default for DepthStencilSettings {
    fn default() -> Self {
        Self::DISABLED
    }
}
