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

//! The immutable output of a recorder.

use crate::command_buffer::CommandBuffer;
use uuid::Uuid;

/// A snapped batch of work, ready to be inserted into its session.
///
/// A recording is consumed on insertion. Dropping it without inserting discards the work.
#[derive(Debug)]
pub struct Recording {
    id: Uuid,
    command_buffer: CommandBuffer,
}

impl Recording {
    pub(crate) fn new(command_buffer: CommandBuffer) -> Self {
        Self {
            id: Uuid::new_v4(),
            command_buffer,
        }
    }

    /// Unique id, used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Number of resources the recorded commands keep alive.
    pub fn tracked_resource_count(&self) -> usize {
        self.command_buffer.tracked_resource_count()
    }

    pub(crate) fn into_command_buffer(self) -> CommandBuffer {
        self.command_buffer
    }
}
