// Copyright 2026 pplc Authors
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

//! Expected failure outcomes of a launcher invocation.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Status {
    #[error("credential invalid")]
    CredentialInvalid,
    #[error("credential not found")]
    CredentialNotFound,
    #[error("search failed")]
    SearchFailed,
    /// An `--open` arg that names neither a document id nor a file.
    #[error("invalid argument")]
    InvalidArgument,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        1
    }

    /// Bare line written to stdout when a failure carries no result item.
    pub fn status_line(self) -> String {
        format!("status: {self}")
    }
}

pub type Outcome = Result<(), Status>;

pub fn exit_code(outcome: Outcome) -> i32 {
    match outcome {
        Ok(()) => 0,
        Err(status) => status.exit_code(),
    }
}
