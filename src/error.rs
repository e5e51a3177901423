// Copyright 2024 OctoFHIR Team
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

//! Error types for the query engine
//!
//! Compiling, walking and matching never fail. Errors only surface at the
//! boundary where callers hand in contexts or raw JSON text.

use thiserror::Error;

/// Result type alias for ld-query operations
pub type Result<T> = std::result::Result<T, LdQueryError>;

/// Error type for ld-query operations
#[derive(Error, Debug)]
pub enum LdQueryError {
    /// The supplied context is not a JSON object
    #[error("Invalid context: {message}")]
    InvalidContext {
        /// Human-readable error message
        message: String,
    },

    /// The supplied document could not be parsed
    #[error("Invalid document: {message}")]
    InvalidDocument {
        /// Human-readable error message
        message: String,
    },

    /// Underlying JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LdQueryError {
    /// Create an invalid context error
    pub fn invalid_context(message: impl Into<String>) -> Self {
        Self::InvalidContext {
            message: message.into(),
        }
    }

    /// Create an invalid document error
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}
