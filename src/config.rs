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

//! Cache configuration options

/// Configuration for per-document trace caching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Whether new handles keep the traces of their document between queries
    pub trace_caching: bool,
}

impl CacheConfig {
    /// Create a new cache configuration
    pub fn new(trace_caching: bool) -> Self {
        Self { trace_caching }
    }

    /// Create a configuration with trace caching disabled
    pub fn disabled() -> Self {
        Self {
            trace_caching: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            trace_caching: true,
        }
    }
}
