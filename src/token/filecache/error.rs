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
//
// SPDX-License-Identifier: Apache-2.0
//! # Credential file cache errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Credential file cache error.
///
/// Only [`open`](crate::token::filecache::FileCacheProvider::new) surfaces
/// these to callers; failures while persisting a retrieved credential are
/// logged and swallowed, the cache being an optimization.
#[derive(Debug, Error)]
pub enum FileCacheError {
    /// The cache file is readable by group or others.
    #[error("cache file {} is not private", .filename.display())]
    NotPrivate {
        /// Path of the offending file.
        filename: PathBuf,
    },

    /// The advisory lock could not be taken.
    #[error("unable to lock cache file {}: {source}", .filename.display())]
    Lock {
        filename: PathBuf,
        /// The source of the error.
        source: io::Error,
    },

    /// The advisory lock stayed contended past the deadline.
    #[error("timed out waiting for the lock on cache file {}", .filename.display())]
    LockTimeout { filename: PathBuf },

    /// The cache file content is not valid YAML.
    #[error("unable to parse cache file: {source}")]
    Parse {
        /// The source of the error.
        #[from]
        source: serde_yaml::Error,
    },

    /// The cache file could not be read.
    #[error("unable to read cache file: {source}")]
    Read { source: io::Error },

    /// The cache file could not be examined.
    #[error("couldn't stat cache file: {source}")]
    Stat { source: io::Error },

    /// The cache file could not be written.
    #[error("unable to write cache file: {source}")]
    Write { source: io::Error },
}
