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
//! # STS client errors.

use thiserror::Error;

use crate::credentials::CredentialsError;

/// STS client error.
#[derive(Debug, Error)]
pub enum StsError {
    /// An STS API call failed.
    #[error("sts api call failed: {0}")]
    Api(String),

    /// Credentials for signing could not be retrieved.
    #[error(transparent)]
    Credentials {
        /// The source of the error.
        #[from]
        source: CredentialsError,
    },

    /// The endpoint URL for the region could not be built.
    #[error("could not build sts endpoint url: {source}")]
    Endpoint {
        /// The source of the error.
        #[from]
        source: url::ParseError,
    },

    /// STS returned an assume-role response without credentials.
    #[error("assume-role response is missing credentials")]
    MissingAssumedCredentials,

    /// Request presigning failed.
    #[error("could not presign request: {0}")]
    Presign(String),
}
