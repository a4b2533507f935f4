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
//! # Credential provider errors.

use thiserror::Error;

/// Credential provider error.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// STS rejected or failed the assume-role call.
    #[error("sts assume-role failed: {0}")]
    AssumeRole(String),

    /// The ambient credential chain failed to produce credentials.
    #[error("could not retrieve credentials from the chain: {source}")]
    Chain {
        /// The source of the error.
        #[from]
        source: aws_credential_types::provider::error::CredentialsError,
    },

    /// The loaded SDK configuration carries no credentials provider.
    #[error("no credentials provider available in the sdk configuration")]
    NoProviderConfigured,
}
