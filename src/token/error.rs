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
//! # Token errors.

use thiserror::Error;

use crate::credentials::CredentialsError;
use crate::sts::StsError;
use crate::token::types::GetTokenOptionsBuilderError;

/// Token generation error.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// `cluster_id` was empty.
    #[error("cluster id is required")]
    ClusterIdRequired,

    /// The credential session could not be built.
    #[error("could not create session: {source}")]
    Credentials {
        /// The source of the error.
        #[from]
        source: CredentialsError,
    },

    /// Options could not be assembled.
    #[error(transparent)]
    OptionsBuilder {
        #[from]
        source: GetTokenOptionsBuilderError,
    },

    /// No region was supplied and the ambient configuration resolves none.
    #[error("an aws region is required to sign the request")]
    RegionRequired,

    /// The STS client failed.
    #[error(transparent)]
    Sts {
        /// The source of the error.
        #[from]
        source: StsError,
    },
}

/// Token verification error.
///
/// `Format` means the token failed structural, temporal, or allow-list
/// validation and STS was never contacted. `Sts` means the token was
/// well-formed but the outbound `GetCallerIdentity` call failed or returned
/// something unusable.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// The token failed validation before any network call.
    #[error("input token was not properly formatted: {0}")]
    Format(String),

    /// The outbound call was attempted but failed.
    #[error("sts getCallerIdentity failed: {0}")]
    Sts(String),

    /// The HTTP client could not be constructed.
    #[error(transparent)]
    Http {
        /// The source of the error.
        #[from]
        source: reqwest::Error,
    },
}
