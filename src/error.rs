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
//! # Error
//!
//! Diverse errors that can occur during authenticator processing.

use thiserror::Error;

use crate::arn::ArnError;
use crate::credentials::CredentialsError;
use crate::ec2::Ec2ProviderError;
use crate::sts::StsError;
use crate::token::filecache::FileCacheError;
use crate::token::{GeneratorError, VerifierError};

/// Authenticator error.
#[derive(Debug, Error)]
pub enum AuthenticatorError {
    #[error(transparent)]
    Arn {
        #[from]
        source: ArnError,
    },

    #[error(transparent)]
    Credentials {
        #[from]
        source: CredentialsError,
    },

    #[error(transparent)]
    Ec2Provider {
        #[from]
        source: Ec2ProviderError,
    },

    #[error(transparent)]
    FileCache {
        #[from]
        source: FileCacheError,
    },

    #[error(transparent)]
    Generator {
        #[from]
        source: GeneratorError,
    },

    #[error(transparent)]
    IO {
        #[from]
        source: std::io::Error,
    },

    /// Json serialization error.
    #[error("json serde error: {}", source)]
    JsonError {
        /// The source of the error.
        #[from]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Sts {
        #[from]
        source: StsError,
    },

    /// Url parsing error.
    #[error(transparent)]
    UrlParse {
        #[from]
        source: url::ParseError,
    },

    #[error(transparent)]
    Verifier {
        #[from]
        source: VerifierError,
    },
}
