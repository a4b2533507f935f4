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
//! # Token provider.
//!
//! A token is a presigned `sts:GetCallerIdentity` URL whose signature
//! covers the `x-k8s-aws-id` cluster-binding header, wrapped as
//! `k8s-aws-v1.<base64url>`. The [generator](GeneratorApi) mints tokens
//! from locally available credentials; the [verifier](VerifierApi) accepts
//! a token, runs it through strict structural and temporal validation, and
//! replays the URL against STS to resolve the signing principal. The
//! cluster binding rides in the signed header: presenting a token to the
//! wrong cluster makes the replayed signature invalid, which is how the
//! mismatch is caught.

pub mod error;
pub mod filecache;
mod generator;
#[cfg(test)]
mod mock;
pub mod types;
mod verifier;

pub use error::{GeneratorError, VerifierError};
pub use generator::{GeneratorApi, TokenGenerator};
#[cfg(test)]
pub use mock::{MockTokenGenerator, MockTokenVerifier};
pub use types::{GetTokenOptions, GetTokenOptionsBuilder, Identity, Token};
pub use verifier::{TokenVerifier, VerifierApi};
