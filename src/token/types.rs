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
//! # Token types.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialsProvider;

/// Bearer token handed to the Kubernetes client and presented back to the
/// authenticator by the API server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    /// The opaque token string: `k8s-aws-v1.` followed by the URL-safe
    /// base64 encoding of a presigned `GetCallerIdentity` URL.
    pub token: String,

    /// When the client should stop presenting the token. One minute before
    /// the presigned URL expires, so clients never present a token the
    /// verifier is about to reject.
    pub expiration: DateTime<Utc>,
}

/// The AWS identity a verified token resolves to.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Identity {
    /// The raw Amazon Resource Name returned by `sts:GetCallerIdentity`.
    pub arn: String,

    /// The ARN in canonical form: STS assumed-role ARNs like
    /// `arn:aws:sts::ACCOUNTID:assumed-role/ROLENAME/SESSIONNAME` are
    /// converted to their IAM equivalent
    /// `arn:aws:iam::ACCOUNTID:role/ROLENAME`.
    pub canonical_arn: String,

    /// The 12 digit AWS account number.
    pub account_id: String,

    /// The unique user or role id (e.g. `AROAAAAAAAAAAAAAAAAAA`).
    pub user_id: String,

    /// The STS session name, or empty for non-session identities. For EC2
    /// instance roles this is the instance id. Only rely on it when nothing
    /// but EC2 may assume the role; other principals can put (nearly)
    /// arbitrary strings here.
    pub session_name: String,

    /// The access key id used to authenticate the request. Useful together
    /// with CloudTrail to pin down the individual behind an assumed role.
    pub access_key_id: String,
}

/// Options accepted by
/// [`get_with_options`](crate::token::GeneratorApi::get_with_options).
#[derive(Builder, Clone, Default)]
#[builder(setter(strip_option, into), default)]
pub struct GetTokenOptions {
    /// Region to resolve the STS endpoint for. Falls back to the region of
    /// the ambient configuration.
    pub region: Option<String>,

    /// Cluster the token is bound to. Required.
    pub cluster_id: String,

    /// Role to assume before signing.
    pub assume_role_arn: Option<String>,

    /// External id to pass on the assume-role call.
    pub assume_role_external_id: Option<String>,

    /// Session name for the assumed-role session.
    pub session_name: Option<String>,

    /// Pre-built credentials to sign with, skipping the ambient chain and
    /// the credential cache.
    pub session: Option<Arc<dyn CredentialsProvider>>,
}

impl fmt::Debug for GetTokenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetTokenOptions")
            .field("region", &self.region)
            .field("cluster_id", &self.cluster_id)
            .field("assume_role_arn", &self.assume_role_arn)
            .field("assume_role_external_id", &self.assume_role_external_id)
            .field("session_name", &self.session_name)
            .field("session", &self.session.as_ref().map(|_| ".."))
            .finish()
    }
}

pub(crate) const V1_PREFIX: &str = "k8s-aws-v1.";
pub(crate) const MAX_TOKEN_LEN_BYTES: usize = 1024 * 4;
/// `X-Amz-Date` format of SigV4 requests.
pub(crate) const DATE_HEADER_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Validity of a presigned URL past its `X-Amz-Date`.
pub(crate) fn presigned_url_expiration() -> TimeDelta {
    TimeDelta::minutes(15)
}

/// Response shape of the `GetCallerIdentity` endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct CallerIdentityWrapper {
    #[serde(rename = "GetCallerIdentityResponse")]
    pub(crate) response: CallerIdentityResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CallerIdentityResponse {
    #[serde(rename = "GetCallerIdentityResult")]
    pub(crate) result: CallerIdentityResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CallerIdentityResult {
    #[serde(rename = "Account")]
    pub(crate) account: String,
    #[serde(rename = "Arn")]
    pub(crate) arn: String,
    #[serde(rename = "UserId")]
    pub(crate) user_id: String,
}

/// `ExecCredential` envelope of the client-go credential plugin protocol.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExecCredential {
    pub(crate) kind: &'static str,
    pub(crate) api_version: &'static str,
    pub(crate) spec: ExecCredentialSpec,
    pub(crate) status: ExecCredentialStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExecCredentialSpec {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExecCredentialStatus {
    pub(crate) expiration_timestamp: String,
    pub(crate) token: String,
}

impl From<&Token> for ExecCredential {
    fn from(token: &Token) -> Self {
        Self {
            kind: "ExecCredential",
            api_version: "client.authentication.k8s.io/v1alpha1",
            spec: ExecCredentialSpec {},
            status: ExecCredentialStatus {
                expiration_timestamp: token
                    .expiration
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                token: token.token.clone(),
            },
        }
    }
}
