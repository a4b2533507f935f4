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
//! # Token verifier.
//!
//! Validates a presented token without trusting any of it: the embedded URL
//! must point at a known STS hostname of the configured partition, carry
//! only whitelisted query parameters, cover the cluster-binding header with
//! its signature, and sit inside the 15 minute validity window. Only then
//! is the URL replayed against STS, whose answer is the proof of identity.
//! The URL itself is never modified; query inspection happens on a
//! lowercased copy.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{NaiveDateTime, Utc};
use tracing::debug;
use url::Url;

use crate::arn;
use crate::sts::{CLUSTER_ID_HEADER, endpoint};
use crate::token::error::VerifierError;
use crate::token::types::{
    CallerIdentityWrapper, DATE_HEADER_FORMAT, Identity, MAX_TOKEN_LEN_BYTES, V1_PREFIX,
    presigned_url_expiration,
};

/// Query parameters allowed in a presigned token URL, lowercased.
static PARAMETER_WHITELIST: &[&str] = &[
    "action",
    "version",
    "x-amz-algorithm",
    "x-amz-credential",
    "x-amz-date",
    "x-amz-expires",
    "x-amz-security-token",
    "x-amz-signature",
    "x-amz-signedheaders",
    "x-amz-user-agent",
];

/// Token verification surface.
#[async_trait]
pub trait VerifierApi: Send + Sync {
    /// Verify a token and resolve it to the AWS identity that minted it.
    async fn verify(&self, token: &str) -> Result<Identity, VerifierError>;
}

/// Verifier bound to one cluster and one partition.
pub struct TokenVerifier {
    client: reqwest::Client,
    cluster_id: String,
    valid_sts_hostnames: HashSet<String>,
}

impl TokenVerifier {
    /// Create a verifier for `cluster_id`, allow-listing the STS hostnames
    /// of every region in `partition_id`.
    pub fn new(
        cluster_id: impl Into<String>,
        partition_id: &str,
    ) -> Result<Self, VerifierError> {
        // the first response is the final one, redirects are not followed
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            cluster_id: cluster_id.into(),
            valid_sts_hostnames: endpoint::hostnames_for_partition(partition_id),
        })
    }

    /// Run every check that does not require the network. Returns the
    /// embedded URL and the access key id from the credential scope.
    pub(crate) fn validate(&self, token: &str) -> Result<(Url, String), VerifierError> {
        if token.len() > MAX_TOKEN_LEN_BYTES {
            return Err(VerifierError::Format("token is too large".to_string()));
        }
        let Some(encoded) = token.strip_prefix(V1_PREFIX) else {
            return Err(VerifierError::Format(format!(
                "token is missing expected {V1_PREFIX:?} prefix"
            )));
        };

        let token_bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|err| VerifierError::Format(err.to_string()))?;
        let raw_url = String::from_utf8(token_bytes)
            .map_err(|err| VerifierError::Format(err.to_string()))?;
        let parsed_url =
            Url::parse(&raw_url).map_err(|err| VerifierError::Format(err.to_string()))?;

        if parsed_url.scheme() != "https" {
            return Err(VerifierError::Format(format!(
                "unexpected scheme {:?} in pre-signed URL",
                parsed_url.scheme()
            )));
        }
        self.verify_host(parsed_url.host_str().unwrap_or_default())?;
        if parsed_url.path() != "/" {
            return Err(VerifierError::Format(
                "unexpected path in pre-signed URL".to_string(),
            ));
        }

        let mut params_lower = HashMap::new();
        for (key, value) in parsed_url.query_pairs() {
            let key_lower = key.to_lowercase();
            if !PARAMETER_WHITELIST
                .iter()
                .any(|allowed| *allowed == key_lower)
            {
                return Err(VerifierError::Format(format!(
                    "non-whitelisted query parameter {key:?}"
                )));
            }
            if params_lower
                .insert(key_lower, value.into_owned())
                .is_some()
            {
                return Err(VerifierError::Format(
                    "query parameter with multiple values not supported".to_string(),
                ));
            }
        }

        if params_lower.get("action").map(String::as_str) != Some("GetCallerIdentity") {
            return Err(VerifierError::Format(
                "unexpected action parameter in pre-signed URL".to_string(),
            ));
        }
        if !has_signed_cluster_id_header(&params_lower) {
            return Err(VerifierError::Format(format!(
                "client did not sign the {CLUSTER_ID_HEADER} header in the pre-signed URL"
            )));
        }

        // minted URLs always say 60, but anything within the real validity
        // window is tolerated
        let expires_param = params_lower
            .get("x-amz-expires")
            .map(String::as_str)
            .unwrap_or_default();
        match expires_param.parse::<i64>() {
            Ok(expires) if (0..=900).contains(&expires) => {}
            _ => {
                return Err(VerifierError::Format(format!(
                    "invalid X-Amz-Expires parameter in pre-signed URL: {expires_param:?}"
                )));
            }
        }

        let date_param = params_lower
            .get("x-amz-date")
            .filter(|date| !date.is_empty())
            .ok_or_else(|| {
                VerifierError::Format(
                    "X-Amz-Date parameter must be present in pre-signed URL".to_string(),
                )
            })?;
        let signed_at = NaiveDateTime::parse_from_str(date_param, DATE_HEADER_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|err| {
                VerifierError::Format(format!(
                    "error parsing X-Amz-Date parameter {date_param} into format {DATE_HEADER_FORMAT}: {err}"
                ))
            })?;

        let expiration = signed_at + presigned_url_expiration();
        if Utc::now() > expiration {
            return Err(VerifierError::Format(format!(
                "X-Amz-Date parameter is expired ({} minute expiration) {signed_at}",
                presigned_url_expiration().num_minutes()
            )));
        }

        let access_key_id = params_lower
            .get("x-amz-credential")
            .map(|credential| {
                credential
                    .split('/')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
            .unwrap_or_default();

        Ok((parsed_url, access_key_id))
    }

    /// Replay the validated URL against STS and parse the response into an
    /// [`Identity`].
    async fn call_sts(
        &self,
        url: &Url,
        access_key_id: String,
    ) -> Result<Identity, VerifierError> {
        let request = self
            .client
            .get(url.as_str())
            .header(CLUSTER_ID_HEADER, &self.cluster_id)
            .header(reqwest::header::ACCEPT, "application/json")
            .build()
            // a decoded URL that parses never fails to build, but a failure
            // here is still the token's fault, not STS's
            .map_err(|err| VerifierError::Format(err.to_string()))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| VerifierError::Sts(format!("error during GET: {err}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| VerifierError::Sts(format!("error reading HTTP result: {err}")))?;
        if status != reqwest::StatusCode::OK {
            return Err(VerifierError::Sts(format!(
                "error from AWS (expected 200, got {}). Body: {body}",
                status.as_u16()
            )));
        }

        let caller_identity: CallerIdentityWrapper =
            serde_json::from_str(&body).map_err(|err| VerifierError::Sts(err.to_string()))?;
        let result = caller_identity.response.result;
        debug!("{} resolved to {}", url.host_str().unwrap_or_default(), result.arn);

        let canonical_arn =
            arn::canonicalize(&result.arn).map_err(|err| VerifierError::Sts(err.to_string()))?;

        let mut identity = Identity {
            arn: result.arn,
            canonical_arn,
            account_id: result.account,
            access_key_id,
            ..Default::default()
        };

        // the user id is `UserID:SessionName` for assumed roles, bare
        // `UserID` for IAM users
        let user_id_parts: Vec<&str> = result.user_id.split(':').collect();
        match user_id_parts.as_slice() {
            [user_id] => identity.user_id = user_id.to_string(),
            [user_id, session_name] => {
                identity.user_id = user_id.to_string();
                identity.session_name = session_name.to_string();
            }
            _ => {
                return Err(VerifierError::Sts(format!(
                    "malformed UserID {:?}",
                    result.user_id
                )));
            }
        }

        Ok(identity)
    }

    fn verify_host(&self, host: &str) -> Result<(), VerifierError> {
        if !self.valid_sts_hostnames.contains(host) {
            return Err(VerifierError::Format(format!(
                "unexpected hostname {host:?} in pre-signed URL"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VerifierApi for TokenVerifier {
    #[tracing::instrument(level = "debug", skip(self, token))]
    async fn verify(&self, token: &str) -> Result<Identity, VerifierError> {
        let (url, access_key_id) = self.validate(token)?;
        self.call_sts(&url, access_key_id).await
    }
}

fn has_signed_cluster_id_header(params_lower: &HashMap<String, String>) -> bool {
    params_lower
        .get("x-amz-signedheaders")
        .map(|signed_headers| {
            signed_headers
                .split(';')
                .any(|header| header.eq_ignore_ascii_case(CLUSTER_ID_HEADER))
        })
        .unwrap_or(false)
}
