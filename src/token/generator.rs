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
//! # Token generator.
//!
//! Mints cluster-bound bearer tokens. A token is a presigned
//! `sts:GetCallerIdentity` URL whose signature covers the
//! `x-k8s-aws-id: <cluster>` header, encoded with the `k8s-aws-v1.` prefix.
//! Whoever can sign such a request *is* the identity; the verifier only
//! replays the URL against STS.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{TimeDelta, Utc};
use tracing::warn;

use crate::credentials::{CredentialsProvider, DefaultChainProvider};
use crate::sts::{AssumeRoleProvider, AssumeRoleRequest, StsApi, StsClient};
use crate::token::error::GeneratorError;
use crate::token::filecache::{Env, FileCacheProvider, OsEnv};
use crate::token::types::{
    ExecCredential, GetTokenOptions, Token, V1_PREFIX, presigned_url_expiration,
};

/// Profile assumed when `AWS_PROFILE` is unset.
const DEFAULT_PROFILE: &str = "default";

/// Token minting surface.
#[async_trait]
pub trait GeneratorApi: Send + Sync {
    /// Get a token for the cluster using the default credential chain.
    async fn get(&self, cluster_id: &str) -> Result<Token, GeneratorError>;

    /// Get a token by assuming the given role first. An empty `role_arn`
    /// behaves like [`get`](Self::get).
    async fn get_with_role(
        &self,
        cluster_id: &str,
        role_arn: &str,
    ) -> Result<Token, GeneratorError>;

    /// Like [`get_with_role`](Self::get_with_role), signing the assume-role
    /// call with the supplied credentials instead of the ambient chain.
    async fn get_with_role_for_session(
        &self,
        cluster_id: &str,
        role_arn: &str,
        session: Arc<dyn CredentialsProvider>,
    ) -> Result<Token, GeneratorError>;

    /// Get a token with the full option surface.
    async fn get_with_options(&self, options: &GetTokenOptions) -> Result<Token, GeneratorError>;

    /// Get a token through an already-built STS client, skipping session
    /// construction entirely.
    async fn get_with_sts(
        &self,
        cluster_id: &str,
        sts: Arc<dyn StsApi>,
    ) -> Result<Token, GeneratorError>;

    /// Render the token as a client-go `ExecCredential` JSON envelope.
    fn format_json(&self, token: &Token) -> String;
}

/// Token generator over the ambient credential chain.
pub struct TokenGenerator {
    forward_session_name: bool,
    cache: bool,
    env: Arc<dyn Env>,
}

impl TokenGenerator {
    /// Create a generator.
    ///
    /// With `forward_session_name` the session name of an already federated
    /// caller is carried onto the assumed-role session for better audit
    /// trails. With `cache` fresh credentials are persisted to the on-disk
    /// cache shared with concurrent invocations.
    pub fn new(forward_session_name: bool, cache: bool) -> Result<Self, GeneratorError> {
        Ok(Self {
            forward_session_name,
            cache,
            env: Arc::new(OsEnv),
        })
    }

    fn profile(&self) -> String {
        match self.env.get("AWS_PROFILE") {
            profile if !profile.is_empty() => profile,
            _ => DEFAULT_PROFILE.to_string(),
        }
    }
}

#[async_trait]
impl GeneratorApi for TokenGenerator {
    async fn get(&self, cluster_id: &str) -> Result<Token, GeneratorError> {
        self.get_with_options(&GetTokenOptions {
            cluster_id: cluster_id.to_string(),
            ..Default::default()
        })
        .await
    }

    async fn get_with_role(
        &self,
        cluster_id: &str,
        role_arn: &str,
    ) -> Result<Token, GeneratorError> {
        self.get_with_options(&GetTokenOptions {
            cluster_id: cluster_id.to_string(),
            assume_role_arn: Some(role_arn.to_string()),
            ..Default::default()
        })
        .await
    }

    async fn get_with_role_for_session(
        &self,
        cluster_id: &str,
        role_arn: &str,
        session: Arc<dyn CredentialsProvider>,
    ) -> Result<Token, GeneratorError> {
        self.get_with_options(&GetTokenOptions {
            cluster_id: cluster_id.to_string(),
            assume_role_arn: Some(role_arn.to_string()),
            session: Some(session),
            ..Default::default()
        })
        .await
    }

    #[tracing::instrument(level = "debug", skip(self, options), fields(cluster_id = %options.cluster_id))]
    async fn get_with_options(&self, options: &GetTokenOptions) -> Result<Token, GeneratorError> {
        if options.cluster_id.is_empty() {
            return Err(GeneratorError::ClusterIdRequired);
        }
        let assume_role_arn = options
            .assume_role_arn
            .as_deref()
            .filter(|role_arn| !role_arn.is_empty());

        let (credentials, region): (Arc<dyn CredentialsProvider>, String) = match &options.session
        {
            Some(session) => {
                // a supplied session carries no region of its own
                let region = options
                    .region
                    .clone()
                    .ok_or(GeneratorError::RegionRequired)?;
                (session.clone(), region)
            }
            None => {
                let chain = DefaultChainProvider::load(options.region.as_deref()).await?;
                let region = options
                    .region
                    .clone()
                    .or_else(|| chain.region().map(str::to_string))
                    .ok_or(GeneratorError::RegionRequired)?;

                let mut credentials: Arc<dyn CredentialsProvider> = Arc::new(chain);
                if self.cache {
                    match FileCacheProvider::new(
                        &options.cluster_id,
                        &self.profile(),
                        assume_role_arn.unwrap_or_default(),
                        credentials.clone(),
                    ) {
                        Ok(provider) => credentials = Arc::new(provider),
                        Err(err) => warn!("unable to use credential cache: {err}"),
                    }
                }
                (credentials, region)
            }
        };

        let sts: Arc<dyn StsApi> = Arc::new(StsClient::new(&region, credentials)?);

        let sts = match assume_role_arn {
            None => sts,
            Some(role_arn) => {
                let session_name = if self.forward_session_name {
                    // an already federated caller keeps its session name on
                    // the new session
                    let identity = sts.get_caller_identity().await?;
                    session_name_from_user_id(&identity.user_id)
                } else {
                    options.session_name.clone()
                };
                let assumed: Arc<dyn CredentialsProvider> = Arc::new(AssumeRoleProvider::new(
                    sts,
                    AssumeRoleRequest {
                        role_arn: role_arn.to_string(),
                        session_name,
                        external_id: options.assume_role_external_id.clone(),
                    },
                ));
                Arc::new(StsClient::new(&region, assumed)?) as Arc<dyn StsApi>
            }
        };

        self.get_with_sts(&options.cluster_id, sts).await
    }

    async fn get_with_sts(
        &self,
        cluster_id: &str,
        sts: Arc<dyn StsApi>,
    ) -> Result<Token, GeneratorError> {
        let url = sts.presign_get_caller_identity(cluster_id).await?;

        // one minute of cushion before the presigned URL itself expires
        let expiration = Utc::now() + (presigned_url_expiration() - TimeDelta::minutes(1));
        Ok(Token {
            token: format!("{V1_PREFIX}{}", URL_SAFE_NO_PAD.encode(url.as_str())),
            expiration,
        })
    }

    fn format_json(&self, token: &Token) -> String {
        serde_json::to_string(&ExecCredential::from(token)).unwrap_or_default()
    }
}

/// The session-name component of an assumed-role user id
/// (`<role id>:<session name>`), or `None` for plain principals.
fn session_name_from_user_id(user_id: &str) -> Option<String> {
    user_id
        .split_once(':')
        .map(|(_, session_name)| session_name.to_string())
}
