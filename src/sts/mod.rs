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
//! # STS client.
//!
//! The narrow STS capability the authenticator consumes: calling
//! `GetCallerIdentity`, assuming a role, and presigning a
//! `GetCallerIdentity` request with the cluster-binding header in the
//! signature. [`StsClient`] implements the capability over the AWS SDK and
//! SigV4 query-parameter signing; everything above it only sees the
//! [`StsApi`] trait.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_sigv4::http_request::{
    SignableBody, SignableRequest, SignatureLocation, SigningSettings,
};
use aws_smithy_runtime_api::client::identity::Identity;
use aws_smithy_types::error::display::DisplayErrorContext;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use url::Url;

pub mod endpoint;
pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

use crate::credentials::{
    Credentials, CredentialsError, CredentialsProvider, SdkCredentialsBridge,
};
pub use error::StsError;
#[cfg(test)]
pub use mock::MockStsApi;
pub use types::{AssumeRoleRequest, CallerIdentity};

/// Header binding a presigned request to one cluster. The header must be
/// covered by the request signature for the binding to hold.
pub const CLUSTER_ID_HEADER: &str = "x-k8s-aws-id";

/// Value of the `X-Amz-Expires` parameter on presigned URLs. STS caps the
/// real validity at 15 minutes past `X-Amz-Date` regardless.
const PRESIGN_EXPIRES: Duration = Duration::from_secs(60);

/// Capability surface of the STS service.
#[async_trait]
pub trait StsApi: Send + Sync {
    /// Fetch the identity of the calling principal.
    async fn get_caller_identity(&self) -> Result<CallerIdentity, StsError>;

    /// Obtain temporary credentials for the given role.
    async fn assume_role(&self, request: &AssumeRoleRequest) -> Result<Credentials, StsError>;

    /// Presign a `GetCallerIdentity` request bound to the cluster by a
    /// signed `x-k8s-aws-id` header.
    async fn presign_get_caller_identity(&self, cluster_id: &str) -> Result<Url, StsError>;
}

/// STS client over the AWS SDK and SigV4 query signing.
pub struct StsClient {
    client: aws_sdk_sts::Client,
    credentials: Arc<dyn CredentialsProvider>,
    region: String,
    endpoint: Url,
}

impl StsClient {
    /// Build a client for the region, signing with the given credentials.
    pub fn new(
        region: &str,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<Self, StsError> {
        let endpoint = endpoint::resolve_endpoint(region)?;
        let config = aws_sdk_sts::Config::builder()
            .behavior_version(aws_sdk_sts::config::BehaviorVersion::latest())
            .region(aws_sdk_sts::config::Region::new(region.to_string()))
            .endpoint_url(endpoint.to_string())
            .credentials_provider(SdkCredentialsBridge::new(credentials.clone()))
            .build();
        Ok(Self {
            client: aws_sdk_sts::Client::from_conf(config),
            credentials,
            region: region.to_string(),
            endpoint,
        })
    }
}

#[async_trait]
impl StsApi for StsClient {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_caller_identity(&self) -> Result<CallerIdentity, StsError> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|err| StsError::Api(DisplayErrorContext(&err).to_string()))?;
        Ok(CallerIdentity {
            account: output.account().unwrap_or_default().to_string(),
            arn: output.arn().unwrap_or_default().to_string(),
            user_id: output.user_id().unwrap_or_default().to_string(),
        })
    }

    #[tracing::instrument(level = "debug", skip(self), fields(role_arn = %request.role_arn))]
    async fn assume_role(&self, request: &AssumeRoleRequest) -> Result<Credentials, StsError> {
        let session_name = request
            .session_name
            .clone()
            .unwrap_or_else(generated_session_name);
        let output = self
            .client
            .assume_role()
            .role_arn(&request.role_arn)
            .role_session_name(session_name)
            .set_external_id(request.external_id.clone())
            .send()
            .await
            .map_err(|err| StsError::Api(DisplayErrorContext(&err).to_string()))?;

        let credentials = output
            .credentials()
            .ok_or(StsError::MissingAssumedCredentials)?;
        let expiration = credentials.expiration();
        Ok(Credentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            source: "AssumeRoleProvider".to_string(),
            can_expire: true,
            expires: DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos()),
        })
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn presign_get_caller_identity(&self, cluster_id: &str) -> Result<Url, StsError> {
        let credentials = self.credentials.provide_credentials().await?;

        let mut settings = SigningSettings::default();
        settings.expires_in = Some(PRESIGN_EXPIRES);
        settings.signature_location = SignatureLocation::QueryParams;

        let session_token =
            (!credentials.session_token.is_empty()).then_some(credentials.session_token);
        let identity = Identity::from(aws_credential_types::Credentials::new(
            credentials.access_key_id,
            credentials.secret_access_key,
            session_token,
            credentials.expires.map(SystemTime::from),
            "StsClient",
        ));
        let params = aws_sigv4::sign::v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name("sts")
            .time(SystemTime::now())
            .settings(settings)
            .build()
            .map_err(|err| StsError::Presign(err.to_string()))?;

        // The signature covers the host and cluster-binding headers only;
        // the default user agent stays out of it.
        let url = format!("{}?Action=GetCallerIdentity&Version=2011-06-15", self.endpoint);
        let headers = vec![(CLUSTER_ID_HEADER, cluster_id)];
        let signable = SignableRequest::new(
            "GET",
            url.clone(),
            headers.into_iter(),
            SignableBody::Bytes(&[]),
        )
        .map_err(|err| StsError::Presign(err.to_string()))?;

        let (instructions, _signature) = aws_sigv4::http_request::sign(
            signable,
            &aws_sigv4::http_request::SigningParams::V4(params),
        )
        .map_err(|err| StsError::Presign(err.to_string()))?
        .into_parts();

        let mut request = http::Request::builder()
            .uri(url.as_str())
            .body(())
            .map_err(|err| StsError::Presign(err.to_string()))?;
        instructions.apply_to_request_http1x(&mut request);

        Ok(Url::parse(&request.uri().to_string())?)
    }
}

fn generated_session_name() -> String {
    format!("aws-iam-authenticator-{}", Utc::now().timestamp_millis())
}

/// Credentials provider that assumes a role through an [`StsApi`], caching
/// the temporary credentials until they expire.
pub struct AssumeRoleProvider {
    sts: Arc<dyn StsApi>,
    request: AssumeRoleRequest,
    cached: Mutex<Option<Credentials>>,
}

impl AssumeRoleProvider {
    pub fn new(sts: Arc<dyn StsApi>, request: AssumeRoleRequest) -> Self {
        Self {
            sts,
            request,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl CredentialsProvider for AssumeRoleProvider {
    async fn provide_credentials(&self) -> Result<Credentials, CredentialsError> {
        let mut cached = self.cached.lock().await;
        if let Some(credentials) = cached.as_ref()
            && !credentials.is_expired()
        {
            return Ok(credentials.clone());
        }

        let fresh = self
            .sts
            .assume_role(&self.request)
            .await
            .map_err(|err| CredentialsError::AssumeRole(err.to_string()))?;
        *cached = Some(fresh.clone());
        Ok(fresh)
    }
}
