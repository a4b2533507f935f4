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
//! # Credential providers.
//!
//! The crate consumes AWS credentials through the narrow
//! [`CredentialsProvider`] capability rather than concrete SDK types. The
//! token generator stacks implementations of it: the ambient chain at the
//! bottom, optionally wrapped by the file cache, optionally replaced by an
//! assume-role provider. [`SdkCredentialsBridge`] adapts the capability back
//! into the SDK credentials trait so SDK clients sign with cache-wrapped
//! credentials.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials as SdkProvideCredentials;
use aws_credential_types::provider::{SharedCredentialsProvider, future};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;
#[cfg(test)]
mod mock;

pub use error::CredentialsError;
#[cfg(test)]
pub use mock::MockCredentialsProvider;

/// A set of AWS credentials together with its provenance and lifetime.
///
/// Field spellings of the serialized form are fixed by the on-disk credential
/// cache format and must not change.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Credentials {
    #[serde(rename = "accesskeyid")]
    pub access_key_id: String,

    #[serde(rename = "secretaccesskey")]
    pub secret_access_key: String,

    #[serde(rename = "sessiontoken")]
    pub session_token: String,

    /// Name of the provider that produced the credentials.
    pub source: String,

    #[serde(rename = "canexpire")]
    pub can_expire: bool,

    /// Expiry of the credentials, absent for non-expiring principals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Whether the credentials are expired at the given instant.
    ///
    /// Credentials that can expire but carry no expiry are treated as
    /// expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.can_expire && self.expires.is_none_or(|expires| now >= expires)
    }

    /// Whether the credentials are expired now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Capability to produce AWS credentials.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Retrieve a usable set of credentials.
    async fn provide_credentials(&self) -> Result<Credentials, CredentialsError>;
}

/// Provider over the ambient AWS credential chain (environment variables,
/// shared config files, instance metadata).
pub struct DefaultChainProvider {
    inner: SharedCredentialsProvider,
    region: Option<String>,
}

impl DefaultChainProvider {
    /// Load the ambient SDK configuration, optionally pinning the region.
    pub async fn load(region: Option<&str>) -> Result<Self, CredentialsError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        let config = loader.load().await;
        let inner = config
            .credentials_provider()
            .ok_or(CredentialsError::NoProviderConfigured)?;
        Ok(Self {
            inner,
            region: config.region().map(|region| region.to_string()),
        })
    }

    /// The region the chain resolved, if any.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

#[async_trait]
impl CredentialsProvider for DefaultChainProvider {
    async fn provide_credentials(&self) -> Result<Credentials, CredentialsError> {
        let credentials = self.inner.provide_credentials().await?;
        Ok(Credentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().unwrap_or_default().to_string(),
            source: "DefaultChainProvider".to_string(),
            can_expire: credentials.expiry().is_some(),
            expires: credentials.expiry().map(DateTime::<Utc>::from),
        })
    }
}

/// Provider returning a fixed set of credentials.
pub struct StaticCredentialsProvider {
    credentials: Credentials,
}

impl StaticCredentialsProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentialsProvider {
    async fn provide_credentials(&self) -> Result<Credentials, CredentialsError> {
        Ok(self.credentials.clone())
    }
}

/// Adapter implementing the SDK credentials trait over a
/// [`CredentialsProvider`], so SDK clients can consume stacked providers.
#[derive(Clone)]
pub struct SdkCredentialsBridge {
    inner: Arc<dyn CredentialsProvider>,
}

impl SdkCredentialsBridge {
    pub fn new(inner: Arc<dyn CredentialsProvider>) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for SdkCredentialsBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkCredentialsBridge").finish_non_exhaustive()
    }
}

impl SdkProvideCredentials for SdkCredentialsBridge {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        future::ProvideCredentials::new(async move {
            let credentials = self.inner.provide_credentials().await.map_err(
                aws_credential_types::provider::error::CredentialsError::provider_error,
            )?;
            let session_token =
                (!credentials.session_token.is_empty()).then_some(credentials.session_token);
            Ok(aws_credential_types::Credentials::new(
                credentials.access_key_id,
                credentials.secret_access_key,
                session_token,
                credentials.expires.map(SystemTime::from),
                "SdkCredentialsBridge",
            ))
        })
    }
}
