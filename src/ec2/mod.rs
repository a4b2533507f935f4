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
//! # EC2 private-DNS provider.
//!
//! During authentication storms the server resolves many instance ids to
//! private DNS names at once; issuing one `DescribeInstances` per lookup
//! burns through the API quota. This provider coalesces concurrent lookups
//! into periodic batched calls: a bounded channel feeds a single worker
//! that drains up to a batch worth of ids (or whatever arrived within the
//! batch window), deduplicates them, and fans the results into an
//! in-memory cache. An in-flight set guarantees at most one concurrent
//! upstream request per instance id; every batched id leaves the set when
//! the call completes, resolved or not, so misses time out at the caller
//! and can be retried.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_smithy_types::error::display::DisplayErrorContext;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error};

pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

pub use error::Ec2ProviderError;
#[cfg(test)]
pub use mock::MockDescribeInstancesApi;
pub use types::{Ec2Instance, Ec2ProviderConfig};

/// The `DescribeInstances` capability the provider batches over.
#[async_trait]
pub trait DescribeInstancesApi: Send + Sync {
    /// Describe the given instances, returning one entry per found
    /// instance.
    async fn describe_instances(
        &self,
        instance_ids: &[String],
    ) -> Result<Vec<Ec2Instance>, Ec2ProviderError>;
}

/// `DescribeInstances` over the AWS SDK.
pub struct Ec2Client {
    client: aws_sdk_ec2::Client,
}

impl Ec2Client {
    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DescribeInstancesApi for Ec2Client {
    #[tracing::instrument(level = "debug", skip(self), fields(count = instance_ids.len()))]
    async fn describe_instances(
        &self,
        instance_ids: &[String],
    ) -> Result<Vec<Ec2Instance>, Ec2ProviderError> {
        let output = self
            .client
            .describe_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .send()
            .await
            .map_err(|err| Ec2ProviderError::Upstream(DisplayErrorContext(&err).to_string()))?;

        let mut instances = Vec::new();
        for reservation in output.reservations() {
            for instance in reservation.instances() {
                instances.push(Ec2Instance {
                    instance_id: instance.instance_id().unwrap_or_default().to_string(),
                    private_dns_name: instance.private_dns_name().unwrap_or_default().to_string(),
                });
            }
        }
        Ok(instances)
    }
}

/// Coalescing, cached resolver of instance ids to private DNS names.
pub struct Ec2PrivateDnsProvider {
    private_dns_cache: Arc<RwLock<HashMap<String, String>>>,
    requests_in_flight: Arc<RwLock<HashSet<String>>>,
    sender: mpsc::Sender<String>,
    lookup_timeout: Duration,
    poll_interval: Duration,
}

impl Ec2PrivateDnsProvider {
    /// Start the provider with default tuning. Spawns the batch worker on
    /// the current runtime; the worker exits when the provider is dropped.
    pub fn new(api: Arc<dyn DescribeInstancesApi>) -> Self {
        Self::with_config(api, Ec2ProviderConfig::default())
    }

    pub fn with_config(api: Arc<dyn DescribeInstancesApi>, config: Ec2ProviderConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.max_channel_size);
        let private_dns_cache = Arc::new(RwLock::new(HashMap::new()));
        let requests_in_flight = Arc::new(RwLock::new(HashSet::new()));

        tokio::spawn(batch_worker(
            receiver,
            api,
            private_dns_cache.clone(),
            requests_in_flight.clone(),
            config.batch_size,
            config.batch_window,
        ));

        Self {
            private_dns_cache,
            requests_in_flight,
            sender,
            lookup_timeout: config.lookup_timeout,
            poll_interval: config.poll_interval,
        }
    }

    /// Resolve the private DNS name of an instance, batching the upstream
    /// call with concurrent lookups.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_private_dns_name(
        &self,
        instance_id: &str,
    ) -> Result<String, Ec2ProviderError> {
        if let Some(private_dns_name) = self.lookup_cache(instance_id).await {
            return Ok(private_dns_name);
        }

        // reserve the in-flight slot before enqueueing; a false insert
        // means another caller already owns the upstream request
        let newly_in_flight = self
            .requests_in_flight
            .write()
            .await
            .insert(instance_id.to_string());
        if newly_in_flight && self.sender.try_send(instance_id.to_string()).is_err() {
            // release the reservation so a later caller can retry
            self.requests_in_flight.write().await.remove(instance_id);
            return Err(Ec2ProviderError::Saturated);
        }

        let deadline = tokio::time::Instant::now() + self.lookup_timeout;
        loop {
            tokio::time::sleep(self.poll_interval).await;
            if let Some(private_dns_name) = self.lookup_cache(instance_id).await {
                return Ok(private_dns_name);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Ec2ProviderError::NotFound(instance_id.to_string()));
            }
        }
    }

    async fn lookup_cache(&self, instance_id: &str) -> Option<String> {
        self.private_dns_cache.read().await.get(instance_id).cloned()
    }
}

async fn batch_worker(
    mut receiver: mpsc::Receiver<String>,
    api: Arc<dyn DescribeInstancesApi>,
    private_dns_cache: Arc<RwLock<HashMap<String, String>>>,
    requests_in_flight: Arc<RwLock<HashSet<String>>>,
    batch_size: usize,
    batch_window: Duration,
) {
    while let Some(first) = receiver.recv().await {
        let mut batch = vec![first];

        let window = tokio::time::sleep(batch_window);
        tokio::pin!(window);
        while batch.len() < batch_size {
            tokio::select! {
                maybe_id = receiver.recv() => match maybe_id {
                    Some(instance_id) => batch.push(instance_id),
                    None => break,
                },
                () = &mut window => break,
            }
        }

        batch.sort_unstable();
        batch.dedup();
        debug!("describing batch of {} instances", batch.len());

        match api.describe_instances(&batch).await {
            Ok(instances) => {
                let mut cache = private_dns_cache.write().await;
                for instance in instances {
                    if !instance.private_dns_name.is_empty() {
                        cache.insert(instance.instance_id, instance.private_dns_name);
                    }
                }
            }
            Err(err) => {
                error!("describe-instances batch of {} failed: {err}", batch.len());
            }
        }

        // cache writes land first; only then do the ids leave the
        // in-flight set, resolved or not, so waiters see either a hit or
        // a retryable miss
        let mut in_flight = requests_in_flight.write().await;
        for instance_id in &batch {
            in_flight.remove(instance_id);
        }
    }
}
