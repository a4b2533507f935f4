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
//! # EC2 provider types.

use std::time::Duration;

/// The `DescribeInstances` projection the provider consumes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Ec2Instance {
    pub instance_id: String,

    /// Private DNS name, possibly empty for instances still launching.
    pub private_dns_name: String,
}

/// Tuning knobs of the batching resolver.
#[derive(Clone, Debug)]
pub struct Ec2ProviderConfig {
    /// Capacity of the request channel; enqueueing beyond it fails fast.
    pub max_channel_size: usize,

    /// Upper bound on the ids of one `DescribeInstances` call.
    pub batch_size: usize,

    /// How long the worker keeps collecting after the first id of a batch.
    pub batch_window: Duration,

    /// How long a caller waits for the cache to be populated.
    pub lookup_timeout: Duration,

    /// Interval between cache polls while waiting.
    pub poll_interval: Duration,
}

impl Default for Ec2ProviderConfig {
    fn default() -> Self {
        Self {
            max_channel_size: 200,
            batch_size: 100,
            batch_window: Duration::from_millis(20),
            lookup_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(20),
        }
    }
}
