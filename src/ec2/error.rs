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
//! # EC2 provider errors.

use thiserror::Error;

/// EC2 private-DNS provider error.
#[derive(Debug, Error)]
pub enum Ec2ProviderError {
    /// No DNS name for the instance arrived within the wait window. The
    /// batch may not have resolved the instance, or the upstream call
    /// failed; the lookup can be retried.
    #[error("failed to find dns name for instance {0}")]
    NotFound(String),

    /// The batching channel is full; the caller should back off.
    #[error("describe-instances request channel is saturated")]
    Saturated,

    /// The `DescribeInstances` call itself failed.
    #[error("ec2 describe-instances failed: {0}")]
    Upstream(String),
}
