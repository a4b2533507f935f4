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

//! # AWS IAM Authenticator core
//!
//! Bridges AWS IAM to Kubernetes cluster authentication. A client holding
//! AWS credentials mints a short-lived bearer token; the server-side
//! verifier validates the token and resolves it to the AWS principal that
//! minted it.
//!
//! The trick making this work without shared secrets: the token *is* a
//! presigned HTTPS request to `sts:GetCallerIdentity`, bound to one cluster
//! by an `x-k8s-aws-id` header covered by the SigV4 signature. Anyone can
//! decode the token; only STS can judge the signature. The verifier checks
//! everything that can be checked locally — wire format, hostname
//! allow-list over the partition's regions, query whitelist, the 15 minute
//! validity window — and then replays the request against STS, treating the
//! answer as the proof of identity.
//!
//! The crate provides the three subsystems the CLI and the verifying
//! webhook server are built from:
//!
//! - [`token`] — the token [generator](token::GeneratorApi) with its
//!   file-locked on-disk [credential cache](token::filecache), and the
//!   token [verifier](token::VerifierApi);
//!
//! - [`ec2`] — a coalescing, batching resolver of EC2 instance ids to
//!   private DNS names, keeping `DescribeInstances` calls within API
//!   quotas during authentication storms;
//!
//! - the leaves both stand on: [`partitions`] (static partition/region
//!   tables), [`arn`] (assumed-role ARN canonicalization),
//!   [`credentials`] (the credential provider capability and its SDK
//!   adapters) and [`sts`] (endpoint resolution, SigV4 presigning, the
//!   narrow STS client surface).
//!
//! CLI argument handling, the webhook HTTP server, and Kubernetes
//! request/response shapes live with the respective binaries, not here.

pub mod arn;
pub mod credentials;
pub mod ec2;
pub mod error;
pub mod partitions;
pub mod sts;
pub mod token;
