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
//! # ARN canonicalization.
//!
//! STS returns assumed-role session ARNs of the form
//! `arn:<partition>:sts::<account>:assumed-role/<role>/<session>`. Mapping
//! layers key on the underlying IAM role, so such ARNs are rewritten to
//! `arn:<partition>:iam::<account>:role/<role>`. Every other well-formed ARN
//! passes through unchanged.

use thiserror::Error;

/// ARN canonicalization error.
#[derive(Debug, Error)]
pub enum ArnError {
    /// The string does not have the six `:`-separated ARN components.
    #[error("malformed arn {0:?}")]
    Malformed(String),

    /// An `assumed-role` resource without both role and session name.
    #[error("assumed-role arn {0:?} is missing the role or session name")]
    IncompleteAssumedRole(String),
}

/// Rewrite an STS assumed-role session ARN to its underlying IAM role ARN.
///
/// Any other ARN is validated for general shape and returned unchanged.
pub fn canonicalize(arn: &str) -> Result<String, ArnError> {
    let parts: Vec<&str> = arn.splitn(6, ':').collect();
    let [prefix, partition, service, _region, account, resource] = parts.as_slice() else {
        return Err(ArnError::Malformed(arn.to_string()));
    };
    if *prefix != "arn" || partition.is_empty() || service.is_empty() || resource.is_empty() {
        return Err(ArnError::Malformed(arn.to_string()));
    }

    if *service == "sts" {
        let resource_parts: Vec<&str> = resource.split('/').collect();
        if resource_parts[0] == "assumed-role" {
            if resource_parts.len() < 3 {
                return Err(ArnError::IncompleteAssumedRole(arn.to_string()));
            }
            return Ok(format!(
                "arn:{partition}:iam::{account}:role/{role}",
                role = resource_parts[1]
            ));
        }
    }

    Ok(arn.to_string())
}
