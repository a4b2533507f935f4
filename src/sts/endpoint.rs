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
//! # STS endpoint resolution.
//!
//! Builds the regional STS endpoint URLs the way the SDK default resolver
//! does, over the static [`partitions`](crate::partitions) tables. The
//! verifier derives its hostname allow-set from these URLs, so resolution
//! must cover every region of a partition including the `aws-global` and
//! `-fips` pseudo-regions.

use std::collections::HashSet;

use tracing::{error, warn};
use url::Url;

use crate::partitions;
use crate::sts::error::StsError;

/// Resolve the STS endpoint for a region.
///
/// Regions absent from the partition tables resolve with the default
/// partition DNS suffix, matching the SDK behavior for regions newer than
/// the compiled tables.
pub fn resolve_endpoint(region: &str) -> Result<Url, StsError> {
    let partition_id = partitions::containing_region(region)
        .map(|partition| partition.id)
        .unwrap_or(partitions::DEFAULT_PARTITION_ID);

    let endpoint = if region == "aws-global" {
        "https://sts.amazonaws.com/".to_string()
    } else if let Some(base) = region.strip_suffix("-fips") {
        match partition_id {
            // govcloud endpoints are FIPS endpoints already
            "aws-us-gov" => format!("https://sts.{base}.amazonaws.com/"),
            _ => format!("https://sts-fips.{base}.amazonaws.com/"),
        }
    } else {
        format!("https://sts.{region}.{}/", dns_suffix(partition_id))
    };

    Ok(Url::parse(&endpoint)?)
}

/// STS hostnames of every region in the partition.
///
/// Resolution failures are logged and skipped so that a single bad table
/// entry does not disable verification for the whole partition.
pub fn hostnames_for_partition(partition_id: &str) -> HashSet<String> {
    let mut hostnames = HashSet::new();

    let Some(regions) = partitions::regions(partition_id) else {
        error!("STS service not found in partition {partition_id}");
        return hostnames;
    };
    for region in regions {
        match resolve_endpoint(region) {
            Ok(endpoint) => {
                if let Some(host) = endpoint.host_str() {
                    hostnames.insert(host.to_string());
                }
            }
            Err(err) => {
                warn!("error resolving sts endpoint for {region} in partition {partition_id}: {err}");
            }
        }
    }

    hostnames
}

fn dns_suffix(partition_id: &str) -> &'static str {
    match partition_id {
        "aws-cn" => "amazonaws.com.cn",
        "aws-iso" => "c2s.ic.gov",
        "aws-iso-b" => "sc2s.sgov.gov",
        _ => "amazonaws.com",
    }
}
