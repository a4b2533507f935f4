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
//! # Cloud partitions.
//!
//! Static registry of the AWS partitions and their region sets. The token
//! verifier enumerates these regions to precompute the STS hostname
//! allow-set, so the tables are fixed at build time rather than fetched from
//! the SDK endpoint metadata.

/// A disjoint region grouping with its own endpoint suffix.
#[derive(Debug)]
pub struct Partition {
    /// Partition identifier (`aws`, `aws-cn`, ...).
    pub id: &'static str,

    /// Regions of the partition, including `-fips` pseudo-regions where the
    /// partition publishes dedicated FIPS endpoints.
    pub regions: &'static [&'static str],
}

/// The partition assumed when none is configured.
pub const DEFAULT_PARTITION_ID: &str = "aws";

static PARTITIONS: &[Partition] = &[
    Partition {
        id: "aws",
        regions: &[
            "aws-global",
            "af-south-1",
            "ap-east-1",
            "ap-northeast-1",
            "ap-northeast-2",
            "ap-south-1",
            "ap-southeast-1",
            "ap-southeast-2",
            "ca-central-1",
            "eu-central-1",
            "eu-north-1",
            "eu-south-1",
            "eu-west-1",
            "eu-west-2",
            "eu-west-3",
            "me-south-1",
            "sa-east-1",
            "us-east-1",
            "us-east-2",
            "us-west-1",
            "us-west-2",
            "us-east-1-fips",
            "us-east-2-fips",
            "us-west-1-fips",
            "us-west-2-fips",
        ],
    },
    Partition {
        id: "aws-cn",
        regions: &["cn-north-1", "cn-northwest-1"],
    },
    Partition {
        id: "aws-us-gov",
        regions: &[
            "us-gov-east-1",
            "us-gov-west-1",
            "us-gov-east-1-fips",
            "us-gov-west-1-fips",
        ],
    },
    Partition {
        id: "aws-iso",
        regions: &["us-iso-east-1"],
    },
    Partition {
        id: "aws-iso-b",
        regions: &["us-isob-east-1"],
    },
];

/// All known partition identifiers.
pub fn names() -> Vec<&'static str> {
    PARTITIONS.iter().map(|partition| partition.id).collect()
}

/// Look up a partition by its identifier.
pub fn get(id: &str) -> Option<&'static Partition> {
    PARTITIONS.iter().find(|partition| partition.id == id)
}

/// Regions of the partition, or `None` for an unknown partition.
pub fn regions(id: &str) -> Option<&'static [&'static str]> {
    get(id).map(|partition| partition.regions)
}

/// Whether the identifier names a known partition.
pub fn is_valid(id: &str) -> bool {
    get(id).is_some()
}

/// The partition containing the given region, if any.
pub fn containing_region(region: &str) -> Option<&'static Partition> {
    PARTITIONS
        .iter()
        .find(|partition| partition.regions.iter().any(|known| *known == region))
}
