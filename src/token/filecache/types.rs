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
//! # Credential cache file layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;

/// Key of one cache slot. Every component participates in the key; an empty
/// string is a valid component (no profile, no role).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CacheKey {
    pub cluster_id: String,
    pub profile: String,
    pub role_arn: String,
}

/// A cached credential, possibly absent.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CachedCredential {
    pub credential: Option<Credentials>,
}

impl CachedCredential {
    /// An absent credential counts as expired, as do credentials past their
    /// expiry.
    pub fn is_expired(&self) -> bool {
        self.credential
            .as_ref()
            .is_none_or(Credentials::is_expired)
    }
}

// Levels carry `Option` so that a cluster or profile key present in the
// YAML without children (`CLUSTER:` followed by nothing) still parses.
type RoleMap = BTreeMap<String, CacheEntry>;
type ProfileMap = BTreeMap<String, Option<RoleMap>>;
type ClusterMap = BTreeMap<String, Option<ProfileMap>>;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct CacheEntry {
    pub(crate) credential: Credentials,
}

/// On-disk cache shape: clusters → cluster id → profile → role ARN →
/// cached credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct CacheFile {
    #[serde(default)]
    clusters: ClusterMap,
}

impl CacheFile {
    pub(crate) fn get(&self, key: &CacheKey) -> CachedCredential {
        let credential = self
            .clusters
            .get(&key.cluster_id)
            .and_then(Option::as_ref)
            .and_then(|profiles| profiles.get(&key.profile))
            .and_then(Option::as_ref)
            .and_then(|roles| roles.get(&key.role_arn))
            .map(|entry| entry.credential.clone());
        CachedCredential { credential }
    }

    pub(crate) fn put(&mut self, key: &CacheKey, credential: Credentials) {
        self.clusters
            .entry(key.cluster_id.clone())
            .or_insert_with(|| Some(ProfileMap::new()))
            .get_or_insert_with(ProfileMap::new)
            .entry(key.profile.clone())
            .or_insert_with(|| Some(RoleMap::new()))
            .get_or_insert_with(RoleMap::new)
            .insert(key.role_arn.clone(), CacheEntry { credential });
    }
}
