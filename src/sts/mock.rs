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
//! # STS client - internal mocking tools.

use async_trait::async_trait;
use mockall::mock;
use url::Url;

use crate::credentials::Credentials;
use crate::sts::{AssumeRoleRequest, CallerIdentity, StsApi, StsError};

mock! {
    pub StsApi {}

    #[async_trait]
    impl StsApi for StsApi {
        /// Fetch the identity of the calling principal.
        async fn get_caller_identity(&self) -> Result<CallerIdentity, StsError>;

        /// Obtain temporary credentials for the given role.
        async fn assume_role(&self, request: &AssumeRoleRequest) -> Result<Credentials, StsError>;

        /// Presign a `GetCallerIdentity` request bound to the cluster.
        async fn presign_get_caller_identity(&self, cluster_id: &str) -> Result<Url, StsError>;
    }
}
