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
//! # Token provider - internal mocking tools.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;

use crate::credentials::CredentialsProvider;
use crate::sts::StsApi;
use crate::token::error::{GeneratorError, VerifierError};
use crate::token::types::{GetTokenOptions, Identity, Token};
use crate::token::{GeneratorApi, VerifierApi};

mock! {
    pub TokenGenerator {
        pub fn new(forward_session_name: bool, cache: bool) -> Result<Self, GeneratorError>;
    }

    #[async_trait]
    impl GeneratorApi for TokenGenerator {
        /// Get a token for the cluster using the default credential chain.
        async fn get(&self, cluster_id: &str) -> Result<Token, GeneratorError>;

        /// Get a token by assuming the given role first.
        async fn get_with_role(
            &self,
            cluster_id: &str,
            role_arn: &str,
        ) -> Result<Token, GeneratorError>;

        /// Get a token by assuming the role with the supplied credentials.
        async fn get_with_role_for_session(
            &self,
            cluster_id: &str,
            role_arn: &str,
            session: Arc<dyn CredentialsProvider>,
        ) -> Result<Token, GeneratorError>;

        /// Get a token with the full option surface.
        async fn get_with_options(
            &self,
            options: &GetTokenOptions,
        ) -> Result<Token, GeneratorError>;

        /// Get a token through an already-built STS client.
        async fn get_with_sts(
            &self,
            cluster_id: &str,
            sts: Arc<dyn StsApi>,
        ) -> Result<Token, GeneratorError>;

        /// Render the token as a client-go `ExecCredential` JSON envelope.
        fn format_json(&self, token: &Token) -> String;
    }
}

mock! {
    pub TokenVerifier {
        pub fn new(cluster_id: String, partition_id: &str) -> Result<Self, VerifierError>;
    }

    #[async_trait]
    impl VerifierApi for TokenVerifier {
        /// Verify a token and resolve it to the AWS identity that minted it.
        async fn verify(&self, token: &str) -> Result<Identity, VerifierError>;
    }
}
