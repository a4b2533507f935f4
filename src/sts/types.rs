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
//! # STS types.

/// Result of an `sts:GetCallerIdentity` call.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CallerIdentity {
    /// The 12 digit AWS account number.
    pub account: String,

    /// The Amazon Resource Name of the calling principal.
    pub arn: String,

    /// The unique user or role identifier. For assumed roles this is
    /// `<role id>:<session name>`.
    pub user_id: String,
}

/// Parameters of an `sts:AssumeRole` call.
#[derive(Clone, Debug, Default)]
pub struct AssumeRoleRequest {
    /// ARN of the role to assume.
    pub role_arn: String,

    /// Session name recorded on the assumed-role session. A name is
    /// generated when none is given.
    pub session_name: Option<String>,

    /// External id expected by the role trust policy.
    pub external_id: Option<String>,
}
