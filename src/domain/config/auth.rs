// Copyright 2025 JiangLong.
//
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

//! Cluster authentication settings: the authentication mode plus the two
//! identity binding mechanisms (aws-auth mappings and access entries).

use crate::shared::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How IAM identities are bound to Kubernetes RBAC identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthenticationMode {
    ConfigMap,
    Api,
    ApiAndConfigMap,
}

const AUTHENTICATION_MODES: [(AuthenticationMode, &str); 3] = [
    (AuthenticationMode::ConfigMap, "CONFIG_MAP"),
    (AuthenticationMode::Api, "API"),
    (AuthenticationMode::ApiAndConfigMap, "API_AND_CONFIG_MAP"),
];

impl AuthenticationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigMap => AUTHENTICATION_MODES[0].1,
            Self::Api => AUTHENTICATION_MODES[1].1,
            Self::ApiAndConfigMap => AUTHENTICATION_MODES[2].1,
        }
    }

    /// Whether the aws-auth ConfigMap is consulted in this mode.
    pub fn supports_config_map(&self) -> bool {
        matches!(self, Self::ConfigMap | Self::ApiAndConfigMap)
    }

    /// Whether EKS access entries are consulted in this mode.
    pub fn supports_access_entries(&self) -> bool {
        matches!(self, Self::Api | Self::ApiAndConfigMap)
    }
}

impl Default for AuthenticationMode {
    fn default() -> Self {
        Self::ConfigMap
    }
}

impl fmt::Display for AuthenticationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthenticationMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AUTHENTICATION_MODES
            .iter()
            .find(|(_, wire)| *wire == s)
            .map(|(mode, _)| *mode)
            .ok_or_else(|| ValidationError::UnknownAuthenticationMode {
                value: s.to_string(),
            })
    }
}

/// Legacy aws-auth role mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMapping {
    pub role_arn: String,
    pub username: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Legacy aws-auth user mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMapping {
    pub user_arn: String,
    pub username: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessEntryType {
    #[default]
    Standard,
    FargateLinux,
    Ec2Linux,
    Ec2Windows,
}

impl AccessEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::FargateLinux => "FARGATE_LINUX",
            Self::Ec2Linux => "EC2_LINUX",
            Self::Ec2Windows => "EC2_WINDOWS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessScopeType {
    #[default]
    Cluster,
    Namespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccessScope {
    #[serde(rename = "type", default)]
    pub scope_type: AccessScopeType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicy {
    pub policy_arn: String,
    #[serde(default)]
    pub access_scope: AccessScope,
}

/// An EKS access entry granting a principal cluster access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEntry {
    pub principal_arn: String,
    #[serde(default)]
    pub kubernetes_groups: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "type", default)]
    pub entry_type: AccessEntryType,
    #[serde(default)]
    pub access_policies: BTreeMap<String, AccessPolicy>,
}

/// A (principal, policy, scope) triple recorded for API authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicyAssociation {
    pub principal_arn: String,
    pub policy_arn: String,
    pub access_scope: AccessScope,
}
