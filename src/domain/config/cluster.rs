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

use super::auth::{AccessEntry, AuthenticationMode, RoleMapping, UserMapping};
use super::node_group::{FargateArgs, FargateSpec, NodeGroupArgs, NodeGroupSpec};
use super::storage::{StorageClassOptions, StorageClassesArgs};
use super::vpc_cni::VpcCniOptions;
use crate::shared::error::Result;
use crate::shared::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CLUSTER_NAME: &str = "eks-cluster";

/// Address family for pod and service IPs. Fixed at cluster creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    #[default]
    Ipv4,
    Ipv6,
}

const IP_FAMILIES: [(IpFamily, &str); 2] = [(IpFamily::Ipv4, "ipv4"), (IpFamily::Ipv6, "ipv6")];

impl IpFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ipv4 => IP_FAMILIES[0].1,
            Self::Ipv6 => IP_FAMILIES[1].1,
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IpFamily {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        IP_FAMILIES
            .iter()
            .find(|(_, wire)| *wire == s)
            .map(|(family, _)| *family)
            .ok_or_else(|| ValidationError::cluster_option("ipFamily", s, "expected ipv4 or ipv6"))
    }
}

/// Control plane log streams shipped to CloudWatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClusterLogType {
    Api,
    Audit,
    Authenticator,
    ControllerManager,
    Scheduler,
}

const CLUSTER_LOG_TYPES: [(ClusterLogType, &str); 5] = [
    (ClusterLogType::Api, "api"),
    (ClusterLogType::Audit, "audit"),
    (ClusterLogType::Authenticator, "authenticator"),
    (ClusterLogType::ControllerManager, "controllerManager"),
    (ClusterLogType::Scheduler, "scheduler"),
];

impl ClusterLogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => CLUSTER_LOG_TYPES[0].1,
            Self::Audit => CLUSTER_LOG_TYPES[1].1,
            Self::Authenticator => CLUSTER_LOG_TYPES[2].1,
            Self::ControllerManager => CLUSTER_LOG_TYPES[3].1,
            Self::Scheduler => CLUSTER_LOG_TYPES[4].1,
        }
    }
}

impl FromStr for ClusterLogType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CLUSTER_LOG_TYPES
            .iter()
            .find(|(_, wire)| *wire == s)
            .map(|(log_type, _)| *log_type)
            .ok_or_else(|| {
                ValidationError::cluster_option(
                    "enabledClusterLogTypes",
                    s,
                    "expected one of api, audit, authenticator, controllerManager, scheduler",
                )
            })
    }
}

/// Credentials the generated kubeconfig passes to `aws eks get-token`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeconfigOptions {
    pub role_arn: Option<String>,
    pub profile_name: Option<String>,
}

/// Cluster specification as written by the user. Every field is optional
/// until the resolver has looked at it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterArgs {
    pub name: Option<String>,
    pub version: Option<String>,
    pub region: Option<String>,

    pub vpc_id: Option<String>,
    pub subnet_ids: Option<Vec<String>>,
    pub public_subnet_ids: Option<Vec<String>>,
    pub private_subnet_ids: Option<Vec<String>>,

    pub authentication_mode: Option<String>,
    pub role_mappings: Option<Vec<RoleMapping>>,
    pub user_mappings: Option<Vec<UserMapping>>,
    pub access_entries: Option<BTreeMap<String, AccessEntry>>,

    pub skip_default_security_groups: Option<bool>,
    pub cluster_security_group_id: Option<String>,
    pub node_security_group_id: Option<String>,

    pub service_role_arn: Option<String>,
    pub instance_role_arns: Option<Vec<String>>,

    pub skip_default_node_group: Option<bool>,
    pub node_group: Option<NodeGroupArgs>,
    pub fargate: Option<FargateArgs>,

    pub vpc_cni: Option<VpcCniOptions>,
    pub use_default_vpc_cni: Option<bool>,

    pub storage_classes: Option<StorageClassesArgs>,

    pub create_oidc_provider: Option<bool>,
    pub enabled_cluster_log_types: Option<Vec<String>>,
    pub encryption_config_key_arn: Option<String>,
    pub kubernetes_service_ip_address_range: Option<String>,
    pub ip_family: Option<String>,
    pub endpoint_public_access: Option<bool>,
    pub endpoint_private_access: Option<bool>,
    pub public_access_cidrs: Option<Vec<String>>,

    pub provider_credential_opts: Option<KubeconfigOptions>,
    pub tags: Option<BTreeMap<String, String>>,
}

impl ClusterArgs {
    /// Load from a YAML or TOML file, chosen by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let args = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(args)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointAccess {
    pub public_access: bool,
    pub private_access: bool,
    pub public_access_cidrs: Vec<String>,
}

impl Default for EndpointAccess {
    fn default() -> Self {
        Self {
            public_access: true,
            private_access: false,
            public_access_cidrs: Vec::new(),
        }
    }
}

/// Normalized, validated cluster specification. Produced only by
/// [`crate::domain::cluster::ConfigResolver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    pub name: String,
    pub version: Option<String>,
    pub region: Option<String>,

    pub vpc_id: String,
    /// Every subnet the control plane attaches to.
    pub subnet_ids: Vec<String>,
    pub public_subnet_ids: Vec<String>,
    pub private_subnet_ids: Vec<String>,

    pub authentication_mode: AuthenticationMode,
    pub role_mappings: Vec<RoleMapping>,
    pub user_mappings: Vec<UserMapping>,
    pub access_entries: BTreeMap<String, AccessEntry>,

    pub skip_default_security_groups: bool,
    pub cluster_security_group_id: Option<String>,
    pub node_security_group_id: Option<String>,

    pub service_role_arn: Option<String>,
    pub instance_role_arns: Vec<String>,

    pub node_group: Option<NodeGroupSpec>,
    pub fargate: Option<FargateSpec>,
    /// `None` when the cluster keeps the CNI that ships with EKS.
    pub vpc_cni: Option<VpcCniOptions>,
    pub storage_classes: BTreeMap<String, StorageClassOptions>,

    pub create_oidc_provider: bool,
    pub enabled_cluster_log_types: Vec<ClusterLogType>,
    /// KMS key used to envelope-encrypt Kubernetes secrets.
    pub encryption_config_key_arn: Option<String>,
    /// Service CIDR; only meaningful for ipv4 clusters.
    pub kubernetes_service_ip_address_range: Option<String>,
    pub ip_family: IpFamily,
    pub endpoint: EndpointAccess,
    pub kubeconfig: KubeconfigOptions,
    pub tags: BTreeMap<String, String>,
}

impl ClusterSpec {
    /// Subnets worker capacity lands in: private ones when there are any.
    pub fn node_subnet_ids(&self) -> &[String] {
        if self.private_subnet_ids.is_empty() {
            &self.subnet_ids
        } else {
            &self.private_subnet_ids
        }
    }

    /// Tag map with the cluster ownership tag added.
    pub fn owned_tags(&self) -> BTreeMap<String, String> {
        let mut tags = self.tags.clone();
        tags.insert(
            format!("kubernetes.io/cluster/{}", self.name),
            "owned".to_string(),
        );
        tags
    }
}
