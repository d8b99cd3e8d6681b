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

//! Worker capacity settings: the default self-managed node group and the
//! Fargate profile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_INSTANCE_TYPE: &str = "t2.medium";
pub const DEFAULT_CAPACITY: i64 = 2;

/// Raw node group options as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupArgs {
    pub instance_type: Option<String>,
    pub desired_capacity: Option<i64>,
    pub min_size: Option<i64>,
    pub max_size: Option<i64>,
    pub ami_id: Option<String>,
    pub key_name: Option<String>,
    pub node_root_volume_size: Option<i64>,
    pub kubelet_extra_args: Option<String>,
    pub bootstrap_extra_args: Option<String>,
    pub extra_user_data: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub node_associate_public_ip_address: Option<bool>,
}

/// Resolved sizing and machine shape of the default node group.
///
/// Only the resolver constructs this, so `min_size <= desired_capacity <=
/// max_size` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupSpec {
    pub instance_type: String,
    pub desired_capacity: i64,
    pub min_size: i64,
    pub max_size: i64,
    pub ami_id: Option<String>,
    pub key_name: Option<String>,
    pub node_root_volume_size: Option<i64>,
    pub kubelet_extra_args: Option<String>,
    pub bootstrap_extra_args: Option<String>,
    pub extra_user_data: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub associate_public_ip_address: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FargateSelector {
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl FargateSelector {
    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            labels: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FargateProfileArgs {
    pub pod_execution_role_arn: Option<String>,
    pub selectors: Option<Vec<FargateSelector>>,
    pub subnet_ids: Option<Vec<String>>,
}

/// `fargate: true` or a full profile description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FargateArgs {
    Enabled(bool),
    Profile(FargateProfileArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FargateSpec {
    pub pod_execution_role_arn: Option<String>,
    pub selectors: Vec<FargateSelector>,
    pub subnet_ids: Option<Vec<String>>,
}

impl FargateSpec {
    /// Profile covering the `default` and `kube-system` namespaces.
    pub fn default_profile() -> Self {
        Self {
            pod_execution_role_arn: None,
            selectors: vec![
                FargateSelector::namespace("default"),
                FargateSelector::namespace("kube-system"),
            ],
            subnet_ids: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fargate_args_forms() {
        let enabled: FargateArgs = serde_yaml::from_str("true").unwrap();
        assert_eq!(enabled, FargateArgs::Enabled(true));

        let profile: FargateArgs =
            serde_yaml::from_str("selectors:\n  - namespace: apps\n").unwrap();
        match profile {
            FargateArgs::Profile(p) => {
                let selectors = p.selectors.unwrap();
                assert_eq!(selectors[0].namespace, "apps");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
