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

use crate::domain::config::AuthenticationMode;
use crate::infrastructure::kubernetes::KubeconfigDocument;
use crate::infrastructure::planners::control_plane::ClusterOutputs;
use crate::infrastructure::planners::{
    AccessEntryRecord, FargateProfileData, NodeGroupData, OidcProviderData, StorageClassData,
    VpcCniData,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Security group ids of a provisioned cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupIds {
    pub cluster_security_group_id: String,
    pub node_security_group_id: Option<String>,
    /// Empty when the groups were supplied by the caller.
    pub cluster_ingress_rule_id: String,
}

/// Everything a caller needs to know about a provisioned cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreData {
    pub cluster: ClusterOutputs,
    pub endpoint: String,
    pub authentication_mode: AuthenticationMode,
    pub security_groups: SecurityGroupIds,
    pub service_role_arn: String,
    pub instance_role_arns: Vec<String>,
    pub fargate_role_arn: Option<String>,
    pub default_node_group: Option<NodeGroupData>,
    pub fargate_profile: Option<FargateProfileData>,
    pub access_entries: Option<Vec<AccessEntryRecord>>,
    /// `namespace/name` of the aws-auth ConfigMap.
    pub aws_auth: Option<String>,
    pub storage_classes: BTreeMap<String, StorageClassData>,
    pub vpc_cni: Option<VpcCniData>,
    pub oidc_provider: Option<OidcProviderData>,
    pub subnet_ids: Vec<String>,
    pub public_subnet_ids: Vec<String>,
    pub private_subnet_ids: Vec<String>,
    pub tags: BTreeMap<String, String>,
    pub kubeconfig: KubeconfigDocument,
    pub kubeconfig_json: String,
}

impl CoreData {
    pub fn default_storage_class(&self) -> Option<&StorageClassData> {
        self.storage_classes.values().find(|class| class.default)
    }
}
