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

use super::control_plane::ControlPlane;
use super::iam::IamRoles;
use super::{all_ready, kube_manifest, resource_name};
use crate::domain::config::{
    AccessEntry, AccessEntryType, AccessPolicyAssociation, ClusterSpec, RoleMapping, UserMapping,
};
use crate::infrastructure::constants::{
    AWS_AUTH_NAME, FARGATE_NODE_USERNAME, GROUP_BOOTSTRAPPERS, GROUP_NODES, GROUP_NODE_PROXIER,
    KUBE_SYSTEM_NAMESPACE, LABEL_MANAGED_BY, LABEL_MANAGED_BY_VALUE, NODE_USERNAME,
};
use crate::infrastructure::engine::{Output, ResourceKind, Stack};
use crate::shared::error::{ProvisionError, ResolveError, Result};
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Serialize)]
struct MapRoleEntry<'a> {
    rolearn: &'a str,
    username: &'a str,
    groups: &'a [String],
}

#[derive(Debug, Serialize)]
struct MapUserEntry<'a> {
    userarn: &'a str,
    username: &'a str,
    groups: &'a [String],
}

/// Builds the `kube-system/aws-auth` ConfigMap.
pub struct AwsAuthConfigMapBuilder {
    role_mappings: Vec<RoleMapping>,
    user_mappings: Vec<UserMapping>,
    instance_role_arns: Vec<String>,
    fargate_role_arn: Option<String>,
}

impl AwsAuthConfigMapBuilder {
    pub fn new(role_mappings: Vec<RoleMapping>, user_mappings: Vec<UserMapping>) -> Self {
        Self {
            role_mappings,
            user_mappings,
            instance_role_arns: Vec::new(),
            fargate_role_arn: None,
        }
    }

    pub fn with_instance_roles(mut self, arns: Vec<String>) -> Self {
        self.instance_role_arns = arns;
        self
    }

    pub fn with_fargate_role(mut self, arn: Option<String>) -> Self {
        self.fargate_role_arn = arn;
        self
    }

    pub fn build(&self) -> std::result::Result<ConfigMap, ProvisionError> {
        let metadata = ObjectMeta {
            name: Some(AWS_AUTH_NAME.to_string()),
            namespace: Some(KUBE_SYSTEM_NAMESPACE.to_string()),
            labels: Some(self.get_labels()),
            ..Default::default()
        };

        let mut data = BTreeMap::new();
        data.insert("mapRoles".to_string(), self.build_map_roles()?);
        if !self.user_mappings.is_empty() {
            data.insert("mapUsers".to_string(), self.build_map_users()?);
        }

        Ok(ConfigMap {
            metadata,
            data: Some(data),
            ..Default::default()
        })
    }

    fn build_map_roles(&self) -> std::result::Result<String, ProvisionError> {
        let node_groups = vec![GROUP_BOOTSTRAPPERS.to_string(), GROUP_NODES.to_string()];
        let fargate_groups = vec![
            GROUP_BOOTSTRAPPERS.to_string(),
            GROUP_NODES.to_string(),
            GROUP_NODE_PROXIER.to_string(),
        ];

        let mut entries: Vec<MapRoleEntry<'_>> = self
            .instance_role_arns
            .iter()
            .map(|arn| MapRoleEntry {
                rolearn: arn,
                username: NODE_USERNAME,
                groups: &node_groups,
            })
            .collect();
        if let Some(arn) = &self.fargate_role_arn {
            entries.push(MapRoleEntry {
                rolearn: arn,
                username: FARGATE_NODE_USERNAME,
                groups: &fargate_groups,
            });
        }
        entries.extend(self.role_mappings.iter().map(|m| MapRoleEntry {
            rolearn: &m.role_arn,
            username: &m.username,
            groups: &m.groups,
        }));

        Ok(serde_yaml::to_string(&entries)?)
    }

    fn build_map_users(&self) -> std::result::Result<String, ProvisionError> {
        let entries: Vec<MapUserEntry<'_>> = self
            .user_mappings
            .iter()
            .map(|m| MapUserEntry {
                userarn: &m.user_arn,
                username: &m.username,
                groups: &m.groups,
            })
            .collect();
        Ok(serde_yaml::to_string(&entries)?)
    }

    pub fn get_labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert(
            LABEL_MANAGED_BY.to_string(),
            LABEL_MANAGED_BY_VALUE.to_string(),
        );
        labels
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessEntryOutputs {
    principal_arn: String,
    access_entry_arn: String,
    #[serde(rename = "type")]
    entry_type: AccessEntryType,
    #[serde(default)]
    kubernetes_groups: Vec<String>,
    #[serde(default)]
    username: Option<String>,
}

/// One access entry with the policies associated to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEntryRecord {
    pub name: String,
    pub principal_arn: String,
    pub access_entry_arn: String,
    pub entry_type: AccessEntryType,
    pub kubernetes_groups: Vec<String>,
    pub username: Option<String>,
    pub access_policies: Vec<AccessPolicyAssociation>,
}

#[derive(Debug, Clone)]
pub struct AccessManagement {
    /// `namespace/name` of the aws-auth ConfigMap, when one is managed.
    pub aws_auth: Option<Output<String>>,
    pub access_entries: Option<Output<Vec<AccessEntryRecord>>>,
    /// Resolves once every identity binding exists.
    pub ready: Output<()>,
}

pub struct AccessManagementPlanner;

impl AccessManagementPlanner {
    pub fn plan(
        stack: &mut Stack,
        spec: &ClusterSpec,
        roles: &IamRoles,
        plane: &ControlPlane,
    ) -> Result<AccessManagement> {
        let mode = spec.authentication_mode;
        debug!(cluster = %spec.name, mode = %mode, "planning access management");

        let mut ready = Vec::new();

        let aws_auth = if mode.supports_config_map() {
            let config_map = Self::declare_aws_auth(stack, spec, roles, plane)?;
            ready.push(config_map.unit());
            Some(config_map)
        } else {
            None
        };

        let access_entries = if mode.supports_access_entries() {
            let entries = Self::declare_access_entries(stack, spec, roles, plane)?;
            ready.push(entries.unit());
            Some(entries)
        } else {
            None
        };

        Ok(AccessManagement {
            aws_auth,
            access_entries,
            ready: all_ready(ready),
        })
    }

    fn declare_aws_auth(
        stack: &mut Stack,
        spec: &ClusterSpec,
        roles: &IamRoles,
        plane: &ControlPlane,
    ) -> Result<Output<String>> {
        let name = resource_name(spec, "aws-auth");
        let fargate_role = match &roles.fargate_role_arn {
            Some(arn) => arn.map(Some),
            None => Output::known(None),
        };
        let role_mappings = spec.role_mappings.clone();
        let user_mappings = spec.user_mappings.clone();
        let error_name = name.clone();

        let manifest = Output::join_all(roles.instance_role_arns.iter().cloned())
            .join(&fargate_role)
            .then(move |(instance_roles, fargate_role)| async move {
                let config_map = AwsAuthConfigMapBuilder::new(role_mappings, user_mappings)
                    .with_instance_roles(instance_roles)
                    .with_fargate_role(fargate_role)
                    .build()
                    .map_err(|e| ResolveError::provider(error_name.as_str(), e.to_string()))?;
                serde_json::to_value(&config_map)
                    .map_err(|e| ResolveError::provider(error_name.as_str(), e.to_string()))
            });

        let inputs = kube_manifest(&plane.cluster, Value::Null)
            .join(&manifest)
            .map(|(mut inputs, manifest)| {
                inputs["manifest"] = manifest;
                inputs
            });

        let declared: Output<Value> = stack.declare(
            ResourceKind::ConfigMap,
            name,
            inputs,
            &[roles.node_roles_ready.clone()],
        )?;
        Ok(declared.map(|_| format!("{}/{}", KUBE_SYSTEM_NAMESPACE, AWS_AUTH_NAME)))
    }

    fn declare_access_entries(
        stack: &mut Stack,
        spec: &ClusterSpec,
        roles: &IamRoles,
        plane: &ControlPlane,
    ) -> Result<Output<Vec<AccessEntryRecord>>> {
        let mut records = Vec::new();

        for (index, arn) in roles.instance_role_arns.iter().enumerate() {
            let name = resource_name(spec, &format!("nodeAccessEntry{}", index));
            let entry = Self::declare_entry(
                stack,
                &name,
                plane,
                arn,
                AccessEntryType::Ec2Linux,
                &[],
                None,
            )?;
            records.push(entry.map(move |e| Self::record(name, e, Vec::new())));
        }

        if let Some(arn) = &roles.fargate_role_arn {
            let name = resource_name(spec, "fargateAccessEntry");
            let entry = Self::declare_entry(
                stack,
                &name,
                plane,
                arn,
                AccessEntryType::FargateLinux,
                &[],
                None,
            )?;
            records.push(entry.map(move |e| Self::record(name, e, Vec::new())));
        }

        for (key, access) in &spec.access_entries {
            records.push(Self::declare_explicit(stack, spec, plane, key, access)?);
        }

        Ok(Output::join_all(records))
    }

    fn declare_explicit(
        stack: &mut Stack,
        spec: &ClusterSpec,
        plane: &ControlPlane,
        key: &str,
        access: &AccessEntry,
    ) -> Result<Output<AccessEntryRecord>> {
        let name = resource_name(spec, &format!("accessEntry-{}", key));
        let entry = Self::declare_entry(
            stack,
            &name,
            plane,
            &Output::known(access.principal_arn.clone()),
            access.entry_type,
            &access.kubernetes_groups,
            access.username.clone(),
        )?;

        let mut associations = Vec::new();
        for (policy_key, policy) in &access.access_policies {
            let policy_inputs = json!({
                "principalArn": access.principal_arn,
                "policyArn": policy.policy_arn,
                "accessScope": policy.access_scope,
            });
            let inputs = plane.cluster.map(move |c| {
                let mut inputs = policy_inputs;
                inputs["clusterName"] = json!(c.name);
                inputs
            });
            let association: Output<AccessPolicyAssociation> = stack.declare(
                ResourceKind::AccessPolicyAssociation,
                format!("{}-{}", name, policy_key),
                inputs,
                &[entry.unit()],
            )?;
            associations.push(association);
        }

        Ok(entry
            .join(&Output::join_all(associations))
            .map(move |(e, policies)| Self::record(name, e, policies)))
    }

    fn declare_entry(
        stack: &mut Stack,
        name: &str,
        plane: &ControlPlane,
        principal_arn: &Output<String>,
        entry_type: AccessEntryType,
        groups: &[String],
        username: Option<String>,
    ) -> Result<Output<AccessEntryOutputs>> {
        let groups = groups.to_vec();
        let inputs = plane
            .cluster
            .join(principal_arn)
            .map(move |(cluster, principal)| {
                let mut inputs = json!({
                    "clusterName": cluster.name,
                    "principalArn": principal,
                    "type": entry_type.as_str(),
                });
                if !groups.is_empty() {
                    inputs["kubernetesGroups"] = json!(groups);
                }
                if let Some(username) = username {
                    inputs["username"] = json!(username);
                }
                inputs
            });
        stack.declare(ResourceKind::AccessEntry, name, inputs, &[])
    }

    fn record(
        name: String,
        outputs: AccessEntryOutputs,
        access_policies: Vec<AccessPolicyAssociation>,
    ) -> AccessEntryRecord {
        AccessEntryRecord {
            name,
            principal_arn: outputs.principal_arn,
            access_entry_arn: outputs.access_entry_arn,
            entry_type: outputs.entry_type,
            kubernetes_groups: outputs.kubernetes_groups,
            username: outputs.username,
            access_policies,
        }
    }
}
