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

//! Worker capacity: the default self-managed node group and the Fargate
//! profile. The two branches are independent; either, both or neither may
//! be declared.

use super::control_plane::{ClusterOutputs, ControlPlane};
use super::iam::IamRoles;
use super::resource_name;
use super::security_group::SecurityGroupSet;
use crate::domain::config::{ClusterSpec, FargateSelector, FargateSpec, NodeGroupSpec};
use crate::infrastructure::engine::{Output, ResourceKind, Stack};
use crate::shared::error::{ProvisionError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
struct InstanceProfileOutputs {
    arn: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LaunchTemplateOutputs {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AutoScalingGroupOutputs {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FargateProfileOutputs {
    fargate_profile_name: String,
    arn: String,
    status: String,
}

/// The default node group as provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupData {
    pub auto_scaling_group_name: String,
    pub launch_template_id: String,
    pub instance_profile_arn: String,
    pub node_security_group_id: String,
    pub instance_role_arn: String,
    pub instance_type: String,
    pub desired_capacity: i64,
    pub min_size: i64,
    pub max_size: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FargateProfileData {
    pub name: String,
    pub arn: String,
    pub status: String,
    pub pod_execution_role_arn: String,
    pub selectors: Vec<FargateSelector>,
    pub subnet_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NodeCapacity {
    pub node_group: Option<Output<NodeGroupData>>,
    pub fargate_profile: Option<Output<FargateProfileData>>,
}

/// Resources worker capacity waits for before it is created.
pub struct NodeDependencies<'a> {
    pub roles: &'a IamRoles,
    pub groups: &'a SecurityGroupSet,
    pub plane: &'a ControlPlane,
    pub ready: Vec<Output<()>>,
}

pub struct NodeGroupPlanner;

impl NodeGroupPlanner {
    pub fn plan(stack: &mut Stack, spec: &ClusterSpec, deps: NodeDependencies<'_>) -> Result<NodeCapacity> {
        let node_group = match &spec.node_group {
            Some(node_group) => Some(Self::declare_node_group(stack, spec, node_group, &deps)?),
            None => {
                debug!(cluster = %spec.name, "skipping default node group");
                None
            }
        };

        let fargate_profile = match &spec.fargate {
            Some(fargate) => Some(Self::declare_fargate_profile(stack, spec, fargate, &deps)?),
            None => None,
        };

        Ok(NodeCapacity {
            node_group,
            fargate_profile,
        })
    }

    fn declare_node_group(
        stack: &mut Stack,
        spec: &ClusterSpec,
        node_group: &NodeGroupSpec,
        deps: &NodeDependencies<'_>,
    ) -> Result<Output<NodeGroupData>> {
        let node_sg = deps.groups.node_security_group_id.clone().ok_or_else(|| {
            ProvisionError::config_error("the default node group requires a node security group")
        })?;
        let instance_role = deps.roles.instance_role_arns.first().cloned().ok_or_else(|| {
            ProvisionError::config_error("the default node group requires an instance role")
        })?;

        let profile_name = resource_name(spec, "instanceProfile");
        let profile: Output<InstanceProfileOutputs> = stack.declare(
            ResourceKind::InstanceProfile,
            profile_name.clone(),
            instance_role.map(move |arn| {
                json!({
                    "name": profile_name,
                    "role": role_name_from_arn(&arn),
                })
            }),
            &[deps.roles.node_roles_ready.clone()],
        )?;

        let template_name = resource_name(spec, "nodeLaunchTemplate");
        let template_inputs = {
            let shape = node_group.clone();
            let stack_name = spec.name.clone();
            let tags = spec.owned_tags();
            let template_name = template_name.clone();
            deps.plane
                .cluster
                .join(&node_sg)
                .join(&profile)
                .map(move |((cluster, security_group), profile)| {
                    let user_data = bootstrap_user_data(&cluster, &shape, &stack_name);
                    let mut inputs = json!({
                        "name": template_name,
                        "imageId": shape.ami_id.clone().unwrap_or_else(|| recommended_ami(&cluster.version)),
                        "instanceType": shape.instance_type,
                        "iamInstanceProfile": { "arn": profile.arn },
                        "networkInterfaces": [{
                            "associatePublicIpAddress": shape.associate_public_ip_address.to_string(),
                            "securityGroups": [security_group],
                        }],
                        "userData": STANDARD.encode(user_data),
                        "tagSpecifications": [{ "resourceType": "instance", "tags": tags }],
                    });
                    if let Some(key_name) = &shape.key_name {
                        inputs["keyName"] = json!(key_name);
                    }
                    if let Some(size) = shape.node_root_volume_size {
                        inputs["blockDeviceMappings"] = json!([{
                            "deviceName": "/dev/xvda",
                            "ebs": { "volumeSize": size, "volumeType": "gp3", "deleteOnTermination": "true" },
                        }]);
                    }
                    inputs
                })
        };
        let template: Output<LaunchTemplateOutputs> = stack.declare(
            ResourceKind::LaunchTemplate,
            template_name,
            template_inputs,
            &[],
        )?;

        let group_name = resource_name(spec, "nodeGroup");
        let subnets = spec.node_subnet_ids().to_vec();
        let mut tags = vec![json!({
            "key": "Name",
            "value": format!("{}-worker", spec.name),
            "propagateAtLaunch": true,
        })];
        for (key, value) in spec.owned_tags() {
            tags.push(json!({ "key": key, "value": value, "propagateAtLaunch": true }));
        }
        let sizing = node_group.clone();
        let asg_inputs = {
            let group_name = group_name.clone();
            template.map(move |template| {
                json!({
                    "name": group_name,
                    "minSize": sizing.min_size,
                    "maxSize": sizing.max_size,
                    "desiredCapacity": sizing.desired_capacity,
                    "vpcZoneIdentifiers": subnets,
                    "launchTemplate": { "id": template.id, "version": "$Latest" },
                    "tags": tags,
                })
            })
        };
        let group: Output<AutoScalingGroupOutputs> = stack.declare(
            ResourceKind::AutoScalingGroup,
            group_name,
            asg_inputs,
            &deps.ready,
        )?;

        let shape = node_group.clone();
        Ok(group
            .join(&template)
            .join(&profile)
            .join(&node_sg.join(&instance_role))
            .map(move |(((group, template), profile), (security_group, role))| NodeGroupData {
                auto_scaling_group_name: group.name,
                launch_template_id: template.id,
                instance_profile_arn: profile.arn,
                node_security_group_id: security_group,
                instance_role_arn: role,
                instance_type: shape.instance_type,
                desired_capacity: shape.desired_capacity,
                min_size: shape.min_size,
                max_size: shape.max_size,
            }))
    }

    fn declare_fargate_profile(
        stack: &mut Stack,
        spec: &ClusterSpec,
        fargate: &FargateSpec,
        deps: &NodeDependencies<'_>,
    ) -> Result<Output<FargateProfileData>> {
        let role = deps.roles.fargate_role_arn.clone().ok_or_else(|| {
            ProvisionError::config_error("a Fargate profile requires a pod execution role")
        })?;
        let profile_name = resource_name(spec, "fargateProfile");
        let subnets = fargate
            .subnet_ids
            .clone()
            .unwrap_or_else(|| spec.node_subnet_ids().to_vec());
        let selectors = fargate.selectors.clone();
        let tags = spec.tags.clone();

        let inputs = {
            let profile_name = profile_name.clone();
            let subnets = subnets.clone();
            let selectors = selectors.clone();
            deps.plane.cluster.join(&role).map(move |(cluster, role)| {
                json!({
                    "clusterName": cluster.name,
                    "fargateProfileName": profile_name,
                    "podExecutionRoleArn": role,
                    "subnetIds": subnets,
                    "selectors": selectors,
                    "tags": tags,
                })
            })
        };
        let profile: Output<FargateProfileOutputs> =
            stack.declare(ResourceKind::FargateProfile, profile_name, inputs, &deps.ready)?;

        Ok(profile.join(&role).map(move |(profile, role)| FargateProfileData {
            name: profile.fargate_profile_name,
            arn: profile.arn,
            status: profile.status,
            pod_execution_role_arn: role,
            selectors,
            subnet_ids: subnets,
        }))
    }
}

fn role_name_from_arn(arn: &str) -> String {
    arn.rsplit('/').next().unwrap_or(arn).to_string()
}

/// SSM-resolved EKS optimized AMI for the control plane version.
fn recommended_ami(version: &str) -> String {
    format!(
        "resolve:ssm:/aws/service/eks/optimized-ami/{}/amazon-linux-2/recommended/image_id",
        version
    )
}

/// Shell script that joins an instance to the cluster.
pub fn bootstrap_user_data(cluster: &ClusterOutputs, node_group: &NodeGroupSpec, stack_name: &str) -> String {
    let mut kubelet_flags = Vec::new();
    if !node_group.labels.is_empty() {
        let labels: Vec<String> = node_group
            .labels
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        kubelet_flags.push(format!("--node-labels={}", labels.join(",")));
    }
    if let Some(extra) = &node_group.kubelet_extra_args {
        kubelet_flags.push(extra.clone());
    }

    let mut extra_args = node_group
        .bootstrap_extra_args
        .as_ref()
        .map(|args| format!(" {}", args))
        .unwrap_or_default();
    match kubelet_flags.len() {
        0 => {}
        1 => extra_args.push_str(&format!(" --kubelet-extra-args {}", kubelet_flags[0])),
        _ => extra_args.push_str(&format!(" --kubelet-extra-args '{}'", kubelet_flags.join(" "))),
    }

    let mut script = format!(
        "#!/bin/bash\n\n/etc/eks/bootstrap.sh --apiserver-endpoint \"{}\" --b64-cluster-ca \"{}\" \"{}\"{}\n",
        cluster.endpoint, cluster.certificate_authority, cluster.name, extra_args
    );
    if let Some(extra) = node_group.extra_user_data.as_deref().filter(|s| !s.is_empty()) {
        script.push_str(&format!(
            "cat >/opt/user-data <<{name}-user-data\n{extra}\n{name}-user-data\nchmod +x /opt/user-data\n/opt/user-data\n",
            name = stack_name,
            extra = extra
        ));
    }
    script
}
