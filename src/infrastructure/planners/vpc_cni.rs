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

//! VPC CNI configuration
//!
//! Translates [`VpcCniOptions`] into the aws-node container environment and
//! declares the `vpc-cni` addon. Options the addon cannot carry (images and
//! the privileged security context) become a DaemonSet patch applied after
//! the addon.

use super::control_plane::ControlPlane;
use super::{all_ready, kube_manifest, resource_name};
use crate::domain::config::{ClusterSpec, VpcCniOptions};
use crate::infrastructure::constants::{
    AWS_NODE_CONTAINER, AWS_NODE_DAEMONSET, CNI_INIT_CONTAINER, KUBE_SYSTEM_NAMESPACE,
    NODE_AGENT_CONTAINER, VPC_CNI_ADDON_NAME,
};
use crate::infrastructure::engine::{Output, ResourceKind, Stack};
use crate::shared::error::Result;
use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec};
use k8s_openapi::api::core::v1::{Container, EnvVar, PodSpec, PodTemplateSpec, SecurityContext};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub struct CniEnvironmentBuilder<'a> {
    options: &'a VpcCniOptions,
}

impl<'a> CniEnvironmentBuilder<'a> {
    pub fn new(options: &'a VpcCniOptions) -> Self {
        Self { options }
    }

    /// Environment for the aws-node container. Unset options are omitted.
    pub fn build(&self) -> Vec<EnvVar> {
        let o = self.options;
        let mut env_vars = Vec::new();

        push_bool(&mut env_vars, "AWS_VPC_CNI_NODE_PORT_SUPPORT", o.node_port_support);
        push_bool(&mut env_vars, "AWS_VPC_K8S_CNI_CUSTOM_NETWORK_CFG", o.custom_network());
        push_bool(&mut env_vars, "AWS_VPC_K8S_CNI_EXTERNALSNAT", o.external_snat());
        push_int(&mut env_vars, "WARM_ENI_TARGET", o.warm_eni_target);
        push_int(&mut env_vars, "WARM_IP_TARGET", o.warm_ip_target);
        push_int(&mut env_vars, "WARM_PREFIX_TARGET", o.warm_prefix_target);
        push_bool(&mut env_vars, "ENABLE_PREFIX_DELEGATION", o.enable_prefix_delegation);
        push_bool(&mut env_vars, "ENABLE_IPV6", o.enable_ipv6);
        push_str(&mut env_vars, "AWS_VPC_K8S_CNI_LOGLEVEL", &o.log_level);
        push_str(&mut env_vars, "AWS_VPC_K8S_CNI_LOG_FILE", &o.log_file);
        push_str(&mut env_vars, "AWS_VPC_K8S_CNI_VETHPREFIX", &o.veth_prefix);
        push_int(&mut env_vars, "AWS_VPC_ENI_MTU", o.eni_mtu);
        push_str(&mut env_vars, "ENI_CONFIG_LABEL_DEF", &o.eni_config_label_def);
        push_str(&mut env_vars, "AWS_VPC_K8S_PLUGIN_LOG_LEVEL", &o.plugin_log_level);
        push_str(&mut env_vars, "AWS_VPC_K8S_PLUGIN_LOG_FILE", &o.plugin_log_file);
        push_bool(&mut env_vars, "ENABLE_POD_ENI", o.enable_pod_eni);
        push_bool(&mut env_vars, "AWS_VPC_K8S_CNI_CONFIGURE_RPFILTER", o.cni_configure_rpfilter);

        env_vars
    }

    /// Environment for the aws-vpc-cni-init container.
    pub fn build_init(&self) -> Vec<EnvVar> {
        let mut env_vars = Vec::new();
        push_bool(
            &mut env_vars,
            "DISABLE_TCP_EARLY_DEMUX",
            self.options.disable_tcp_early_demux,
        );
        env_vars
    }
}

fn push_value(env_vars: &mut Vec<EnvVar>, name: &str, value: Option<String>) {
    if let Some(value) = value {
        env_vars.push(EnvVar {
            name: name.to_string(),
            value: Some(value),
            ..Default::default()
        });
    }
}

fn push_bool(env_vars: &mut Vec<EnvVar>, name: &str, value: Option<bool>) {
    push_value(env_vars, name, value.map(|v| v.to_string()));
}

fn push_int(env_vars: &mut Vec<EnvVar>, name: &str, value: Option<i64>) {
    push_value(env_vars, name, value.map(|v| v.to_string()));
}

fn push_str(env_vars: &mut Vec<EnvVar>, name: &str, value: &Option<String>) {
    push_value(env_vars, name, value.clone());
}

/// `NAME -> VALUE` view of an environment list.
pub fn env_map(env_vars: &[EnvVar]) -> BTreeMap<String, String> {
    env_vars
        .iter()
        .filter_map(|e| e.value.clone().map(|v| (e.name.clone(), v)))
        .collect()
}

/// The aws-node patch for options the addon does not expose.
pub fn build_daemonset_patch(options: &VpcCniOptions) -> DaemonSet {
    let mut containers = Vec::new();
    if options.image.is_some() || options.security_context_privileged == Some(true) {
        containers.push(Container {
            name: AWS_NODE_CONTAINER.to_string(),
            image: options.image.clone(),
            security_context: options.security_context_privileged.map(|privileged| {
                SecurityContext {
                    privileged: Some(privileged),
                    ..Default::default()
                }
            }),
            ..Default::default()
        });
    }
    if let Some(image) = &options.node_agent_image {
        containers.push(Container {
            name: NODE_AGENT_CONTAINER.to_string(),
            image: Some(image.clone()),
            ..Default::default()
        });
    }

    let init_containers = options.init_image.as_ref().map(|image| {
        vec![Container {
            name: CNI_INIT_CONTAINER.to_string(),
            image: Some(image.clone()),
            ..Default::default()
        }]
    });

    let mut selector = BTreeMap::new();
    selector.insert("k8s-app".to_string(), AWS_NODE_DAEMONSET.to_string());

    DaemonSet {
        metadata: ObjectMeta {
            name: Some(AWS_NODE_DAEMONSET.to_string()),
            namespace: Some(KUBE_SYSTEM_NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: Some(DaemonSetSpec {
            selector: LabelSelector {
                match_labels: Some(selector),
                ..Default::default()
            },
            template: PodTemplateSpec {
                spec: Some(PodSpec {
                    containers,
                    init_containers,
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddonOutputs {
    arn: String,
    addon_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcCniData {
    pub addon_name: String,
    pub addon_version: String,
    pub arn: String,
    pub env: BTreeMap<String, String>,
    pub init_env: BTreeMap<String, String>,
    pub daemonset_patched: bool,
}

#[derive(Debug, Clone)]
pub struct VpcCni {
    pub addon: Output<VpcCniData>,
    /// Resolves once the addon and any patch are applied.
    pub ready: Output<()>,
}

pub struct VpcCniConfigurator;

impl VpcCniConfigurator {
    /// Returns `None` when the cluster keeps the CNI that ships with EKS.
    pub fn plan(
        stack: &mut Stack,
        spec: &ClusterSpec,
        plane: &ControlPlane,
    ) -> Result<Option<VpcCni>> {
        let options = match &spec.vpc_cni {
            Some(options) => options,
            None => return Ok(None),
        };

        let builder = CniEnvironmentBuilder::new(options);
        let env = env_map(&builder.build());
        let init_env = env_map(&builder.build_init());

        let mut configuration = json!({ "env": env, "init": { "env": init_env } });
        if let Some(enabled) = options.enable_network_policy {
            configuration["enableNetworkPolicy"] = json!(enabled.to_string());
        }
        let configuration = configuration.to_string();
        let addon_version = options.addon_version.clone();

        let inputs = plane.cluster.map(move |cluster| {
            let mut inputs = json!({
                "clusterName": cluster.name,
                "addonName": VPC_CNI_ADDON_NAME,
                "resolveConflictsOnCreate": "OVERWRITE",
                "resolveConflictsOnUpdate": "PRESERVE",
                "preserve": true,
                "configurationValues": configuration,
            });
            if let Some(version) = addon_version {
                inputs["addonVersion"] = json!(version);
            }
            inputs
        });
        let addon: Output<AddonOutputs> = stack.declare(
            ResourceKind::VpcCniAddon,
            resource_name(spec, "vpc-cni"),
            inputs,
            &[],
        )?;

        let mut ready = vec![addon.unit()];
        let patched = options.needs_daemonset_patch();
        if patched {
            let manifest = serde_json::to_value(build_daemonset_patch(options))?;
            let patch: Output<Value> = stack.declare(
                ResourceKind::DaemonSetPatch,
                resource_name(spec, "aws-node-patch"),
                kube_manifest(&plane.cluster, manifest).map(|mut inputs| {
                    inputs["force"] = Value::Bool(true);
                    inputs
                }),
                &[addon.unit()],
            )?;
            ready.push(patch.unit());
        }

        let data = addon.map(move |outputs| VpcCniData {
            addon_name: VPC_CNI_ADDON_NAME.to_string(),
            addon_version: outputs.addon_version,
            arn: outputs.arn,
            env,
            init_env,
            daemonset_patched: patched,
        });

        Ok(Some(VpcCni {
            addon: data,
            ready: all_ready(ready),
        }))
    }
}
