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

use super::{all_ready, resource_name};
use crate::domain::config::ClusterSpec;
use crate::infrastructure::constants::{HTTPS_PORT, INTERNET_CIDR, KUBELET_PORT_MAX, KUBELET_PORT_MIN};
use crate::infrastructure::engine::{Output, ResourceKind, Stack};
use crate::shared::error::{Result, ValidationError};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
struct GroupOutputs {
    id: String,
}

/// Cluster and node security groups plus the rule linking them.
///
/// When the groups are supplied by the caller they are external references:
/// nothing is declared and `cluster_ingress_rule_id` resolves to `""`.
#[derive(Debug, Clone)]
pub struct SecurityGroupSet {
    pub cluster_security_group_id: Output<String>,
    pub node_security_group_id: Option<Output<String>>,
    pub cluster_ingress_rule_id: Output<String>,
    pub owned: bool,
    /// Resolves once every declared group and rule exists.
    pub ready: Output<()>,
}

/// Direction, protocol and port range of one rule.
struct RuleSpec<'a> {
    suffix: &'a str,
    description: &'a str,
    direction: &'a str,
    protocol: &'a str,
    from_port: i64,
    to_port: i64,
}

enum RuleSource {
    SelfReference,
    Group(Output<String>),
    Cidr(&'static str),
}

pub struct SecurityGroupPlanner;

impl SecurityGroupPlanner {
    pub fn plan(stack: &mut Stack, spec: &ClusterSpec) -> Result<SecurityGroupSet> {
        if spec.skip_default_security_groups {
            debug!(cluster = %spec.name, "using caller-supplied security groups");
            return Self::external(spec);
        }

        let mut ready = Vec::new();

        let cluster_sg = match &spec.cluster_security_group_id {
            Some(id) => Output::known(id.clone()),
            None => {
                let group = Self::declare_group(
                    stack,
                    spec,
                    "eksClusterSecurityGroup",
                    "Managed Kubernetes cluster security group",
                    spec.tags.clone(),
                )?;
                ready.push(Self::declare_rule(
                    stack,
                    spec,
                    &group,
                    RuleSpec {
                        suffix: "eksClusterInternetEgressRule",
                        description: "Allow internet access.",
                        direction: "egress",
                        protocol: "-1",
                        from_port: 0,
                        to_port: 0,
                    },
                    RuleSource::Cidr(INTERNET_CIDR),
                )?);
                ready.push(group.unit());
                group
            }
        };

        // A supplied node group is referenced as-is; the rules are still
        // attached to it.
        let node_sg = match &spec.node_security_group_id {
            Some(id) => Output::known(id.clone()),
            None => {
                let group = Self::declare_group(
                    stack,
                    spec,
                    "nodeSecurityGroup",
                    "Managed Kubernetes node security group",
                    spec.owned_tags(),
                )?;
                ready.push(group.unit());
                group
            }
        };

        let node_rules = [
            (
                RuleSpec {
                    suffix: "eksNodeIngressRule",
                    description: "Allow nodes to communicate with each other",
                    direction: "ingress",
                    protocol: "-1",
                    from_port: 0,
                    to_port: 0,
                },
                RuleSource::SelfReference,
            ),
            (
                RuleSpec {
                    suffix: "eksNodeClusterIngressRule",
                    description: "Allow worker Kubelets and pods to receive communication from the cluster control plane",
                    direction: "ingress",
                    protocol: "tcp",
                    from_port: KUBELET_PORT_MIN,
                    to_port: KUBELET_PORT_MAX,
                },
                RuleSource::Group(cluster_sg.clone()),
            ),
            (
                RuleSpec {
                    suffix: "eksExtApiServerClusterIngressRule",
                    description: "Allow pods running extension API servers on port 443 to receive communication from cluster control plane",
                    direction: "ingress",
                    protocol: "tcp",
                    from_port: HTTPS_PORT,
                    to_port: HTTPS_PORT,
                },
                RuleSource::Group(cluster_sg.clone()),
            ),
            (
                RuleSpec {
                    suffix: "eksNodeInternetEgressRule",
                    description: "Allow internet access.",
                    direction: "egress",
                    protocol: "-1",
                    from_port: 0,
                    to_port: 0,
                },
                RuleSource::Cidr(INTERNET_CIDR),
            ),
        ];
        for (rule, source) in node_rules {
            ready.push(Self::declare_rule(stack, spec, &node_sg, rule, source)?);
        }

        let ingress: Output<GroupOutputs> = stack.declare(
            ResourceKind::SecurityGroupRule,
            resource_name(spec, "eksClusterIngressRule"),
            Self::rule_inputs(
                &cluster_sg,
                RuleSpec {
                    suffix: "eksClusterIngressRule",
                    description: "Allow pods to communicate with the cluster API Server",
                    direction: "ingress",
                    protocol: "tcp",
                    from_port: HTTPS_PORT,
                    to_port: HTTPS_PORT,
                },
                RuleSource::Group(node_sg.clone()),
            ),
            &[],
        )?;
        ready.push(ingress.unit());

        Ok(SecurityGroupSet {
            cluster_security_group_id: cluster_sg,
            node_security_group_id: Some(node_sg),
            cluster_ingress_rule_id: ingress.map(|rule| rule.id),
            owned: true,
            ready: all_ready(ready),
        })
    }

    fn external(spec: &ClusterSpec) -> Result<SecurityGroupSet> {
        let mut missing = Vec::new();
        if spec.cluster_security_group_id.is_none() {
            missing.push("clusterSecurityGroupId".to_string());
        }
        if spec.node_group.is_some() && spec.node_security_group_id.is_none() {
            missing.push("nodeSecurityGroupId".to_string());
        }
        let cluster_sg = match &spec.cluster_security_group_id {
            Some(id) if missing.is_empty() => id.clone(),
            _ => return Err(ValidationError::MissingSecurityGroups { missing }.into()),
        };

        Ok(SecurityGroupSet {
            cluster_security_group_id: Output::known(cluster_sg),
            node_security_group_id: spec.node_security_group_id.clone().map(Output::known),
            cluster_ingress_rule_id: Output::known(String::new()),
            owned: false,
            ready: Output::known(()),
        })
    }

    fn declare_group(
        stack: &mut Stack,
        spec: &ClusterSpec,
        suffix: &str,
        description: &str,
        tags: std::collections::BTreeMap<String, String>,
    ) -> Result<Output<String>> {
        let group: Output<GroupOutputs> = stack.declare(
            ResourceKind::SecurityGroup,
            resource_name(spec, suffix),
            Output::known(json!({
                "vpcId": spec.vpc_id,
                "description": description,
                "revokeRulesOnDelete": true,
                "tags": tags,
            })),
            &[],
        )?;
        Ok(group.map(|g| g.id))
    }

    fn declare_rule(
        stack: &mut Stack,
        spec: &ClusterSpec,
        group: &Output<String>,
        rule: RuleSpec<'_>,
        source: RuleSource,
    ) -> Result<Output<()>> {
        let name = resource_name(spec, rule.suffix);
        let declared: Output<Value> = stack.declare(
            ResourceKind::SecurityGroupRule,
            name,
            Self::rule_inputs(group, rule, source),
            &[],
        )?;
        Ok(declared.unit())
    }

    fn rule_inputs(group: &Output<String>, rule: RuleSpec<'_>, source: RuleSource) -> Output<Value> {
        let base = json!({
            "description": rule.description,
            "type": rule.direction,
            "protocol": rule.protocol,
            "fromPort": rule.from_port,
            "toPort": rule.to_port,
        });
        let with_group = move |mut inputs: Value, group_id: String| {
            inputs["securityGroupId"] = Value::String(group_id);
            inputs
        };

        match source {
            RuleSource::SelfReference => group.map(move |id| {
                let mut inputs = with_group(base, id);
                inputs["self"] = Value::Bool(true);
                inputs
            }),
            RuleSource::Cidr(cidr) => group.map(move |id| {
                let mut inputs = with_group(base, id);
                inputs["cidrBlocks"] = json!([cidr]);
                inputs
            }),
            RuleSource::Group(source) => group.join(&source).map(move |(id, source_id)| {
                let mut inputs = with_group(base, id);
                inputs["sourceSecurityGroupId"] = Value::String(source_id);
                inputs
            }),
        }
    }
}
