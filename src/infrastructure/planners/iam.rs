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
use crate::infrastructure::constants::{
    AWS_MANAGED_POLICY_PREFIX, EC2_SERVICE_PRINCIPAL, ECR_READ_ONLY_POLICY, EKS_CLUSTER_POLICY,
    EKS_CNI_POLICY, EKS_FARGATE_POD_EXECUTION_POLICY, EKS_SERVICE_PRINCIPAL,
    EKS_WORKER_NODE_POLICY, FARGATE_SERVICE_PRINCIPAL,
};
use crate::infrastructure::engine::{Output, ResourceKind, Stack};
use crate::shared::error::Result;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize)]
struct RoleOutputs {
    arn: String,
}

/// IAM roles the rest of the cluster refers to, by ARN.
#[derive(Debug, Clone)]
pub struct IamRoles {
    pub service_role_arn: Output<String>,
    pub instance_role_arns: Vec<Output<String>>,
    pub fargate_role_arn: Option<Output<String>>,
    /// Resolves once the control-plane role and its attachments exist.
    pub service_role_ready: Output<()>,
    /// Resolves once the node-side roles and their attachments exist.
    pub node_roles_ready: Output<()>,
}

pub struct IamRolePlanner;

impl IamRolePlanner {
    pub fn plan(stack: &mut Stack, spec: &ClusterSpec) -> Result<IamRoles> {
        let (service_role_arn, service_role_ready) = match &spec.service_role_arn {
            Some(arn) => (Output::known(arn.clone()), Output::known(())),
            None => Self::declare_role(
                stack,
                spec,
                "eksRole",
                EKS_SERVICE_PRINCIPAL,
                &[EKS_CLUSTER_POLICY],
            )?,
        };

        let mut node_ready = Vec::new();
        let instance_role_arns = if spec.instance_role_arns.is_empty() {
            let (arn, ready) = Self::declare_role(
                stack,
                spec,
                "instanceRole",
                EC2_SERVICE_PRINCIPAL,
                &[EKS_WORKER_NODE_POLICY, EKS_CNI_POLICY, ECR_READ_ONLY_POLICY],
            )?;
            node_ready.push(ready);
            vec![arn]
        } else {
            spec.instance_role_arns
                .iter()
                .cloned()
                .map(Output::known)
                .collect()
        };

        let fargate_role_arn = match &spec.fargate {
            None => None,
            Some(fargate) => match &fargate.pod_execution_role_arn {
                Some(arn) => Some(Output::known(arn.clone())),
                None => {
                    let (arn, ready) = Self::declare_role(
                        stack,
                        spec,
                        "podExecutionRole",
                        FARGATE_SERVICE_PRINCIPAL,
                        &[EKS_FARGATE_POD_EXECUTION_POLICY],
                    )?;
                    node_ready.push(ready);
                    Some(arn)
                }
            },
        };

        Ok(IamRoles {
            service_role_arn,
            instance_role_arns,
            fargate_role_arn,
            service_role_ready,
            node_roles_ready: all_ready(node_ready),
        })
    }

    fn declare_role(
        stack: &mut Stack,
        spec: &ClusterSpec,
        suffix: &str,
        service: &str,
        policies: &[&str],
    ) -> Result<(Output<String>, Output<()>)> {
        let role_name = resource_name(spec, suffix);
        let role: Output<RoleOutputs> = stack.declare(
            ResourceKind::IamRole,
            role_name.clone(),
            Output::known(json!({
                "name": role_name,
                "assumeRolePolicy": assume_role_policy(service).to_string(),
                "tags": spec.tags,
            })),
            &[],
        )?;
        let arn = role.map(|r| r.arn);

        let mut ready = vec![role.unit()];
        for policy in policies {
            let policy_arn = format!("{}{}", AWS_MANAGED_POLICY_PREFIX, policy);
            let role_ref = role_name.clone();
            let attachment: Output<Value> = stack.declare(
                ResourceKind::RolePolicyAttachment,
                format!("{}-{}", role_name, policy),
                role.map(move |_| json!({ "role": role_ref, "policyArn": policy_arn })),
                &[],
            )?;
            ready.push(attachment.unit());
        }

        Ok((arn, all_ready(ready)))
    }
}

pub fn assume_role_policy(service: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Action": "sts:AssumeRole",
            "Effect": "Allow",
            "Principal": { "Service": service },
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cluster::test_support::spec;
    use crate::infrastructure::engine::DryRunEngine;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_declares_default_roles() {
        let mut stack = Stack::new(Arc::new(DryRunEngine::new()));
        let roles = IamRolePlanner::plan(&mut stack, &spec()).unwrap();

        let graph = stack.graph();
        assert_eq!(graph.count(ResourceKind::IamRole), 2);
        assert_eq!(graph.count(ResourceKind::RolePolicyAttachment), 4);
        assert!(roles.fargate_role_arn.is_none());
        assert_eq!(
            roles.service_role_arn.resolve().await.unwrap(),
            "arn:aws:iam::123456789012:role/demo-eksRole"
        );
        assert!(graph
            .get("demo-instanceRole-AmazonEKS_CNI_Policy")
            .unwrap()
            .depends_on
            .iter()
            .any(|d| d.as_str() == "demo-instanceRole"));
    }

    #[tokio::test]
    async fn test_supplied_roles_are_not_declared() {
        let mut spec = spec();
        spec.service_role_arn = Some("arn:aws:iam::111122223333:role/svc".into());
        spec.instance_role_arns = vec![
            "arn:aws:iam::111122223333:role/a".into(),
            "arn:aws:iam::111122223333:role/b".into(),
        ];
        let mut stack = Stack::new(Arc::new(DryRunEngine::new()));
        let roles = IamRolePlanner::plan(&mut stack, &spec).unwrap();

        assert!(stack.graph().is_empty());
        assert_eq!(roles.instance_role_arns.len(), 2);
        assert_eq!(
            roles.instance_role_arns[1].resolve().await.unwrap(),
            "arn:aws:iam::111122223333:role/b"
        );
    }

    #[tokio::test]
    async fn test_fargate_pod_execution_role() {
        let mut spec = spec();
        spec.fargate = Some(crate::domain::config::FargateSpec::default_profile());
        let mut stack = Stack::new(Arc::new(DryRunEngine::new()));
        let roles = IamRolePlanner::plan(&mut stack, &spec).unwrap();

        assert!(stack.graph().get("demo-podExecutionRole").is_some());
        assert!(stack
            .graph()
            .get("demo-podExecutionRole-AmazonEKSFargatePodExecutionRolePolicy")
            .is_some());
        assert!(roles.fargate_role_arn.is_some());
    }
}
