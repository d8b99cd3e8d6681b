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

//! Collects planner outputs into [`CoreData`].
//!
//! The whole stack settles first, so a failure anywhere surfaces before any
//! field is read and callers never see a partially filled record.

use crate::domain::cluster::core_data::{CoreData, SecurityGroupIds};
use crate::domain::cluster::orchestrator::ClusterPlan;
use crate::infrastructure::engine::{Output, OutputValue};
use crate::infrastructure::kubernetes::KubeconfigGenerator;
use crate::shared::error::Result;
use crate::shared::ResolveError;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub struct ResultAssembler;

impl ResultAssembler {
    pub async fn assemble(plan: &ClusterPlan) -> Result<CoreData> {
        let spec = &plan.spec;
        if let Err(err) = plan.stack.settle().await {
            warn!(cluster = %spec.name, origin = %err.origin(), "provisioning failed");
            return Err(err.into());
        }

        let cluster = plan.control_plane.cluster.resolve().await?;
        let groups = &plan.security_groups;
        let security_groups = SecurityGroupIds {
            cluster_security_group_id: groups.cluster_security_group_id.resolve().await?,
            node_security_group_id: resolve_optional(&groups.node_security_group_id).await?,
            cluster_ingress_rule_id: groups.cluster_ingress_rule_id.resolve().await?,
        };

        let roles = &plan.roles;
        let service_role_arn = roles.service_role_arn.resolve().await?;
        let instance_role_arns = Output::join_all(roles.instance_role_arns.iter().cloned())
            .resolve()
            .await?;
        let fargate_role_arn = resolve_optional(&roles.fargate_role_arn).await?;

        let mut storage_classes = BTreeMap::new();
        for (name, class) in &plan.storage_classes {
            storage_classes.insert(name.clone(), class.resolve().await?);
        }

        let vpc_cni = match &plan.vpc_cni {
            Some(cni) => Some(cni.addon.resolve().await?),
            None => None,
        };

        let kubeconfig = KubeconfigGenerator::new(
            &cluster.name,
            &cluster.endpoint,
            &cluster.certificate_authority,
            &spec.kubeconfig,
        )
        .with_region(spec.region.as_deref())
        .generate();
        let kubeconfig_json = kubeconfig.to_canonical_json()?;

        info!(cluster = %cluster.name, endpoint = %cluster.endpoint, "cluster provisioned");

        Ok(CoreData {
            endpoint: cluster.endpoint.clone(),
            authentication_mode: spec.authentication_mode,
            security_groups,
            service_role_arn,
            instance_role_arns,
            fargate_role_arn,
            default_node_group: resolve_optional(&plan.capacity.node_group).await?,
            fargate_profile: resolve_optional(&plan.capacity.fargate_profile).await?,
            access_entries: resolve_optional(&plan.access.access_entries).await?,
            aws_auth: resolve_optional(&plan.access.aws_auth).await?,
            storage_classes,
            vpc_cni,
            oidc_provider: resolve_optional(&plan.control_plane.oidc_provider).await?,
            subnet_ids: spec.subnet_ids.clone(),
            public_subnet_ids: spec.public_subnet_ids.clone(),
            private_subnet_ids: spec.private_subnet_ids.clone(),
            tags: spec.tags.clone(),
            kubeconfig,
            kubeconfig_json,
            cluster,
        })
    }
}

async fn resolve_optional<T: OutputValue>(
    output: &Option<Output<T>>,
) -> std::result::Result<Option<T>, ResolveError> {
    match output {
        Some(output) => output.resolve().await.map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cluster::test_support::spec;
    use crate::domain::cluster::ClusterOrchestrator;
    use crate::infrastructure::engine::DryRunEngine;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_assembles_default_cluster() {
        let orchestrator = ClusterOrchestrator::dry_run();
        let plan = orchestrator.declare(&spec()).unwrap();
        let data = ResultAssembler::assemble(&plan).await.unwrap();

        assert_eq!(data.cluster.name, "demo");
        assert!(data.kubeconfig_json.contains(&data.endpoint));
        assert_eq!(data.kubeconfig.endpoint(), Some(data.endpoint.as_str()));
        assert_eq!(data.aws_auth.as_deref(), Some("kube-system/aws-auth"));
        assert!(data.access_entries.is_none());
        assert_eq!(data.instance_role_arns.len(), 1);
        assert!(data.default_node_group.is_some());
    }

    #[tokio::test]
    async fn test_failure_yields_no_record() {
        let engine = Arc::new(DryRunEngine::new().fail_on("demo-nodeLaunchTemplate", "InvalidAMIID"));
        let orchestrator = ClusterOrchestrator::new(engine);
        let plan = orchestrator.declare(&spec()).unwrap();

        let err = ResultAssembler::assemble(&plan).await.unwrap_err();
        let resolve = err.as_resolve().unwrap();
        assert_eq!(resolve.origin(), "demo-nodeLaunchTemplate");
        assert_eq!(resolve.message(), "InvalidAMIID");
    }
}
