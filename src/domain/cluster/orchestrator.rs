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

use crate::domain::cluster::assembler::ResultAssembler;
use crate::domain::cluster::core_data::CoreData;
use crate::domain::cluster::resolver::ConfigResolver;
use crate::domain::config::{ClusterArgs, ClusterSpec};
use crate::infrastructure::engine::{DeclarationGraph, DryRunEngine, ProvisioningEngine, Stack};
use crate::infrastructure::planners::{
    AccessManagement, AccessManagementPlanner, ControlPlane, ControlPlanePlanner, IamRolePlanner,
    IamRoles, NodeCapacity, NodeDependencies, NodeGroupPlanner, SecurityGroupPlanner,
    SecurityGroupSet, StorageClassProvisioner, StorageClasses, VpcCni, VpcCniConfigurator,
};
use crate::shared::error::Result;
use std::sync::Arc;
use tracing::info;

/// Every resource declared for one cluster, with the handles each planner
/// returned. Nothing has been created yet.
pub struct ClusterPlan {
    pub spec: ClusterSpec,
    pub stack: Stack,
    pub roles: IamRoles,
    pub security_groups: SecurityGroupSet,
    pub control_plane: ControlPlane,
    pub access: AccessManagement,
    pub vpc_cni: Option<VpcCni>,
    pub capacity: NodeCapacity,
    pub storage_classes: StorageClasses,
}

impl ClusterPlan {
    pub fn graph(&self) -> &DeclarationGraph {
        self.stack.graph()
    }
}

pub struct ClusterOrchestrator {
    engine: Arc<dyn ProvisioningEngine>,
}

impl ClusterOrchestrator {
    pub fn new(engine: Arc<dyn ProvisioningEngine>) -> Self {
        Self { engine }
    }

    /// Orchestrator backed by an in-memory [`DryRunEngine`].
    pub fn dry_run() -> Self {
        Self::new(Arc::new(DryRunEngine::new()))
    }

    /// Declare every resource for `spec` without creating anything.
    pub fn declare(&self, spec: &ClusterSpec) -> Result<ClusterPlan> {
        let mut stack = Stack::new(self.engine.clone());

        let roles = IamRolePlanner::plan(&mut stack, spec)?;
        let security_groups = SecurityGroupPlanner::plan(&mut stack, spec)?;
        let control_plane = ControlPlanePlanner::plan(&mut stack, spec, &roles, &security_groups)?;
        let access = AccessManagementPlanner::plan(&mut stack, spec, &roles, &control_plane)?;
        let vpc_cni = VpcCniConfigurator::plan(&mut stack, spec, &control_plane)?;

        // Nodes can only register once identity bindings and the CNI are in place.
        let mut ready = vec![access.ready.clone()];
        if let Some(cni) = &vpc_cni {
            ready.push(cni.ready.clone());
        }
        let capacity = NodeGroupPlanner::plan(
            &mut stack,
            spec,
            NodeDependencies {
                roles: &roles,
                groups: &security_groups,
                plane: &control_plane,
                ready,
            },
        )?;
        let storage_classes = StorageClassProvisioner::plan(&mut stack, spec, &control_plane)?;

        info!(
            cluster = %spec.name,
            resources = stack.graph().len(),
            "declared cluster resources"
        );

        Ok(ClusterPlan {
            spec: spec.clone(),
            stack,
            roles,
            security_groups,
            control_plane,
            access,
            vpc_cni,
            capacity,
            storage_classes,
        })
    }

    /// Declare, create and collect every resource for `spec`.
    pub async fn provision(&self, spec: &ClusterSpec) -> Result<CoreData> {
        let plan = self.declare(spec)?;
        ResultAssembler::assemble(&plan).await
    }

    /// Resolve raw arguments and provision the result.
    pub async fn deploy(&self, args: ClusterArgs) -> Result<CoreData> {
        let spec = ConfigResolver::resolve(args)?;
        self.provision(&spec).await
    }
}
