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

//! Resource planners.
//!
//! Each planner reads the resolved [`ClusterSpec`], declares its resources on
//! the [`Stack`] and returns a plain record of output handles. Planners that
//! need another planner's outputs take its record as an argument.

pub mod access;
pub mod control_plane;
pub mod iam;
pub mod node_group;
pub mod security_group;
pub mod storage_class;
pub mod vpc_cni;

use crate::domain::config::ClusterSpec;
use crate::infrastructure::engine::Output;
use serde_json::{json, Value};

pub use access::{AccessEntryRecord, AccessManagement, AccessManagementPlanner, AwsAuthConfigMapBuilder};
pub use control_plane::{ClusterOutputs, ControlPlane, ControlPlanePlanner, OidcProviderData};
pub use iam::{IamRolePlanner, IamRoles};
pub use node_group::{FargateProfileData, NodeCapacity, NodeDependencies, NodeGroupData, NodeGroupPlanner};
pub use security_group::{SecurityGroupPlanner, SecurityGroupSet};
pub use storage_class::{StorageClassData, StorageClassProvisioner, StorageClasses};
pub use vpc_cni::{CniEnvironmentBuilder, VpcCni, VpcCniConfigurator, VpcCniData};

/// Logical resource name scoped to the cluster.
pub(crate) fn resource_name(spec: &ClusterSpec, suffix: &str) -> String {
    format!("{}-{}", spec.name, suffix)
}

pub(crate) fn all_ready(outputs: Vec<Output<()>>) -> Output<()> {
    Output::join_all(outputs).unit()
}

/// Inputs for an in-cluster object: the target cluster plus the manifest.
pub(crate) fn kube_manifest(cluster: &Output<ClusterOutputs>, manifest: Value) -> Output<Value> {
    cluster.map(move |c| json!({ "clusterName": c.name, "manifest": manifest }))
}
