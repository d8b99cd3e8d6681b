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

//! Configuration domain

pub mod auth;
pub mod cluster;
pub mod dynamic;
pub mod node_group;
pub mod storage;
pub mod vpc_cni;

pub use self::auth::{
    AccessEntry, AccessEntryType, AccessPolicy, AccessPolicyAssociation, AccessScope,
    AccessScopeType, AuthenticationMode, RoleMapping, UserMapping,
};
pub use self::cluster::{
    ClusterArgs, ClusterLogType, ClusterSpec, EndpointAccess, IpFamily, KubeconfigOptions,
    DEFAULT_CLUSTER_NAME,
};
pub use self::node_group::{
    FargateArgs, FargateProfileArgs, FargateSelector, FargateSpec, NodeGroupArgs, NodeGroupSpec,
};
pub use self::storage::{EbsVolumeType, StorageClassOptions, StorageClassesArgs};
pub use self::vpc_cni::VpcCniOptions;

pub use self::dynamic::{apply_to_cluster_args, parse_properties};
