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
use super::{kube_manifest, resource_name};
use crate::domain::config::{ClusterSpec, EbsVolumeType, StorageClassOptions};
use crate::infrastructure::constants::{
    DEFAULT_CLASS_ANNOTATION, EBS_PROVISIONER, LABEL_MANAGED_BY, LABEL_MANAGED_BY_VALUE,
};
use crate::infrastructure::engine::{Output, ResourceKind, Stack};
use crate::shared::error::Result;
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageClassData {
    pub name: String,
    pub volume_type: EbsVolumeType,
    pub default: bool,
}

/// Provisioned classes keyed by their configured name.
pub type StorageClasses = BTreeMap<String, Output<StorageClassData>>;

pub struct StorageClassProvisioner;

impl StorageClassProvisioner {
    pub fn plan(stack: &mut Stack, spec: &ClusterSpec, plane: &ControlPlane) -> Result<StorageClasses> {
        let mut classes = StorageClasses::new();
        for (name, options) in &spec.storage_classes {
            debug!(cluster = %spec.name, class = %name, volume_type = %options.volume_type, "declaring storage class");
            let manifest = serde_json::to_value(build_storage_class(name, options))?;
            let declared: Output<Value> = stack.declare(
                ResourceKind::StorageClass,
                resource_name(spec, &format!("storageClass-{}", name)),
                kube_manifest(&plane.cluster, manifest),
                &[],
            )?;

            let data = StorageClassData {
                name: name.clone(),
                volume_type: options.volume_type,
                default: options.default,
            };
            classes.insert(name.clone(), declared.map(move |_| data));
        }
        Ok(classes)
    }
}

pub fn build_storage_class(name: &str, options: &StorageClassOptions) -> StorageClass {
    let mut parameters = BTreeMap::new();
    parameters.insert("type".to_string(), options.volume_type.as_str().to_string());
    if let Some(encrypted) = options.encrypted {
        parameters.insert("encrypted".to_string(), encrypted.to_string());
    }
    if let Some(iops) = options.iops_per_gb {
        parameters.insert("iopsPerGB".to_string(), iops.to_string());
    }
    if let Some(kms_key_id) = &options.kms_key_id {
        parameters.insert("kmsKeyId".to_string(), kms_key_id.clone());
    }
    if !options.zones.is_empty() {
        parameters.insert("zones".to_string(), options.zones.join(", "));
    }

    let mut labels = BTreeMap::new();
    labels.insert(LABEL_MANAGED_BY.to_string(), LABEL_MANAGED_BY_VALUE.to_string());
    let annotations = options.default.then(|| {
        let mut annotations = BTreeMap::new();
        annotations.insert(DEFAULT_CLASS_ANNOTATION.to_string(), "true".to_string());
        annotations
    });

    StorageClass {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels),
            annotations,
            ..Default::default()
        },
        provisioner: EBS_PROVISIONER.to_string(),
        parameters: Some(parameters),
        reclaim_policy: options.reclaim_policy.clone(),
        volume_binding_mode: options.volume_binding_mode.clone(),
        allow_volume_expansion: options.allow_volume_expansion,
        mount_options: (!options.mount_options.is_empty()).then(|| options.mount_options.clone()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cluster::test_support::spec;
    use crate::infrastructure::engine::DryRunEngine;
    use crate::infrastructure::planners::{ControlPlanePlanner, IamRolePlanner, SecurityGroupPlanner};
    use std::sync::Arc;

    #[test]
    fn test_build_storage_class() {
        let mut options = StorageClassOptions::default_for(EbsVolumeType::Io1);
        options.iops_per_gb = Some(50);
        options.encrypted = Some(true);
        options.zones = vec!["us-west-2a".into(), "us-west-2b".into()];

        let class = build_storage_class("fast", &options);
        assert_eq!(class.provisioner, "kubernetes.io/aws-ebs");
        let parameters = class.parameters.unwrap();
        assert_eq!(parameters["type"], "io1");
        assert_eq!(parameters["iopsPerGB"], "50");
        assert_eq!(parameters["encrypted"], "true");
        assert_eq!(parameters["zones"], "us-west-2a, us-west-2b");
        assert_eq!(
            class.metadata.annotations.unwrap()[DEFAULT_CLASS_ANNOTATION],
            "true"
        );
    }

    #[test]
    fn test_non_default_class_has_no_annotation() {
        let mut options = StorageClassOptions::default_for(EbsVolumeType::Sc1);
        options.default = false;
        let class = build_storage_class("cold", &options);
        assert!(class.metadata.annotations.is_none());
    }

    #[tokio::test]
    async fn test_classes_follow_the_cluster() {
        let mut spec = spec();
        spec.storage_classes
            .insert("gp3".into(), StorageClassOptions::default_for(EbsVolumeType::Gp3));
        let engine = Arc::new(DryRunEngine::new());
        let mut stack = Stack::new(engine.clone());
        let roles = IamRolePlanner::plan(&mut stack, &spec).unwrap();
        let groups = SecurityGroupPlanner::plan(&mut stack, &spec).unwrap();
        let plane = ControlPlanePlanner::plan(&mut stack, &spec, &roles, &groups).unwrap();
        let classes = StorageClassProvisioner::plan(&mut stack, &spec, &plane).unwrap();

        assert!(stack.graph().depends_transitively("demo-storageClass-gp3", "demo-eksCluster"));
        stack.settle().await.unwrap();

        let gp3 = classes["gp3"].resolve().await.unwrap();
        assert!(gp3.default);
        let request = engine.request("demo-storageClass-gp3").await.unwrap();
        assert_eq!(request.inputs["clusterName"], "demo");
        assert_eq!(request.inputs["manifest"]["metadata"]["name"], "gp3");
    }
}
