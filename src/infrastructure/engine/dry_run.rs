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

//! In-memory engine that fabricates plausible outputs.
//!
//! Outputs are a function of the request only, so planning the same
//! specification twice yields the same ids, ARNs and endpoints.

use super::resource::{ResourceKind, ResourceRequest};
use super::ProvisioningEngine;
use crate::shared::EngineError;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use tokio::sync::Mutex;

pub const DRY_RUN_ACCOUNT_ID: &str = "123456789012";
pub const DRY_RUN_REGION: &str = "us-west-2";
const DEFAULT_CLUSTER_VERSION: &str = "1.30";
const DEFAULT_VPC_CNI_VERSION: &str = "v1.18.3-eksbuild.1";

pub struct DryRunEngine {
    account_id: String,
    region: String,
    failures: HashMap<String, EngineError>,
    requests: Mutex<Vec<ResourceRequest>>,
}

impl Default for DryRunEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DryRunEngine {
    pub fn new() -> Self {
        Self {
            account_id: DRY_RUN_ACCOUNT_ID.to_string(),
            region: DRY_RUN_REGION.to_string(),
            failures: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Make every create call for `resource` fail permanently.
    pub fn fail_on(mut self, resource: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures
            .insert(resource.into(), EngineError::permanent(message));
        self
    }

    /// Requests received so far, in arrival order.
    pub async fn requests(&self) -> Vec<ResourceRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request(&self, resource: &str) -> Option<ResourceRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .find(|r| r.id.as_str() == resource)
            .cloned()
    }

    fn outputs(&self, request: &ResourceRequest) -> Value {
        let name = request.id.as_str();
        let hash = fingerprint(name);
        let short = format!("{:08x}", hash as u32);
        let long = format!("{:016x}", hash);
        let account = &self.account_id;
        let region = &self.region;

        let mut outputs = match &request.inputs {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        let input_str = |key: &str| {
            request
                .inputs
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let generated = match request.kind {
            ResourceKind::IamRole => {
                let role_name = input_str("name").unwrap_or_else(|| name.to_string());
                json!({
                    "name": role_name,
                    "arn": format!("arn:aws:iam::{}:role/{}", account, role_name),
                })
            }
            ResourceKind::RolePolicyAttachment => json!({ "id": format!("{}-{}", name, short) }),
            ResourceKind::InstanceProfile => {
                let profile_name = input_str("name").unwrap_or_else(|| name.to_string());
                json!({
                    "name": profile_name,
                    "arn": format!("arn:aws:iam::{}:instance-profile/{}", account, profile_name),
                })
            }
            ResourceKind::SecurityGroup => {
                let id = format!("sg-{}", &long[..16]);
                json!({
                    "arn": format!("arn:aws:ec2:{}:{}:security-group/{}", region, account, id),
                    "id": id,
                })
            }
            ResourceKind::SecurityGroupRule => json!({ "id": format!("sgr-{}", long) }),
            ResourceKind::EksCluster => {
                let cluster_name = input_str("name").unwrap_or_else(|| name.to_string());
                let endpoint_id = format!("{:016X}{:016X}", hash, fingerprint(&long));
                let ca = STANDARD.encode(format!(
                    "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
                    endpoint_id
                ));
                json!({
                    "name": cluster_name,
                    "arn": format!("arn:aws:eks:{}:{}:cluster/{}", region, account, cluster_name),
                    "endpoint": format!("https://{}.gr7.{}.eks.amazonaws.com", endpoint_id, region),
                    "certificateAuthority": ca,
                    "version": input_str("version").unwrap_or_else(|| DEFAULT_CLUSTER_VERSION.to_string()),
                    "status": "ACTIVE",
                    "oidcIssuer": format!("https://oidc.eks.{}.amazonaws.com/id/{}", region, endpoint_id),
                })
            }
            ResourceKind::OidcProvider => {
                let url = input_str("url").unwrap_or_default();
                json!({
                    "arn": format!(
                        "arn:aws:iam::{}:oidc-provider/{}",
                        account,
                        url.trim_start_matches("https://")
                    ),
                })
            }
            ResourceKind::AccessEntry => json!({
                "accessEntryArn": format!(
                    "arn:aws:eks:{}:{}:access-entry/{}/{}",
                    region,
                    account,
                    input_str("clusterName").unwrap_or_default(),
                    short
                ),
            }),
            ResourceKind::LaunchTemplate => json!({
                "id": format!("lt-{}", &long[..16]),
                "latestVersion": 1,
            }),
            ResourceKind::AutoScalingGroup => {
                let group_name = input_str("name").unwrap_or_else(|| name.to_string());
                json!({
                    "name": group_name,
                    "arn": format!(
                        "arn:aws:autoscaling:{}:{}:autoScalingGroup:{}:autoScalingGroupName/{}",
                        region, account, short, group_name
                    ),
                })
            }
            ResourceKind::FargateProfile => json!({
                "arn": format!(
                    "arn:aws:eks:{}:{}:fargateprofile/{}/{}",
                    region,
                    account,
                    input_str("clusterName").unwrap_or_default(),
                    input_str("fargateProfileName").unwrap_or_else(|| name.to_string())
                ),
                "status": "ACTIVE",
            }),
            ResourceKind::VpcCniAddon => json!({
                "arn": format!("arn:aws:eks:{}:{}:addon/vpc-cni/{}", region, account, short),
                "addonVersion": input_str("addonVersion")
                    .unwrap_or_else(|| DEFAULT_VPC_CNI_VERSION.to_string()),
            }),
            ResourceKind::AccessPolicyAssociation
            | ResourceKind::ConfigMap
            | ResourceKind::DaemonSetPatch
            | ResourceKind::StorageClass => json!({ "uid": long }),
        };

        if let Value::Object(generated) = generated {
            outputs.extend(generated);
        }
        Value::Object(outputs)
    }
}

#[async_trait::async_trait]
impl ProvisioningEngine for DryRunEngine {
    async fn create(&self, request: &ResourceRequest) -> Result<Value, EngineError> {
        self.requests.lock().await.push(request.clone());

        if let Some(err) = self.failures.get(request.id.as_str()) {
            return Err(err.clone());
        }
        Ok(self.outputs(request))
    }
}

fn fingerprint(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
