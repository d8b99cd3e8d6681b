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

use super::iam::IamRoles;
use super::resource_name;
use super::security_group::SecurityGroupSet;
use crate::domain::config::{ClusterSpec, IpFamily};
use crate::infrastructure::constants::{OIDC_ROOT_CA_THUMBPRINT, STS_CLIENT_ID};
use crate::infrastructure::engine::{Output, ResourceKind, Stack};
use crate::shared::error::Result;
use crate::shared::ResolveError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Outputs of the managed control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOutputs {
    pub name: String,
    pub arn: String,
    pub endpoint: String,
    /// Base64-encoded CA bundle.
    pub certificate_authority: String,
    pub version: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub oidc_issuer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcProviderData {
    pub arn: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ControlPlane {
    pub cluster: Output<ClusterOutputs>,
    pub oidc_provider: Option<Output<OidcProviderData>>,
}

pub struct ControlPlanePlanner;

impl ControlPlanePlanner {
    pub fn plan(
        stack: &mut Stack,
        spec: &ClusterSpec,
        roles: &IamRoles,
        groups: &SecurityGroupSet,
    ) -> Result<ControlPlane> {
        let name = spec.name.clone();
        let version = spec.version.clone();
        let subnets = spec.subnet_ids.clone();
        let endpoint = spec.endpoint.clone();
        let mode = spec.authentication_mode;
        let tags = spec.tags.clone();
        let log_types: Vec<&'static str> = spec
            .enabled_cluster_log_types
            .iter()
            .map(|log_type| log_type.as_str())
            .collect();
        let encryption_key_arn = spec.encryption_config_key_arn.clone();
        let ip_family = spec.ip_family;
        let service_cidr = spec.kubernetes_service_ip_address_range.clone();

        let inputs = roles
            .service_role_arn
            .join(&groups.cluster_security_group_id)
            .map(move |(role_arn, security_group)| {
                let mut inputs = json!({
                    "name": name,
                    "roleArn": role_arn,
                    "vpcConfig": {
                        "securityGroupIds": [security_group],
                        "subnetIds": subnets,
                        "endpointPublicAccess": endpoint.public_access,
                        "endpointPrivateAccess": endpoint.private_access,
                    },
                    "accessConfig": {
                        "authenticationMode": mode.as_str(),
                        "bootstrapClusterCreatorAdminPermissions": true,
                    },
                    "tags": tags,
                });
                if let Some(version) = version {
                    inputs["version"] = json!(version);
                }
                if !endpoint.public_access_cidrs.is_empty() {
                    inputs["vpcConfig"]["publicAccessCidrs"] = json!(endpoint.public_access_cidrs);
                }
                if !log_types.is_empty() {
                    inputs["enabledClusterLogTypes"] = json!(log_types);
                }
                if let Some(key_arn) = encryption_key_arn {
                    inputs["encryptionConfig"] = json!({
                        "provider": { "keyArn": key_arn },
                        "resources": ["secrets"],
                    });
                }
                inputs["kubernetesNetworkConfig"] = json!({ "ipFamily": ip_family.as_str() });
                if let (IpFamily::Ipv4, Some(cidr)) = (ip_family, service_cidr) {
                    inputs["kubernetesNetworkConfig"]["serviceIpv4Cidr"] = json!(cidr);
                }
                inputs
            });

        let cluster: Output<ClusterOutputs> = stack.declare(
            ResourceKind::EksCluster,
            resource_name(spec, "eksCluster"),
            inputs,
            &[roles.service_role_ready.clone(), groups.ready.clone()],
        )?;

        let oidc_provider = if spec.create_oidc_provider {
            debug!(cluster = %spec.name, "declaring OIDC provider");
            let cluster_resource = resource_name(spec, "eksCluster");
            let provider: Output<OidcProviderData> = stack.declare(
                ResourceKind::OidcProvider,
                resource_name(spec, "oidcProvider"),
                cluster.then(move |c| async move {
                    let url = c.oidc_issuer.filter(|url| !url.is_empty()).ok_or_else(|| {
                        ResolveError::provider(cluster_resource, "cluster reported no OIDC issuer")
                    })?;
                    Ok(json!({
                        "url": url,
                        "clientIdLists": [STS_CLIENT_ID],
                        "thumbprintLists": [OIDC_ROOT_CA_THUMBPRINT],
                    }))
                }),
                &[],
            )?;
            Some(provider)
        } else {
            None
        };

        Ok(ControlPlane {
            cluster,
            oidc_provider,
        })
    }
}
