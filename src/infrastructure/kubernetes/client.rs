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

use crate::infrastructure::constants::{AWS_AUTH_NAME, KUBE_SYSTEM_NAMESPACE};
use crate::shared::error::{ProvisionError, Result};
use k8s_openapi::api::core::v1::{ConfigMap, Node};
use k8s_openapi::api::storage::v1::StorageClass;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client};
use std::path::Path;

/// Read-only view of a provisioned cluster.
#[async_trait::async_trait]
pub trait ClusterStatusClient: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    async fn list_storage_classes(&self) -> Result<Vec<StorageClass>>;

    /// The aws-auth ConfigMap, or `None` when the cluster has none.
    async fn get_aws_auth(&self) -> Result<Option<ConfigMap>>;
}

pub struct EksKubeClient {
    client: Client,
}

impl EksKubeClient {
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await.map_err(|e| {
            ProvisionError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;
        Ok(Self { client })
    }

    /// Connect using a kubeconfig file, such as one written by the
    /// `kubeconfig` command.
    pub async fn from_kubeconfig_file(path: &Path, context: Option<String>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_kubeconfig_str(&text, context).await
    }

    pub async fn from_kubeconfig_str(text: &str, context: Option<String>) -> Result<Self> {
        let kubeconfig = Kubeconfig::from_yaml(text)
            .map_err(|e| ProvisionError::KubeError(format!("Failed to load kubeconfig: {}", e)))?;

        let options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };
        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| {
                ProvisionError::KubeError(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            ProvisionError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ClusterStatusClient for EksKubeClient {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let nodes = api.list(&kube::api::ListParams::default()).await?;
        Ok(nodes.items)
    }

    async fn list_storage_classes(&self) -> Result<Vec<StorageClass>> {
        let api: Api<StorageClass> = Api::all(self.client.clone());
        let classes = api.list(&kube::api::ListParams::default()).await?;
        Ok(classes.items)
    }

    async fn get_aws_auth(&self) -> Result<Option<ConfigMap>> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), KUBE_SYSTEM_NAMESPACE);
        match api.get(AWS_AUTH_NAME).await {
            Ok(config_map) => Ok(Some(config_map)),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
            Err(e) => Err(ProvisionError::KubeError(e.to_string())),
        }
    }
}

/// Summary row for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub name: String,
    pub ready: bool,
    pub instance_type: Option<String>,
    pub kubelet_version: Option<String>,
}

impl NodeSummary {
    pub fn from_node(node: &Node) -> Self {
        let name = node.metadata.name.clone().unwrap_or_default();
        let instance_type = node
            .metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get("node.kubernetes.io/instance-type").cloned());
        let status = node.status.as_ref();
        let ready = status
            .and_then(|s| s.conditions.as_ref())
            .map(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == "Ready" && c.status == "True")
            })
            .unwrap_or(false);
        let kubelet_version = status
            .and_then(|s| s.node_info.as_ref())
            .map(|info| info.kubelet_version.clone());

        Self {
            name,
            ready,
            instance_type,
            kubelet_version,
        }
    }
}
