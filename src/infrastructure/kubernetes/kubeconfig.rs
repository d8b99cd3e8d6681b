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

//! Kubeconfig documents for provisioned clusters.
//!
//! The document authenticates through the `aws eks get-token` exec plugin.
//! [`KubeconfigDocument::to_canonical_json`] renders keys in sorted order so
//! the same cluster always produces the same string.

use crate::domain::config::KubeconfigOptions;
use crate::infrastructure::constants::{
    EXEC_API_VERSION, KUBECONFIG_CLUSTER, KUBECONFIG_CONTEXT, KUBECONFIG_USER,
};
use crate::shared::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubeconfigDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context")]
    pub current_context: String,
    pub kind: String,
    pub users: Vec<NamedUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub cluster: ClusterEntry,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEntry {
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: String,
    pub server: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedContext {
    pub context: ContextEntry,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: UserEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub exec: ExecConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub args: Vec<String>,
    pub command: String,
    pub env: Vec<ExecEnvVar>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecEnvVar {
    pub name: String,
    pub value: String,
}

impl KubeconfigDocument {
    /// Compact JSON with object keys sorted.
    pub fn to_canonical_json(&self) -> Result<String> {
        // serde_json's Map is ordered by key unless preserve_order is enabled.
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string(&value)?)
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.clusters.first().map(|c| c.cluster.server.as_str())
    }
}

/// Builds the kubeconfig for one cluster.
pub struct KubeconfigGenerator<'a> {
    cluster_name: &'a str,
    endpoint: &'a str,
    certificate_authority: &'a str,
    region: Option<&'a str>,
    options: &'a KubeconfigOptions,
}

impl<'a> KubeconfigGenerator<'a> {
    pub fn new(
        cluster_name: &'a str,
        endpoint: &'a str,
        certificate_authority: &'a str,
        options: &'a KubeconfigOptions,
    ) -> Self {
        Self {
            cluster_name,
            endpoint,
            certificate_authority,
            region: None,
            options,
        }
    }

    pub fn with_region(mut self, region: Option<&'a str>) -> Self {
        self.region = region;
        self
    }

    pub fn generate(&self) -> KubeconfigDocument {
        KubeconfigDocument {
            api_version: "v1".to_string(),
            clusters: vec![NamedCluster {
                cluster: ClusterEntry {
                    certificate_authority_data: self.certificate_authority.to_string(),
                    server: self.endpoint.to_string(),
                },
                name: KUBECONFIG_CLUSTER.to_string(),
            }],
            contexts: vec![NamedContext {
                context: ContextEntry {
                    cluster: KUBECONFIG_CLUSTER.to_string(),
                    user: KUBECONFIG_USER.to_string(),
                },
                name: KUBECONFIG_CONTEXT.to_string(),
            }],
            current_context: KUBECONFIG_CONTEXT.to_string(),
            kind: "Config".to_string(),
            users: vec![NamedUser {
                name: KUBECONFIG_USER.to_string(),
                user: UserEntry {
                    exec: self.exec_config(),
                },
            }],
        }
    }

    fn exec_config(&self) -> ExecConfig {
        let mut args = vec![
            "eks".to_string(),
            "get-token".to_string(),
            "--cluster-name".to_string(),
            self.cluster_name.to_string(),
        ];
        if let Some(role_arn) = &self.options.role_arn {
            args.push("--role-arn".to_string());
            args.push(role_arn.clone());
        }
        if let Some(region) = self.region {
            args.push("--region".to_string());
            args.push(region.to_string());
        }

        let mut env = vec![ExecEnvVar {
            name: "KUBERNETES_EXEC_INFO".to_string(),
            value: format!("{{\"apiVersion\": \"{}\"}}", EXEC_API_VERSION),
        }];
        if let Some(profile) = &self.options.profile_name {
            env.push(ExecEnvVar {
                name: "AWS_PROFILE".to_string(),
                value: profile.clone(),
            });
        }

        ExecConfig {
            api_version: EXEC_API_VERSION.to_string(),
            args,
            command: "aws".to_string(),
            env,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_document() {
        let options = KubeconfigOptions::default();
        let doc = KubeconfigGenerator::new("demo", "https://example.eks", "Q0E=", &options).generate();

        assert_eq!(doc.current_context, "aws");
        assert_eq!(doc.endpoint(), Some("https://example.eks"));
        let exec = &doc.users[0].user.exec;
        assert_eq!(exec.command, "aws");
        assert_eq!(exec.args, vec!["eks", "get-token", "--cluster-name", "demo"]);
        assert_eq!(exec.env.len(), 1);
    }

    #[test]
    fn test_role_profile_and_region() {
        let options = KubeconfigOptions {
            role_arn: Some("arn:aws:iam::123456789012:role/admin".into()),
            profile_name: Some("dev".into()),
        };
        let doc = KubeconfigGenerator::new("demo", "https://example.eks", "Q0E=", &options)
            .with_region(Some("eu-west-1"))
            .generate();

        let exec = &doc.users[0].user.exec;
        assert_eq!(
            &exec.args[4..],
            &["--role-arn", "arn:aws:iam::123456789012:role/admin", "--region", "eu-west-1"]
        );
        assert_eq!(exec.env[1].name, "AWS_PROFILE");
        assert_eq!(exec.env[1].value, "dev");
    }

    #[test]
    fn test_canonical_json_is_sorted_and_loadable() {
        let options = KubeconfigOptions::default();
        let doc = KubeconfigGenerator::new("demo", "https://example.eks", "Q0E=", &options).generate();
        let json = doc.to_canonical_json().unwrap();

        assert!(json.starts_with("{\"apiVersion\":\"v1\",\"clusters\":"));
        assert!(json.contains("{\"cluster\":{\"certificate-authority-data\":\"Q0E=\",\"server\":\"https://example.eks\"},\"name\":\"kubernetes\"}"));
        assert_eq!(json, doc.to_canonical_json().unwrap());

        let loaded = kube::config::Kubeconfig::from_yaml(&json).unwrap();
        assert_eq!(loaded.current_context.as_deref(), Some("aws"));
        assert_eq!(loaded.clusters[0].name, "kubernetes");
    }
}
