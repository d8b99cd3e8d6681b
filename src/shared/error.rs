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

use thiserror::Error;
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Rejections raised while resolving a cluster specification.
///
/// Every variant names the offending field so callers can point users at the
/// exact knob to change. Nothing is declared once one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing network context: {field} is required")]
    MissingNetworkContext { field: String },

    #[error("invalid cluster name '{name}': {constraint}")]
    InvalidClusterName { name: String, constraint: String },

    #[error(
        "skipDefaultSecurityGroups requires caller-supplied security groups, missing: {}",
        .missing.join(", ")
    )]
    MissingSecurityGroups { missing: Vec<String> },

    #[error("invalid node group sizing: {field} {constraint}")]
    InvalidNodeGroupSizing { field: String, constraint: String },

    #[error("invalid eniMtu {value}: must be within 576..=9001")]
    InvalidMtu { value: i64 },

    #[error("invalid vethPrefix '{value}': must be at most 4 characters")]
    InvalidVethPrefix { value: String },

    #[error("unknown authenticationMode '{value}': expected one of CONFIG_MAP, API, API_AND_CONFIG_MAP")]
    UnknownAuthenticationMode { value: String },

    #[error("{field} requires an authentication mode containing {required}, got {mode}")]
    AuthenticationModeMismatch {
        field: String,
        mode: String,
        required: String,
    },

    #[error("enableIpv6 requires enablePrefixDelegation to be true")]
    Ipv6RequiresPrefixDelegation,

    #[error("{first} and {second} are both set; set only one of them")]
    ConflictingCniOptions { first: String, second: String },

    #[error("invalid ARN for {field}: '{value}'")]
    InvalidArn { field: String, value: String },

    #[error("invalid fargate selector {field}: {constraint}")]
    InvalidFargateSelector { field: String, constraint: String },

    #[error("invalid {field} '{value}': {constraint}")]
    InvalidClusterOption {
        field: String,
        value: String,
        constraint: String,
    },
}

impl ValidationError {
    /// Name of the configuration field that triggered the rejection.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingNetworkContext { field } => field,
            Self::InvalidClusterName { .. } => "name",
            Self::MissingSecurityGroups { .. } => "skipDefaultSecurityGroups",
            Self::InvalidNodeGroupSizing { field, .. } => field,
            Self::InvalidMtu { .. } => "vpcCni.eniMtu",
            Self::InvalidVethPrefix { .. } => "vpcCni.vethPrefix",
            Self::UnknownAuthenticationMode { .. } => "authenticationMode",
            Self::AuthenticationModeMismatch { field, .. } => field,
            Self::Ipv6RequiresPrefixDelegation => "vpcCni.enableIpv6",
            Self::ConflictingCniOptions { first, .. } => first,
            Self::InvalidArn { field, .. } => field,
            Self::InvalidFargateSelector { field, .. } => field,
            Self::InvalidClusterOption { field, .. } => field,
        }
    }

    pub fn sizing(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::InvalidNodeGroupSizing {
            field: field.into(),
            constraint: constraint.into(),
        }
    }

    pub fn cluster_option(
        field: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidClusterOption {
            field: field.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    pub fn mode_mismatch(
        field: impl Into<String>,
        mode: impl Into<String>,
        required: impl Into<String>,
    ) -> Self {
        Self::AuthenticationModeMismatch {
            field: field.into(),
            mode: mode.into(),
            required: required.into(),
        }
    }
}

/// Failure reported by a provisioning engine for a single create call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
    pub transient: bool,
}

impl EngineError {
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: false,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: true,
        }
    }
}

/// Failure of an output handle to resolve.
///
/// `Dependency` errors always point at the resource that actually failed,
/// no matter how many hops separate it from the handle being awaited.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("provider error on {resource}: {message}")]
    Provider { resource: String, message: String },

    #[error("{resource} cannot be resolved, upstream {upstream} failed: {message}")]
    Dependency {
        resource: String,
        upstream: String,
        message: String,
    },
}

impl ResolveError {
    pub fn provider(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Resource whose failure started the chain.
    pub fn origin(&self) -> &str {
        match self {
            Self::Provider { resource, .. } => resource,
            Self::Dependency { upstream, .. } => upstream,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Provider { message, .. } | Self::Dependency { message, .. } => message,
        }
    }

    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }

    /// Re-attribute an upstream failure to `resource`, keeping the origin.
    pub fn propagate(self, resource: impl Into<String>) -> Self {
        Self::Dependency {
            resource: resource.into(),
            upstream: self.origin().to_string(),
            message: self.message().to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Resource declared twice: {id}")]
    DuplicateResource { id: String },

    #[error("Kubernetes API error: {0}")]
    KubeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<kube::Error> for ProvisionError {
    fn from(err: kube::Error) -> Self {
        ProvisionError::KubeError(err.to_string())
    }
}

impl ProvisionError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateResource { id: id.into() }
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_resolve(&self) -> Option<&ResolveError> {
        match self {
            Self::Resolve(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propagate_keeps_origin() {
        let root = ResolveError::provider("demo-eksCluster", "quota exceeded");
        let hop1 = root.propagate("demo-aws-auth");
        let hop2 = hop1.clone().propagate("demo-nodeLaunchTemplate");

        assert_eq!(hop2.origin(), "demo-eksCluster");
        assert_eq!(hop2.message(), "quota exceeded");
        assert!(!hop2.is_provider());
        match hop2 {
            ResolveError::Dependency { resource, .. } => {
                assert_eq!(resource, "demo-nodeLaunchTemplate")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_validation_field_names() {
        assert_eq!(ValidationError::InvalidMtu { value: 10 }.field(), "vpcCni.eniMtu");
        assert_eq!(
            ValidationError::sizing("nodeGroup.minSize", "must be <= desiredCapacity").field(),
            "nodeGroup.minSize"
        );
        let err = ValidationError::MissingSecurityGroups {
            missing: vec!["clusterSecurityGroup".into(), "nodeSecurityGroup".into()],
        };
        assert!(err.to_string().contains("clusterSecurityGroup, nodeSecurityGroup"));
    }
}
