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

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Every resource type the orchestrator knows how to declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    IamRole,
    RolePolicyAttachment,
    InstanceProfile,
    SecurityGroup,
    SecurityGroupRule,
    EksCluster,
    OidcProvider,
    AccessEntry,
    AccessPolicyAssociation,
    ConfigMap,
    LaunchTemplate,
    AutoScalingGroup,
    FargateProfile,
    VpcCniAddon,
    DaemonSetPatch,
    StorageClass,
}

/// Engine type tokens, one per kind.
const RESOURCE_KINDS: [(ResourceKind, &str); 16] = [
    (ResourceKind::IamRole, "aws:iam/role:Role"),
    (
        ResourceKind::RolePolicyAttachment,
        "aws:iam/rolePolicyAttachment:RolePolicyAttachment",
    ),
    (
        ResourceKind::InstanceProfile,
        "aws:iam/instanceProfile:InstanceProfile",
    ),
    (ResourceKind::SecurityGroup, "aws:ec2/securityGroup:SecurityGroup"),
    (
        ResourceKind::SecurityGroupRule,
        "aws:ec2/securityGroupRule:SecurityGroupRule",
    ),
    (ResourceKind::EksCluster, "aws:eks/cluster:Cluster"),
    (
        ResourceKind::OidcProvider,
        "aws:iam/openIdConnectProvider:OpenIdConnectProvider",
    ),
    (ResourceKind::AccessEntry, "aws:eks/accessEntry:AccessEntry"),
    (
        ResourceKind::AccessPolicyAssociation,
        "aws:eks/accessPolicyAssociation:AccessPolicyAssociation",
    ),
    (ResourceKind::ConfigMap, "kubernetes:core/v1:ConfigMap"),
    (ResourceKind::LaunchTemplate, "aws:ec2/launchTemplate:LaunchTemplate"),
    (ResourceKind::AutoScalingGroup, "aws:autoscaling/group:Group"),
    (ResourceKind::FargateProfile, "aws:eks/fargateProfile:FargateProfile"),
    (ResourceKind::VpcCniAddon, "aws:eks/addon:Addon"),
    (ResourceKind::DaemonSetPatch, "kubernetes:apps/v1:DaemonSetPatch"),
    (ResourceKind::StorageClass, "kubernetes:storage.k8s.io/v1:StorageClass"),
];

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        RESOURCE_KINDS
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, token)| *token)
            .unwrap_or("unknown")
    }

    pub fn all() -> impl Iterator<Item = ResourceKind> {
        RESOURCE_KINDS.iter().map(|(kind, _)| *kind)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RESOURCE_KINDS
            .iter()
            .find(|(_, token)| *token == s)
            .map(|(kind, _)| *kind)
            .ok_or_else(|| format!("unknown resource type token: {}", s))
    }
}

/// Logical name of a declared resource, unique within a stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A create call handed to the provisioning engine, inputs fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub inputs: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub depends_on: BTreeSet<ResourceId>,
}

/// Resources in declaration order together with their direct dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationGraph {
    declarations: Vec<Declaration>,
}

impl DeclarationGraph {
    pub(crate) fn push(&mut self, declaration: Declaration) {
        self.declarations.push(declaration);
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.declarations.iter().any(|d| &d.id == id)
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.id.as_str() == name)
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(move |d| d.kind == kind)
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Whether `name` reaches `upstream` by following dependency edges.
    pub fn depends_transitively(&self, name: &str, upstream: &str) -> bool {
        let mut stack: Vec<&str> = vec![name];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(decl) = self.get(current) {
                for dep in &decl.depends_on {
                    if dep.as_str() == upstream {
                        return true;
                    }
                    stack.push(dep.as_str());
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tokens_round_trip() {
        assert_eq!(ResourceKind::all().count(), RESOURCE_KINDS.len());
        for kind in ResourceKind::all() {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
        assert!("aws:s3/bucket:Bucket".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_transitive_dependencies() {
        let mut graph = DeclarationGraph::default();
        graph.push(Declaration {
            id: ResourceId::new("role"),
            kind: ResourceKind::IamRole,
            depends_on: BTreeSet::new(),
        });
        graph.push(Declaration {
            id: ResourceId::new("cluster"),
            kind: ResourceKind::EksCluster,
            depends_on: [ResourceId::new("role")].into(),
        });
        graph.push(Declaration {
            id: ResourceId::new("asg"),
            kind: ResourceKind::AutoScalingGroup,
            depends_on: [ResourceId::new("cluster")].into(),
        });

        assert!(graph.depends_transitively("asg", "role"));
        assert!(!graph.depends_transitively("role", "asg"));
        assert_eq!(graph.count(ResourceKind::EksCluster), 1);
    }
}
