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

use super::output::{Output, OutputValue};
use super::resource::{Declaration, DeclarationGraph, ResourceId, ResourceKind, ResourceRequest};
use super::ProvisioningEngine;
use crate::shared::error::{ProvisionError, ResolveError, Result};
use futures::future;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Collects resource declarations for one cluster.
///
/// `declare` never blocks: it records the declaration and hands back an
/// [`Output`] whose create call runs once its inputs and dependencies have
/// resolved. [`Stack::settle`] drives every declared resource to completion.
pub struct Stack {
    engine: Arc<dyn ProvisioningEngine>,
    graph: DeclarationGraph,
    pending: Vec<Output<()>>,
}

impl Stack {
    pub fn new(engine: Arc<dyn ProvisioningEngine>) -> Self {
        Self {
            engine,
            graph: DeclarationGraph::default(),
            pending: Vec::new(),
        }
    }

    pub fn graph(&self) -> &DeclarationGraph {
        &self.graph
    }

    pub fn declare<T>(
        &mut self,
        kind: ResourceKind,
        name: impl Into<String>,
        inputs: Output<Value>,
        depends_on: &[Output<()>],
    ) -> Result<Output<T>>
    where
        T: DeserializeOwned + OutputValue,
    {
        let id = ResourceId::new(name);
        if self.graph.contains(&id) {
            return Err(ProvisionError::duplicate(id.as_str()));
        }

        let mut edges: BTreeSet<ResourceId> = inputs.resources().clone();
        for dependency in depends_on {
            edges.extend(dependency.resources().iter().cloned());
        }
        debug!(resource = %id, kind = %kind, dependencies = edges.len(), "declared resource");
        self.graph.push(Declaration {
            id: id.clone(),
            kind,
            depends_on: edges,
        });

        let gate = Output::join_all(depends_on.iter().cloned()).join(&inputs);
        let engine = self.engine.clone();
        let resource = id.clone();
        let future = async move {
            let (_, inputs) = gate
                .resolve()
                .await
                .map_err(|err| err.propagate(resource.as_str()))?;

            let request = ResourceRequest {
                id: resource.clone(),
                kind,
                inputs,
            };
            let outputs = engine.create(&request).await.map_err(|err| {
                warn!(resource = %resource, kind = %kind, error = %err, "create failed");
                ResolveError::provider(resource.as_str(), err.message)
            })?;
            debug!(resource = %resource, "resource created");

            serde_json::from_value::<T>(outputs).map_err(|err| {
                ResolveError::provider(resource.as_str(), format!("unexpected outputs: {}", err))
            })
        };

        let output = Output::from_future(future, [id].into());
        self.pending.push(output.unit());
        Ok(output)
    }

    /// Wait for every declared resource.
    ///
    /// All branches run to completion before an error is reported. The error
    /// returned is the first provider failure in declaration order, or the
    /// first failure of any kind when no resource failed at the provider.
    pub async fn settle(&self) -> std::result::Result<(), ResolveError> {
        let results = future::join_all(self.pending.iter().map(|output| output.resolve())).await;

        let mut first = None;
        for result in results {
            if let Err(err) = result {
                if err.is_provider() {
                    return Err(err);
                }
                first.get_or_insert(err);
            }
        }

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::engine::DryRunEngine;
    use serde_json::json;

    fn stack(engine: DryRunEngine) -> (Stack, Arc<DryRunEngine>) {
        let engine = Arc::new(engine);
        (Stack::new(engine.clone()), engine)
    }

    #[tokio::test]
    async fn test_declare_records_edges() {
        let (mut stack, engine) = stack(DryRunEngine::new());
        let role: Output<Value> = stack
            .declare(
                ResourceKind::IamRole,
                "demo-role",
                Output::known(json!({"name": "demo-role"})),
                &[],
            )
            .unwrap();
        let role_arn = role.map(|v| v["arn"].clone());
        let _attachment: Output<Value> = stack
            .declare(
                ResourceKind::RolePolicyAttachment,
                "demo-role-policy",
                role_arn.map(|arn| json!({ "role": arn })),
                &[],
            )
            .unwrap();

        let decl = stack.graph().get("demo-role-policy").unwrap();
        assert!(decl.depends_on.contains(&ResourceId::new("demo-role")));

        // Nothing runs until the stack is settled.
        assert!(engine.requests().await.is_empty());
        stack.settle().await.unwrap();
        assert_eq!(engine.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_declaration_is_rejected() {
        let (mut stack, _) = stack(DryRunEngine::new());
        let inputs = Output::known(json!({}));
        stack
            .declare::<Value>(ResourceKind::SecurityGroup, "sg", inputs.clone(), &[])
            .unwrap();
        let err = stack
            .declare::<Value>(ResourceKind::SecurityGroup, "sg", inputs, &[])
            .unwrap_err();
        assert!(matches!(err, ProvisionError::DuplicateResource { .. }));
    }

    #[tokio::test]
    async fn test_settle_reports_originating_resource() {
        let engine = DryRunEngine::new().fail_on("cluster", "AccessDenied");
        let (mut stack, engine) = stack(engine);
        let cluster: Output<Value> = stack
            .declare(ResourceKind::EksCluster, "cluster", Output::known(json!({})), &[])
            .unwrap();
        let _cm: Output<Value> = stack
            .declare(
                ResourceKind::ConfigMap,
                "aws-auth",
                Output::known(json!({})),
                &[cluster.unit()],
            )
            .unwrap();
        let _sc: Output<Value> = stack
            .declare(ResourceKind::StorageClass, "gp2", Output::known(json!({})), &[])
            .unwrap();

        let err = stack.settle().await.unwrap_err();
        assert!(err.is_provider());
        assert_eq!(err.origin(), "cluster");
        assert_eq!(err.message(), "AccessDenied");

        // Independent branches still ran; the dependent one never reached the engine.
        let created: Vec<String> = engine
            .requests()
            .await
            .into_iter()
            .map(|r| r.id.to_string())
            .collect();
        assert!(created.contains(&"gp2".to_string()));
        assert!(!created.contains(&"aws-auth".to_string()));
    }
}
