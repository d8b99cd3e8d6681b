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

//! Boundary to the provisioning engine.

pub mod dry_run;
pub mod output;
pub mod resource;
pub mod retry;
pub mod stack;

use crate::shared::EngineError;
use serde_json::Value;

pub use dry_run::DryRunEngine;
pub use output::{Output, OutputValue};
pub use resource::{Declaration, DeclarationGraph, ResourceId, ResourceKind, ResourceRequest};
pub use retry::RetryingEngine;
pub use stack::Stack;

/// Performs create calls against cloud and cluster APIs.
///
/// Implementations own idempotence and state tracking; the orchestrator only
/// hands over fully resolved inputs and reads back the resource outputs.
#[async_trait::async_trait]
pub trait ProvisioningEngine: Send + Sync {
    async fn create(&self, request: &ResourceRequest) -> Result<Value, EngineError>;
}
