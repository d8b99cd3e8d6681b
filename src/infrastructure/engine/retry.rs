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

use super::resource::ResourceRequest;
use super::ProvisioningEngine;
use crate::shared::EngineError;
use backon::{BackoffBuilder, ExponentialBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Retries transient engine failures with exponential backoff.
///
/// Permanent failures are returned on the first attempt.
pub struct RetryingEngine {
    inner: Arc<dyn ProvisioningEngine>,
    backoff: ExponentialBuilder,
}

impl RetryingEngine {
    pub fn new(inner: Arc<dyn ProvisioningEngine>) -> Self {
        Self {
            inner,
            backoff: ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(500))
                .with_max_delay(Duration::from_secs(30))
                .with_max_times(5),
        }
    }

    pub fn with_backoff(mut self, backoff: ExponentialBuilder) -> Self {
        self.backoff = backoff;
        self
    }
}

#[async_trait::async_trait]
impl ProvisioningEngine for RetryingEngine {
    async fn create(&self, request: &ResourceRequest) -> Result<Value, EngineError> {
        let mut delays = self.backoff.clone().build();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.inner.create(request).await {
                Ok(outputs) => return Ok(outputs),
                Err(err) if err.transient => match delays.next() {
                    Some(delay) => {
                        warn!(
                            resource = %request.id,
                            attempt = attempt,
                            error = %err,
                            delay_ms = delay.as_millis() as u64,
                            "transient create failure, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        error!(
                            resource = %request.id,
                            attempt = attempt,
                            error = %err,
                            "create failed after max retries"
                        );
                        return Err(err);
                    }
                },
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::engine::{ResourceId, ResourceKind};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyEngine {
        calls: AtomicU32,
        failures: u32,
        transient: bool,
    }

    #[async_trait::async_trait]
    impl ProvisioningEngine for FlakyEngine {
        async fn create(&self, _request: &ResourceRequest) -> Result<Value, EngineError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(EngineError {
                    message: "throttled".into(),
                    transient: self.transient,
                });
            }
            Ok(json!({ "ok": true }))
        }
    }

    fn fast() -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
            .with_max_times(3)
    }

    fn request() -> ResourceRequest {
        ResourceRequest {
            id: ResourceId::new("demo-eksCluster"),
            kind: ResourceKind::EksCluster,
            inputs: json!({}),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let inner = Arc::new(FlakyEngine {
            calls: AtomicU32::new(0),
            failures: 2,
            transient: true,
        });
        let engine = RetryingEngine::new(inner.clone()).with_backoff(fast());
        assert_eq!(engine.create(&request()).await.unwrap()["ok"], true);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_times() {
        let inner = Arc::new(FlakyEngine {
            calls: AtomicU32::new(0),
            failures: 10,
            transient: true,
        });
        let engine = RetryingEngine::new(inner.clone()).with_backoff(fast());
        assert!(engine.create(&request()).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_permanent_failures_are_not_retried() {
        let inner = Arc::new(FlakyEngine {
            calls: AtomicU32::new(0),
            failures: 1,
            transient: false,
        });
        let engine = RetryingEngine::new(inner.clone()).with_backoff(fast());
        assert_eq!(engine.create(&request()).await.unwrap_err().message, "throttled");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
