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

//! Asynchronously resolved resource outputs.
//!
//! An [`Output`] is a shared, lazily driven future plus the set of declared
//! resources it was derived from. Cloning is cheap and every clone observes
//! the same result; the underlying work runs at most once.

use super::resource::ResourceId;
use crate::shared::ResolveError;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;

/// Values that can flow through an [`Output`].
pub trait OutputValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> OutputValue for T {}

type SharedResult<T> = Shared<BoxFuture<'static, Result<T, ResolveError>>>;

pub struct Output<T: OutputValue> {
    future: SharedResult<T>,
    resources: BTreeSet<ResourceId>,
}

impl<T: OutputValue> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            future: self.future.clone(),
            resources: self.resources.clone(),
        }
    }
}

impl<T: OutputValue> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

impl<T: OutputValue> Output<T> {
    /// A value known at declaration time.
    pub fn known(value: T) -> Self {
        Self::from_future(async move { Ok(value) }, BTreeSet::new())
    }

    pub fn failed(error: ResolveError) -> Self {
        Self::from_future(async move { Err(error) }, BTreeSet::new())
    }

    pub(crate) fn from_future<F>(future: F, resources: BTreeSet<ResourceId>) -> Self
    where
        F: Future<Output = Result<T, ResolveError>> + Send + 'static,
    {
        Self {
            future: future.boxed().shared(),
            resources,
        }
    }

    /// Declared resources this value derives from.
    pub fn resources(&self) -> &BTreeSet<ResourceId> {
        &self.resources
    }

    pub fn map<U, F>(&self, f: F) -> Output<U>
    where
        U: OutputValue,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let upstream = self.future.clone();
        Output::from_future(async move { upstream.await.map(f) }, self.resources.clone())
    }

    pub fn then<U, F, Fut>(&self, f: F) -> Output<U>
    where
        U: OutputValue,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U, ResolveError>> + Send + 'static,
    {
        let upstream = self.future.clone();
        Output::from_future(
            async move {
                let value = upstream.await?;
                f(value).await
            },
            self.resources.clone(),
        )
    }

    pub fn join<U: OutputValue>(&self, other: &Output<U>) -> Output<(T, U)> {
        let left = self.future.clone();
        let right = other.future.clone();
        let mut resources = self.resources.clone();
        resources.extend(other.resources.iter().cloned());
        Output::from_future(async move { future::try_join(left, right).await }, resources)
    }

    pub fn join_all<I>(outputs: I) -> Output<Vec<T>>
    where
        I: IntoIterator<Item = Output<T>>,
    {
        let mut resources = BTreeSet::new();
        let mut futures = Vec::new();
        for output in outputs {
            resources.extend(output.resources.iter().cloned());
            futures.push(output.future);
        }
        Output::from_future(
            async move { future::try_join_all(futures).await },
            resources,
        )
    }

    /// Drop the value, keeping only the ordering edge.
    pub fn unit(&self) -> Output<()> {
        self.map(|_| ())
    }

    pub async fn resolve(&self) -> Result<T, ResolveError> {
        self.future.clone().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn tracked(value: i64, name: &str, calls: Arc<AtomicUsize>) -> Output<i64> {
        Output::from_future(
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            },
            [ResourceId::new(name)].into(),
        )
    }

    #[tokio::test]
    async fn test_map_and_join() {
        let calls = Arc::new(AtomicUsize::new(0));
        let a = tracked(2, "a", calls.clone());
        let b = tracked(3, "b", calls.clone());

        let sum = a.join(&b).map(|(x, y)| x + y);
        assert_eq!(sum.resolve().await.unwrap(), 5);
        assert_eq!(sum.resources().len(), 2);

        // Shared futures run once no matter how many derived handles await them.
        let doubled = a.map(|x| x * 2);
        assert_eq!(doubled.resolve().await.unwrap(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_join_all_and_then() {
        let outputs = vec![Output::known(1), Output::known(2), Output::known(3)];
        let total = Output::join_all(outputs).then(|values| async move {
            Ok::<_, ResolveError>(values.iter().sum::<i64>())
        });
        assert_eq!(total.resolve().await.unwrap(), 6);
        assert!(total.resources().is_empty());
    }

    #[tokio::test]
    async fn test_failure_reaches_derived_handles() {
        let broken: Output<String> = Output::failed(ResolveError::provider("vpc", "not found"));
        let derived = broken.map(|s| s.len()).join(&Output::known(1usize));
        let err = derived.resolve().await.unwrap_err();
        assert_eq!(err.origin(), "vpc");
        assert_eq!(err.message(), "not found");
    }
}
