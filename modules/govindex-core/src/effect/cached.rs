use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use super::Effect;
use crate::error::EffectError;
use crate::memo::{MemoBuilder, MemoStore};

/// Memoizes an effect by structural input equality.
///
/// In-process, each distinct input owns one `OnceCell`: concurrent callers with
/// the same input wait on the same initialization, so the inner effect runs at
/// most once per input. Underneath, the `MemoStore` carries results across
/// restarts. Failed calls leave the cell empty; the next caller retries.
pub struct Cached<E: Effect> {
    inner: E,
    memo: Arc<dyn MemoStore>,
    cells: Mutex<HashMap<E::Input, Arc<OnceCell<E::Output>>>>,
}

impl<E> Cached<E>
where
    E: Effect,
    E::Input: Eq + Hash + Clone,
{
    pub fn new(inner: E, memo: Arc<dyn MemoStore>) -> Self {
        Self {
            inner,
            memo,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Drop the cell for `input` if it is still the one this call used and no
    /// other caller has resolved it since.
    async fn forget_unresolved(&self, input: &E::Input, cell: &Arc<OnceCell<E::Output>>) {
        let mut cells = self.cells.lock().await;
        let stale = cells
            .get(input)
            .is_some_and(|current| Arc::ptr_eq(current, cell) && !current.initialized());
        if stale {
            cells.remove(input);
        }
    }

    /// Number of inputs with a resolved value in this process.
    pub async fn resolved(&self) -> usize {
        self.cells
            .lock()
            .await
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }
}

#[async_trait]
impl<E> Effect for Cached<E>
where
    E: Effect,
    E::Input: Eq + Hash + Clone + Serialize,
    E::Output: Clone + Serialize + DeserializeOwned + Sync,
{
    type Input = E::Input;
    type Output = E::Output;

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn call(&self, input: &E::Input) -> Result<E::Output, EffectError> {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(input.clone()).or_default().clone()
        };

        if let Some(value) = cell.get() {
            debug!(effect = self.name(), "Memo hit (process)");
            return Ok(value.clone());
        }

        let result = cell
            .get_or_try_init(|| {
                MemoBuilder::new(self.inner.name(), input, self.memo.as_ref())
                    .get_or(|| self.inner.call(input))
            })
            .await;

        match result {
            Ok(value) => Ok(value.clone()),
            Err(e) => {
                self.forget_unresolved(input, &cell).await;
                Err(e)
            }
        }
    }
}
