use std::sync::Arc;

use async_trait::async_trait;

use super::Effect;
use crate::error::EffectError;
use crate::rate_limit::RateLimiter;

/// Takes a limiter permit before every inner call.
pub struct RateLimited<E> {
    inner: E,
    limiter: Arc<RateLimiter>,
}

impl<E: Effect> RateLimited<E> {
    pub fn new(inner: E, limiter: Arc<RateLimiter>) -> Self {
        Self { inner, limiter }
    }
}

#[async_trait]
impl<E: Effect> Effect for RateLimited<E> {
    type Input = E::Input;
    type Output = E::Output;

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn call(&self, input: &E::Input) -> Result<E::Output, EffectError> {
        self.limiter.acquire().await;
        self.inner.call(input).await
    }
}
