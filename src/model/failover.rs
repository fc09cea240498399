//! Model failover client.
//!
//! Holds a pool of model names (shuffled at construction to spread load) and
//! a current index. Every call tries the model at the current index; on a
//! backend failure the client either moves on to the next model
//! ([`FailoverPolicy::Rotate`]) or drops the failed model from the pool for
//! good ([`FailoverPolicy::Evict`]), then retries. The call only fails once
//! the pool is empty.
//!
//! Pool state sits behind a mutex that is held only while picking a model or
//! recording a failure, never across the backend call, so concurrent callers
//! in the fan-out paths see a consistent pool.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ChatBackend, LanguageModel, Message};
use crate::errors::ModelError;

/// What happens to a model after it fails a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailoverPolicy {
    /// Keep the model, move the index to the next one.
    Rotate,
    /// Remove the model from the pool permanently.
    #[default]
    Evict,
}

impl std::fmt::Display for FailoverPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailoverPolicy::Rotate => write!(f, "rotate"),
            FailoverPolicy::Evict => write!(f, "evict"),
        }
    }
}

impl std::str::FromStr for FailoverPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rotate" => Ok(FailoverPolicy::Rotate),
            "evict" => Ok(FailoverPolicy::Evict),
            _ => anyhow::bail!(
                "Invalid failover policy '{}'. Valid values: rotate, evict",
                s
            ),
        }
    }
}

/// Ordered model names plus the index of the one to try next.
///
/// `index` always points at a valid entry unless `models` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    models: Vec<String>,
    index: usize,
}

impl PoolState {
    pub fn new(models: Vec<String>) -> Self {
        Self { models, index: 0 }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.models.is_empty()
    }

    /// The model to try next, `None` when exhausted.
    pub fn current(&self) -> Option<&str> {
        self.models.get(self.index).map(String::as_str)
    }

    /// Advance past `failed`, wrapping to 0.
    ///
    /// A no-op when another caller already moved the index off `failed`.
    pub fn rotate_past(&mut self, failed: &str) {
        if self.current() == Some(failed) {
            self.index = (self.index + 1) % self.models.len();
        }
    }

    /// Remove `failed` from the pool, keeping the index on the model that
    /// followed it.
    pub fn evict(&mut self, failed: &str) {
        let Some(pos) = self.models.iter().position(|m| m == failed) else {
            return;
        };
        self.models.remove(pos);
        if pos < self.index {
            self.index -= 1;
        }
        if self.index >= self.models.len() {
            self.index = 0;
        }
    }
}

/// Delay schedule applied after every full unsuccessful pass over the pool
/// under [`FailoverPolicy::Rotate`]. A zero initial delay disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn disabled() -> Self {
        Self {
            initial: Duration::ZERO,
            max: Duration::ZERO,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(1_000),
            max: Duration::from_millis(30_000),
        }
    }
}

/// [`LanguageModel`] that fails over across a pool of model names.
pub struct FailoverClient<B> {
    backend: B,
    policy: FailoverPolicy,
    backoff: Backoff,
    pool: Mutex<PoolState>,
}

impl<B: ChatBackend> FailoverClient<B> {
    /// Create a client with the pool shuffled.
    pub fn new(backend: B, models: Vec<String>) -> Self {
        let mut models = models;
        models.shuffle(&mut rand::thread_rng());
        Self::ordered(backend, models)
    }

    /// Create a client that keeps the pool in the given order.
    pub fn ordered(backend: B, models: Vec<String>) -> Self {
        Self {
            backend,
            policy: FailoverPolicy::default(),
            backoff: Backoff::default(),
            pool: Mutex::new(PoolState::new(models)),
        }
    }

    pub fn with_policy(mut self, policy: FailoverPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn policy(&self) -> FailoverPolicy {
        self.policy
    }

    /// Copy of the current pool state.
    pub fn pool_snapshot(&self) -> PoolState {
        self.lock_pool().clone()
    }

    fn lock_pool(&self) -> MutexGuard<'_, PoolState> {
        self.pool.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a failure of `model` and return the pool size afterwards.
    fn record_failure(&self, model: &str) -> usize {
        let mut pool = self.lock_pool();
        match self.policy {
            FailoverPolicy::Rotate => pool.rotate_past(model),
            FailoverPolicy::Evict => pool.evict(model),
        }
        pool.len()
    }
}

#[async_trait]
impl<B: ChatBackend> LanguageModel for FailoverClient<B> {
    async fn answer(&self, messages: &[Message]) -> Result<String, ModelError> {
        let mut attempts = 0usize;
        let mut failures_this_pass = 0usize;
        let mut delay = self.backoff.initial;

        loop {
            let next = self.lock_pool().current().map(str::to_string);
            let Some(model) = next else {
                return Err(ModelError::PoolExhausted { attempts });
            };

            match self.backend.complete(&model, messages).await {
                Ok(text) => {
                    debug!(model = %model, attempts, chars = text.len(), "Model answered");
                    return Ok(text);
                }
                Err(err) => {
                    attempts += 1;
                    let remaining = self.record_failure(&model);
                    warn!(
                        model = %model,
                        error = %err,
                        policy = %self.policy,
                        remaining,
                        "Backend call failed, failing over"
                    );

                    if self.policy == FailoverPolicy::Rotate && !delay.is_zero() {
                        failures_this_pass += 1;
                        if failures_this_pass >= remaining {
                            debug!(
                                delay_ms = delay.as_millis() as u64,
                                "Every model failed, backing off"
                            );
                            tokio::time::sleep(delay).await;
                            delay = (delay * 2).min(self.backoff.max);
                            failures_this_pass = 0;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BackendError;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Backend failing for a fixed set of model names and recording every try.
    #[derive(Default)]
    struct FlakyBackend {
        failing: HashSet<String>,
        fail_first: Mutex<usize>,
        tried: Mutex<Vec<String>>,
    }

    impl FlakyBackend {
        fn failing(models: &[&str]) -> Self {
            Self {
                failing: models.iter().map(|m| m.to_string()).collect(),
                ..Default::default()
            }
        }

        fn fail_first(n: usize) -> Self {
            Self {
                fail_first: Mutex::new(n),
                ..Default::default()
            }
        }

        fn tried(&self) -> Vec<String> {
            self.tried.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for FlakyBackend {
        async fn complete(
            &self,
            model: &str,
            _messages: &[Message],
        ) -> Result<String, BackendError> {
            self.tried.lock().unwrap().push(model.to_string());
            {
                let mut remaining = self.fail_first.lock().unwrap();
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(BackendError::EmptyCompletion);
                }
            }
            if self.failing.contains(model) {
                return Err(BackendError::Status {
                    status: 503,
                    body: "down".to_string(),
                });
            }
            Ok(format!("answer from {}", model))
        }
    }

    fn names(models: &[&str]) -> Vec<String> {
        models.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("rotate".parse::<FailoverPolicy>().unwrap(), FailoverPolicy::Rotate);
        assert_eq!("EVICT".parse::<FailoverPolicy>().unwrap(), FailoverPolicy::Evict);
        assert!("random".parse::<FailoverPolicy>().is_err());
        assert_eq!(FailoverPolicy::Rotate.to_string(), "rotate");
    }

    #[test]
    fn test_pool_rotate_wraps() {
        let mut pool = PoolState::new(names(&["a", "b", "c"]));
        pool.rotate_past("a");
        pool.rotate_past("b");
        pool.rotate_past("c");
        assert_eq!(pool.current(), Some("a"));
    }

    #[test]
    fn test_pool_rotate_ignores_stale_failure() {
        let mut pool = PoolState::new(names(&["a", "b"]));
        pool.rotate_past("a");
        pool.rotate_past("a");
        assert_eq!(pool.current(), Some("b"));
    }

    #[test]
    fn test_pool_evict_keeps_index_valid() {
        let mut pool = PoolState::new(names(&["a", "b", "c"]));
        pool.rotate_past("a");
        pool.rotate_past("b");
        assert_eq!(pool.current(), Some("c"));
        pool.evict("c");
        assert_eq!(pool.current(), Some("a"));
        pool.evict("a");
        assert_eq!(pool.current(), Some("b"));
        pool.evict("b");
        assert!(pool.is_exhausted());
        assert_eq!(pool.current(), None);
    }

    #[test]
    fn test_pool_evict_before_index_shifts_index() {
        let mut pool = PoolState::new(names(&["a", "b", "c"]));
        pool.rotate_past("a");
        pool.rotate_past("b");
        pool.evict("a");
        assert_eq!(pool.current(), Some("c"));
        assert_eq!(pool.index(), 1);
    }

    #[test]
    fn test_new_shuffles_but_keeps_members() {
        let models = names(&["a", "b", "c", "d", "e"]);
        let client = FailoverClient::new(FlakyBackend::default(), models.clone());
        let mut pooled = client.pool_snapshot().models().to_vec();
        pooled.sort();
        assert_eq!(pooled, models);
    }

    #[tokio::test]
    async fn test_answer_uses_current_model() {
        let client = FailoverClient::ordered(FlakyBackend::default(), names(&["a", "b"]));
        let answer = client.answer(&[Message::user("q")]).await.unwrap();
        assert_eq!(answer, "answer from a");
    }

    #[tokio::test]
    async fn test_evict_exhausts_after_pool_size_failures() {
        let backend = FlakyBackend::failing(&["a", "b", "c"]);
        let client = FailoverClient::ordered(backend, names(&["a", "b", "c"]))
            .with_policy(FailoverPolicy::Evict);

        let err = client.answer(&[Message::user("q")]).await.unwrap_err();
        assert!(matches!(err, ModelError::PoolExhausted { attempts: 3 }));
        assert!(client.pool_snapshot().is_exhausted());
        assert_eq!(client.backend.tried(), names(&["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_empty_pool_is_exhausted_immediately() {
        let client = FailoverClient::ordered(FlakyBackend::default(), Vec::new());
        let err = client.answer(&[Message::user("q")]).await.unwrap_err();
        assert!(matches!(err, ModelError::PoolExhausted { attempts: 0 }));
    }

    #[tokio::test]
    async fn test_evict_skips_failed_model_on_later_calls() {
        let backend = FlakyBackend::failing(&["a"]);
        let client = FailoverClient::ordered(backend, names(&["a", "b"]))
            .with_policy(FailoverPolicy::Evict);

        assert_eq!(client.answer(&[]).await.unwrap(), "answer from b");
        assert_eq!(client.answer(&[]).await.unwrap(), "answer from b");
        assert_eq!(client.backend.tried(), names(&["a", "b", "b"]));
        assert_eq!(client.pool_snapshot().models(), &names(&["b"])[..]);
    }

    #[tokio::test]
    async fn test_rotate_keeps_failed_models_in_pool() {
        let backend = FlakyBackend::fail_first(4);
        let client = FailoverClient::ordered(backend, names(&["a", "b", "c"]))
            .with_policy(FailoverPolicy::Rotate)
            .with_backoff(Backoff::disabled());

        let answer = client.answer(&[]).await.unwrap();
        assert_eq!(answer, "answer from b");
        assert_eq!(client.backend.tried(), names(&["a", "b", "c", "a", "b"]));
        assert_eq!(client.pool_snapshot().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotate_backs_off_after_full_pass() {
        let backend = FlakyBackend::fail_first(2);
        let client = FailoverClient::ordered(backend, names(&["a", "b"]))
            .with_policy(FailoverPolicy::Rotate)
            .with_backoff(Backoff {
                initial: Duration::from_secs(5),
                max: Duration::from_secs(60),
            });

        let start = tokio::time::Instant::now();
        let answer = client.answer(&[]).await.unwrap();
        assert_eq!(answer, "answer from a");
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    /// Backend failing its first `n` calls and recording when each call arrived.
    struct TimedBackend {
        fail_first: Mutex<usize>,
        calls: Mutex<Vec<tokio::time::Instant>>,
    }

    #[async_trait]
    impl ChatBackend for TimedBackend {
        async fn complete(
            &self,
            _model: &str,
            _messages: &[Message],
        ) -> Result<String, BackendError> {
            self.calls.lock().unwrap().push(tokio::time::Instant::now());
            let mut remaining = self.fail_first.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BackendError::EmptyCompletion);
            }
            Ok("ok".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotate_backoff_doubles_up_to_cap() {
        let backend = TimedBackend {
            fail_first: Mutex::new(6),
            calls: Mutex::new(Vec::new()),
        };
        let client = FailoverClient::ordered(backend, names(&["only"]))
            .with_policy(FailoverPolicy::Rotate)
            .with_backoff(Backoff {
                initial: Duration::from_secs(5),
                max: Duration::from_secs(30),
            });

        assert_eq!(client.answer(&[]).await.unwrap(), "ok");

        let calls = client.backend.calls.lock().unwrap().clone();
        let gaps: Vec<u64> = calls.windows(2).map(|w| (w[1] - w[0]).as_secs()).collect();
        assert_eq!(gaps, vec![5, 10, 20, 30, 30, 30]);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_evicted_pool() {
        let backend = FlakyBackend::failing(&["a"]);
        let client = Arc::new(
            FailoverClient::ordered(backend, names(&["a", "b", "c"]))
                .with_policy(FailoverPolicy::Evict),
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move { client.answer(&[]).await }));
        }
        for handle in handles {
            let answer = handle.await.unwrap().unwrap();
            assert_ne!(answer, "answer from a");
        }
        let pool = client.pool_snapshot();
        assert!(!pool.models().contains(&"a".to_string()));
        assert!(pool.current().is_some());
    }
}
