//! Test doubles for [`LanguageModel`].
//!
//! `ScriptedModel` answers from a closure, records every request, and tracks
//! how many calls were in flight at once so fan-out limits can be asserted.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{LanguageModel, Message};
use crate::errors::{BackendError, ModelError};

type Responder = Box<dyn Fn(usize, &[Message]) -> Result<String, ModelError> + Send + Sync>;

/// Scripted [`LanguageModel`] for tests.
pub struct ScriptedModel {
    responder: Responder,
    delay: Option<Duration>,
    calls: Mutex<Vec<Vec<Message>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedModel {
    /// Answer with `f(call_index, messages)`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(usize, &[Message]) -> Result<String, ModelError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(f),
            delay: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Always answer with the same text.
    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_, _| Ok(text.clone()))
    }

    /// Answer with the given texts in order, then fail.
    pub fn sequence(answers: Vec<String>) -> Self {
        Self::new(move |i, _| {
            answers.get(i).cloned().ok_or(ModelError::PoolExhausted { attempts: i })
        })
    }

    /// Answer with the last user message, prefixed by the call index.
    pub fn echo() -> Self {
        Self::new(|i, messages| {
            let user = messages
                .iter()
                .rev()
                .find(|m| m.role == super::Role::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(format!("[{}] {}", i, user))
        })
    }

    /// Fail every call with a backend error.
    pub fn failing() -> Self {
        Self::new(|_, _| {
            Err(ModelError::Backend {
                model: "scripted".to_string(),
                source: BackendError::EmptyCompletion,
            })
        })
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Highest number of concurrently running calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn answer(&self, messages: &[Message]) -> Result<String, ModelError> {
        let index = {
            let mut calls = self.calls.lock().unwrap_or_else(|p| p.into_inner());
            calls.push(messages.to_vec());
            calls.len() - 1
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = (self.responder)(index, messages);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
