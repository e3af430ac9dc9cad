//! Write operations with success/error policies.
//!
//! A [`Mutation`] wraps one write function. Each call to [`Mutation::mutate`]
//! resets the record, runs the write once (no retries) and then runs the
//! attached callbacks, typically an invalidation of the affected keys.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::api::TransportError;
use crate::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct MutationRecord<O> {
    pub status: MutationStatus,
    pub data: Option<O>,
    pub error: Option<QueryError>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl<O> Default for MutationRecord<O> {
    fn default() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
            submitted_at: None,
        }
    }
}

impl<O> MutationRecord<O> {
    pub fn is_idle(&self) -> bool {
        self.status == MutationStatus::Idle
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == MutationStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == MutationStatus::Error
    }
}

type MutateFn<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<O, TransportError>> + Send + Sync>;
type SuccessFn<I, O> = Arc<dyn Fn(&O, &I) + Send + Sync>;
type ErrorFn<I> = Arc<dyn Fn(&QueryError, &I) + Send + Sync>;
type SettledFn<I, O> = Arc<dyn Fn(Result<&O, &QueryError>, &I) + Send + Sync>;

pub struct Mutation<I, O> {
    name: &'static str,
    mutate_fn: MutateFn<I, O>,
    on_success: Vec<SuccessFn<I, O>>,
    on_error: Vec<ErrorFn<I>>,
    on_settled: Vec<SettledFn<I, O>>,
    record: Arc<Mutex<MutationRecord<O>>>,
    generation: Arc<AtomicU64>,
}

impl<I, O> Clone for Mutation<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            mutate_fn: Arc::clone(&self.mutate_fn),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
            on_settled: self.on_settled.clone(),
            record: Arc::clone(&self.record),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<I, O> Mutation<I, O>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
{
    pub fn new<F, Fut>(name: &'static str, mutate_fn: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, TransportError>> + Send + 'static,
    {
        Self {
            name,
            mutate_fn: Arc::new(move |input| mutate_fn(input).boxed()),
            on_success: Vec::new(),
            on_error: Vec::new(),
            on_settled: Vec::new(),
            record: Arc::new(Mutex::new(MutationRecord::default())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn on_success(mut self, callback: impl Fn(&O, &I) + Send + Sync + 'static) -> Self {
        self.on_success.push(Arc::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&QueryError, &I) + Send + Sync + 'static) -> Self {
        self.on_error.push(Arc::new(callback));
        self
    }

    pub fn on_settled(
        mut self,
        callback: impl Fn(Result<&O, &QueryError>, &I) + Send + Sync + 'static,
    ) -> Self {
        self.on_settled.push(Arc::new(callback));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current record (of the most recent invocation).
    pub fn state(&self) -> MutationRecord<O> {
        self.record.lock().clone()
    }

    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.record.lock() = MutationRecord::default();
    }

    /// Run the write once. Callbacks run for every invocation; only the most
    /// recent invocation updates the shared record.
    pub async fn mutate(&self, input: I) -> MutationRecord<O> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let submitted_at = Utc::now();
        *self.record.lock() = MutationRecord {
            status: MutationStatus::Pending,
            data: None,
            error: None,
            submitted_at: Some(submitted_at),
        };
        debug!(mutation = self.name, generation, "Mutation started");

        let result = (self.mutate_fn)(input.clone()).await.map_err(QueryError::from);

        let outcome = match result {
            Ok(data) => {
                debug!(mutation = self.name, generation, "Mutation succeeded");
                for callback in &self.on_success {
                    callback(&data, &input);
                }
                for callback in &self.on_settled {
                    callback(Ok(&data), &input);
                }
                MutationRecord {
                    status: MutationStatus::Success,
                    data: Some(data),
                    error: None,
                    submitted_at: Some(submitted_at),
                }
            }
            Err(error) => {
                warn!(mutation = self.name, generation, error = %error, "Mutation failed");
                for callback in &self.on_error {
                    callback(&error, &input);
                }
                for callback in &self.on_settled {
                    callback(Err(&error), &input);
                }
                MutationRecord {
                    status: MutationStatus::Error,
                    data: None,
                    error: Some(error),
                    submitted_at: Some(submitted_at),
                }
            }
        };

        if self.generation.load(Ordering::SeqCst) == generation {
            *self.record.lock() = outcome.clone();
        } else {
            debug!(mutation = self.name, generation, "Newer invocation owns the record");
        }
        outcome
    }
}

impl<I, O> std::fmt::Debug for Mutation<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutation")
            .field("name", &self.name)
            .field("status", &self.record.lock().status)
            .finish()
    }
}
