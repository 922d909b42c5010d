use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use tokio::sync::{oneshot, Mutex};

use crate::config::BackendConfig;
use crate::error::ExecutionError;
use crate::operation::OperationRequest;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type Outcome = Result<ConstValue, ExecutionError>;

/// Receives constructed operation requests and produces their results.
pub trait ExecutionBackend: Send + Sync {
    fn execute(&self, request: OperationRequest) -> BoxFuture<'static, Outcome>;
}

type BatchFn = Arc<dyn Fn(Vec<OperationRequest>) -> BoxFuture<'static, Vec<Outcome>> + Send + Sync>;

struct PendingBatch {
    requests: Vec<(OperationRequest, oneshot::Sender<Outcome>)>,
    scheduled: bool,
}

impl Default for PendingBatch {
    fn default() -> Self {
        Self {
            requests: Vec::new(),
            scheduled: false,
        }
    }
}

/// Backend that routes requests to handlers by operation tag.
#[derive(Clone)]
pub struct TaggedBackend {
    delay: Duration,
    handlers: Arc<HashMap<String, BatchFn>>,
    pending: Arc<Mutex<PendingBatch>>,
}

impl TaggedBackend {
    pub fn new(config: &BackendConfig) -> Self {
        Self::with_delay(config.batch_delay())
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            handlers: Arc::new(HashMap::new()),
            pending: Arc::new(Mutex::new(PendingBatch::default())),
        }
    }

    pub fn with_delay_ms(delay_ms: u64) -> Self {
        Self::with_delay(Duration::from_millis(delay_ms))
    }

    pub fn handler<F, Fut>(self, tag: impl Into<String>, f: F) -> Self
    where
        F: Fn(OperationRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let f = Arc::new(f);
        self.batch_handler(tag, move |requests: Vec<OperationRequest>| {
            let futures: Vec<_> = requests.into_iter().map(|request| f(request)).collect();
            futures::future::join_all(futures)
        })
    }

    /// Registers a handler receiving every distinct request of one window at
    /// once. It must return one outcome per request, in order.
    pub fn batch_handler<F, Fut>(mut self, tag: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<OperationRequest>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<Outcome>> + Send + 'static,
    {
        let batch: BatchFn = Arc::new(move |requests| Box::pin(f(requests)));
        Arc::make_mut(&mut self.handlers).insert(tag.into(), batch);
        self
    }

    pub async fn load(&self, request: OperationRequest) -> Outcome {
        let tag = request.tag.clone();
        let (tx, rx) = oneshot::channel();

        let should_spawn = {
            let mut pending = self.pending.lock().await;
            pending.requests.push((request, tx));

            if !pending.scheduled {
                pending.scheduled = true;
                true
            } else {
                false
            }
        };

        if should_spawn {
            let pending = self.pending.clone();
            let handlers = self.handlers.clone();
            let delay = self.delay;

            tokio::spawn(async move {
                tokio::time::sleep(delay).await;

                let batch = {
                    let mut p = pending.lock().await;
                    std::mem::take(&mut *p)
                };

                if batch.requests.is_empty() {
                    return;
                }

                dispatch(&handlers, batch.requests).await;
            });
        }

        rx.await.unwrap_or(Err(ExecutionError::Dropped { tag }))
    }
}

impl ExecutionBackend for TaggedBackend {
    fn execute(&self, request: OperationRequest) -> BoxFuture<'static, Outcome> {
        let backend = self.clone();
        Box::pin(async move { backend.load(request).await })
    }
}

struct Waiting {
    request: OperationRequest,
    senders: Vec<oneshot::Sender<Outcome>>,
}

async fn dispatch(
    handlers: &HashMap<String, BatchFn>,
    requests: Vec<(OperationRequest, oneshot::Sender<Outcome>)>,
) {
    let mut by_tag: IndexMap<String, IndexMap<String, Waiting>> = IndexMap::new();
    for (request, tx) in requests {
        let waiting = by_tag
            .entry(request.tag.clone())
            .or_default()
            .entry(request.key())
            .or_insert_with(|| Waiting {
                request,
                senders: Vec::new(),
            });
        waiting.senders.push(tx);
    }

    let runs = by_tag.into_iter().map(|(tag, waiting)| {
        let handler = handlers.get(&tag).cloned();
        async move {
            let Some(handler) = handler else {
                tracing::warn!(tag = %tag, "no handler registered for operation");
                for w in waiting.into_values() {
                    fan_out(w.senders, Err(ExecutionError::UnknownOperation { tag: tag.clone() }));
                }
                return;
            };

            let waiting: Vec<Waiting> = waiting.into_values().collect();
            tracing::debug!(tag = %tag, requests = waiting.len(), "dispatching operation batch");

            let batch = waiting.iter().map(|w| w.request.clone()).collect();
            let outcomes = handler(batch).await;

            if outcomes.len() != waiting.len() {
                let expected = waiting.len();
                let actual = outcomes.len();
                for w in waiting {
                    fan_out(
                        w.senders,
                        Err(ExecutionError::BatchMismatch {
                            tag: tag.clone(),
                            expected,
                            actual,
                        }),
                    );
                }
                return;
            }

            for (w, outcome) in waiting.into_iter().zip(outcomes) {
                fan_out(w.senders, outcome);
            }
        }
    });

    futures::future::join_all(runs).await;
}

fn fan_out(senders: Vec<oneshot::Sender<Outcome>>, outcome: Outcome) {
    for tx in senders {
        let _ = tx.send(outcome.clone());
    }
}
