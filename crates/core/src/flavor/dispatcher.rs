//! Background flavor generation on tokio.
//!
//! Requests run as independent tasks capped by a semaphore. Each one is bounded by a
//! timeout and falls back to authored text on timeout or error. Finished text queues on
//! a channel until the owner drains it into a [`FlavorCache`]; nothing here ever blocks a tick.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{FlavorCache, FlavorKey, FlavorRequest, fallback_for};
use crate::config::SimConfig;
use crate::error::FlavorError;

/// Anything that can turn a prompt into a line of text, such as a local language model.
#[async_trait]
pub trait FlavorSource: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, FlavorError>;
}

pub struct FlavorDispatcher {
    source: Arc<dyn FlavorSource>,
    permits: Arc<Semaphore>,
    limit: Duration,
    tasks: JoinSet<()>,
    sender: mpsc::UnboundedSender<(FlavorKey, String)>,
    receiver: mpsc::UnboundedReceiver<(FlavorKey, String)>,
}

impl FlavorDispatcher {
    pub fn new(source: Arc<dyn FlavorSource>, config: &SimConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            source,
            permits: Arc::new(Semaphore::new(config.flavor_max_in_flight)),
            limit: config.flavor_timeout(),
            tasks: JoinSet::new(),
            sender,
            receiver,
        }
    }

    /// Starts a request on the current tokio runtime. Returns false, dropping the request,
    /// when the in-flight cap is already reached; the caller keeps showing fallback text.
    pub fn dispatch(&mut self, request: FlavorRequest) -> bool {
        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            debug!(key = ?request.key, "flavor cap reached; request dropped");
            return false;
        };
        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        let limit = self.limit;
        self.tasks.spawn(async move {
            let _permit = permit;
            let outcome = match timeout(limit, source.generate(&request.prompt)).await {
                Ok(result) => result,
                Err(_) => Err(FlavorError::Timeout),
            };
            let text = outcome.unwrap_or_else(|error| {
                warn!(key = ?request.key, %error, "flavor request failed; using fallback");
                fallback_for(&request.key).to_owned()
            });
            // The receiver only disappears with the dispatcher, which aborts this task anyway.
            let _ = sender.send((request.key, text));
        });
        true
    }

    /// Moves every finished result into `cache` without waiting. Returns how many arrived.
    pub fn drain_into(&mut self, cache: &mut FlavorCache) -> usize {
        while self.tasks.try_join_next().is_some() {}
        let mut arrived = 0;
        while let Ok((key, text)) = self.receiver.try_recv() {
            cache.insert(key, text);
            arrived += 1;
        }
        arrived
    }

    /// Requests started and not yet collected.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for every outstanding request. Meant for shutdown paths and tests.
    pub async fn settle(&mut self) {
        while self.tasks.join_next().await.is_some() {}
    }
}
