use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use regionhub_core::{DomainError, RegionId};
use regionhub_messaging::{MessageEnvelope, Subscription};
use regionhub_region::RegionCreateMessage;

use crate::cache::CacheStore;
use crate::region_service::{RegionService, RegionServiceError};
use crate::store::RegionStore;

/// Why a queued create request was not applied.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("undecodable message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid create request: {0}")]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Service(#[from] RegionServiceError),
}

/// Handle to control and join a background worker.
///
/// Dropping the handle cancels the worker without waiting for it.
#[derive(Debug)]
pub struct WorkerHandle {
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(|j| j.is_finished())
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// In-process consumer for region create requests.
///
/// - Reads envelopes from an in-memory subscription
/// - Re-validates and inserts through `RegionService::create`
/// - Failures (duplicates included) are logged and the message is dropped
#[derive(Debug)]
pub struct RegionCreateWorker;

impl RegionCreateWorker {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// The worker stops when `cancel` fires or every sender of the
    /// subscription's channel is gone.
    pub fn spawn<S, C>(
        name: &'static str,
        subscription: Subscription,
        service: Arc<RegionService<S, C>>,
        cancel: CancellationToken,
    ) -> WorkerHandle
    where
        S: RegionStore + 'static,
        C: CacheStore + 'static,
    {
        let token = cancel.clone();
        let join = tokio::spawn(worker_loop(name, subscription, service, token));

        WorkerHandle {
            cancel,
            join: Some(join),
        }
    }

    /// Apply one queued message body.
    pub async fn handle_message<S, C>(
        service: &RegionService<S, C>,
        body: &str,
    ) -> Result<RegionId, WorkerError>
    where
        S: RegionStore,
        C: CacheStore,
    {
        let envelope: MessageEnvelope<RegionCreateMessage> = MessageEnvelope::decode(body)?;
        let request = envelope.into_payload();
        let region = RegionCreateMessage::new(&request.code, &request.name)?.into_region()?;
        let id = region.id_typed();

        service.create(region).await?;
        Ok(id)
    }
}

async fn worker_loop<S, C>(
    name: &'static str,
    mut subscription: Subscription,
    service: Arc<RegionService<S, C>>,
    cancel: CancellationToken,
) where
    S: RegionStore,
    C: CacheStore,
{
    info!(worker = name, channel = subscription.channel(), "worker started");

    loop {
        let body = tokio::select! {
            _ = cancel.cancelled() => break,
            next = subscription.recv() => match next {
                Some(body) => body,
                None => break,
            },
        };

        match RegionCreateWorker::handle_message(&service, &body).await {
            Ok(id) => debug!(worker = name, region_id = %id, "region created"),
            Err(WorkerError::Service(RegionServiceError::AlreadyExists)) => {
                warn!(worker = name, "create request dropped: code already taken");
            }
            Err(err) => warn!(worker = name, error = %err, "create request failed"),
        }
    }

    info!(worker = name, "worker stopped");
}
