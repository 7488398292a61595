//! Job broker adapter port (spec.md §4.4)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quorum_domain::{Priority, RunId, RunType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
    #[error("ack failed: {0}")]
    AckFailed(String),
    #[error("nack failed: {0}")]
    NackFailed(String),
    #[error("connection error: {0}")]
    Connection(String),
}

/// The authoritative work reference published for every pipeline job. All
/// other data is fetched from the store by `run_id` (spec.md §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub run_id: RunId,
    pub run_type: RunType,
    pub parent_run_id: Option<RunId>,
    pub priority: Priority,
    pub enqueued_at: DateTime<Utc>,
}

/// One delivered message. Ack only after the handler completes successfully;
/// nack on any failure so the broker's own redelivery/DLQ policy applies.
#[async_trait]
pub trait Delivery: Send {
    fn envelope(&self) -> &JobEnvelope;

    /// How many times this message has previously been delivered (including
    /// this delivery). Used to distinguish a first attempt from a
    /// broker-signalled retry in the worker's claim protocol.
    fn delivery_count(&self) -> u32;

    async fn ack(self: Box<Self>) -> Result<(), BrokerError>;
    async fn nack(self: Box<Self>) -> Result<(), BrokerError>;
}

/// Abstract publish/subscribe operations over a concrete pub/sub substrate.
#[async_trait]
pub trait JobBroker: Send + Sync {
    async fn publish(&self, envelope: &JobEnvelope) -> Result<(), BrokerError>;

    /// Pull up to `max_messages` deliveries, each carrying its own
    /// `ack_deadline_seconds` lease with the broker.
    async fn receive(
        &self,
        max_messages: usize,
        ack_deadline_seconds: u64,
    ) -> Result<Vec<Box<dyn Delivery>>, BrokerError>;
}
