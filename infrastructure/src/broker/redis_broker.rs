//! Redis Streams-backed [`JobBroker`] (spec.md §4.4, SPEC_FULL §4.4).
//!
//! One stream per topic, one consumer group per worker deployment. A
//! delivery's `ack` is an `XACK`; its `nack` leaves the entry in the
//! group's pending entries list so another consumer's `XCLAIM` picks it up
//! after the idle deadline, unless it has already exceeded
//! `max_redeliveries`, in which case it is moved to the `<topic>.dlq`
//! stream and acked off the live one.

use async_trait::async_trait;
use quorum_application::ports::job_broker::{BrokerError, Delivery, JobBroker, JobEnvelope};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{info, warn};

const PAYLOAD_FIELD: &str = "envelope";

pub struct RedisJobBroker {
    conn: ConnectionManager,
    stream_key: String,
    group: String,
    consumer: String,
    max_redeliveries: u32,
}

impl RedisJobBroker {
    /// Connects and ensures the consumer group exists, creating the stream
    /// if needed (`MKSTREAM`). `BUSYGROUP` (group already exists) is not an
    /// error.
    pub async fn connect(
        redis_url: &str,
        stream_key: String,
        group: String,
        consumer: String,
        max_redeliveries: u32,
    ) -> Result<Self, BrokerError> {
        let client = redis::Client::open(redis_url).map_err(|e| BrokerError::Connection(e.to_string()))?;
        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        let created: Result<(), redis::RedisError> = conn
            .xgroup_create_mkstream(&stream_key, &group, "0")
            .await;
        if let Err(e) = created {
            if !e.to_string().contains("BUSYGROUP") {
                return Err(BrokerError::Connection(e.to_string()));
            }
        }

        Ok(Self {
            conn,
            stream_key,
            group,
            consumer,
            max_redeliveries,
        })
    }

    fn dlq_key(&self) -> String {
        format!("{}.dlq", self.stream_key)
    }

    async fn delivery_count(&self, id: &str) -> Result<u32, BrokerError> {
        let reply: redis::Value = redis::cmd("XPENDING")
            .arg(&self.stream_key)
            .arg(&self.group)
            .arg(id)
            .arg(id)
            .arg(1)
            .query_async(&mut self.conn.clone())
            .await
            .map_err(|e| BrokerError::ReceiveFailed(e.to_string()))?;

        let entries: Vec<redis::Value> = redis::from_redis_value(&reply).unwrap_or_default();
        for entry in entries {
            if let redis::Value::Array(fields) = entry {
                if fields.len() >= 4 {
                    if let Ok(count) = redis::from_redis_value::<i64>(&fields[3]) {
                        return Ok(count.max(1) as u32);
                    }
                }
            }
        }
        Ok(1)
    }
}

#[async_trait]
impl JobBroker for RedisJobBroker {
    async fn publish(&self, envelope: &JobEnvelope) -> Result<(), BrokerError> {
        let payload = serde_json::to_string(envelope)
            .map_err(|e| BrokerError::PublishFailed(format!("failed to serialize envelope: {e}")))?;

        let mut conn = self.conn.clone();
        let _id: String = conn
            .xadd(&self.stream_key, "*", &[(PAYLOAD_FIELD, payload)])
            .await
            .map_err(|e| BrokerError::PublishFailed(e.to_string()))?;
        Ok(())
    }

    async fn receive(
        &self,
        max_messages: usize,
        ack_deadline_seconds: u64,
    ) -> Result<Vec<Box<dyn Delivery>>, BrokerError> {
        let opts = redis::streams::StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .count(max_messages);

        let mut conn = self.conn.clone();
        let reply: redis::streams::StreamReadReply = conn
            .xread_options(&[&self.stream_key], &[">"], &opts)
            .await
            .map_err(|e| BrokerError::ReceiveFailed(e.to_string()))?;

        let mut deliveries = Vec::new();
        for stream_key in reply.keys {
            for entry in stream_key.ids {
                let Some(raw) = entry.map.get(PAYLOAD_FIELD) else {
                    warn!(stream_id = %entry.id, "stream entry missing envelope field, skipping");
                    continue;
                };
                let payload: String = match redis::from_redis_value(raw) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(stream_id = %entry.id, error = %e, "could not decode envelope field");
                        continue;
                    }
                };
                let envelope: JobEnvelope = match serde_json::from_str(&payload) {
                    Ok(e) => e,
                    Err(e) => {
                        warn!(stream_id = %entry.id, error = %e, "could not deserialize envelope");
                        continue;
                    }
                };
                let delivery_count = self.delivery_count(&entry.id).await.unwrap_or(1);

                deliveries.push(Box::new(RedisDelivery {
                    conn: self.conn.clone(),
                    stream_key: self.stream_key.clone(),
                    dlq_key: self.dlq_key(),
                    group: self.group.clone(),
                    stream_id: entry.id,
                    envelope,
                    delivery_count,
                    max_redeliveries: self.max_redeliveries,
                    ack_deadline_seconds,
                }) as Box<dyn Delivery>);
            }
        }
        Ok(deliveries)
    }
}

struct RedisDelivery {
    conn: ConnectionManager,
    stream_key: String,
    dlq_key: String,
    group: String,
    stream_id: String,
    envelope: JobEnvelope,
    delivery_count: u32,
    max_redeliveries: u32,
    #[allow(dead_code)]
    ack_deadline_seconds: u64,
}

#[async_trait]
impl Delivery for RedisDelivery {
    fn envelope(&self) -> &JobEnvelope {
        &self.envelope
    }

    fn delivery_count(&self) -> u32 {
        self.delivery_count
    }

    async fn ack(self: Box<Self>) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn
            .xack(&self.stream_key, &self.group, &[self.stream_id.clone()])
            .await
            .map_err(|e| BrokerError::AckFailed(e.to_string()))?;
        Ok(())
    }

    async fn nack(self: Box<Self>) -> Result<(), BrokerError> {
        if self.delivery_count < self.max_redeliveries {
            // Leave the entry pending; another consumer's XCLAIM sweep will
            // pick it up once its idle time passes the ack deadline.
            return Ok(());
        }

        let payload = serde_json::to_string(&self.envelope)
            .map_err(|e| BrokerError::NackFailed(format!("failed to serialize envelope for DLQ: {e}")))?;
        let mut conn = self.conn.clone();
        let _id: String = conn
            .xadd(&self.dlq_key, "*", &[(PAYLOAD_FIELD, payload)])
            .await
            .map_err(|e| BrokerError::NackFailed(e.to_string()))?;

        info!(
            stream_id = %self.stream_id,
            run_id = %self.envelope.run_id,
            delivery_count = self.delivery_count,
            "moved message to DLQ after exhausting redeliveries"
        );

        let _: i64 = conn
            .xack(&self.stream_key, &self.group, &[self.stream_id.clone()])
            .await
            .map_err(|e| BrokerError::NackFailed(e.to_string()))?;
        Ok(())
    }
}
