use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::{QueueMessage, RedisQueue, VehicleMessagePublisher};
use crate::models::ImportedVehicleRow;
use crate::utils::errors::AppResult;

/// Ids de mensaje derivados del reloj: `<epoch_ms>-<secuencia>`.
///
/// La secuencia evita colisiones entre mensajes del mismo milisegundo.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    sequence: AtomicU64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", Utc::now().timestamp_millis(), sequence)
    }
}

pub struct VehicleQueueProducer {
    queue: RedisQueue,
    ids: MessageIdGenerator,
}

impl VehicleQueueProducer {
    pub fn new(queue: RedisQueue) -> Self {
        Self {
            queue,
            ids: MessageIdGenerator::new(),
        }
    }
}

#[async_trait]
impl VehicleMessagePublisher for VehicleQueueProducer {
    async fn send_message(&self, row: &ImportedVehicleRow) -> AppResult<()> {
        let message = QueueMessage {
            id: self.ids.next_id(),
            body: row,
        };
        let payload = serde_json::to_string(&message)?;

        self.queue.push(&payload).await?;
        debug!("📤 Mensaje {} publicado en {}", message.id, self.queue.key());
        Ok(())
    }
}
