//! Cola de importación de vehículos
//!
//! El productor publica una fila de planilla por mensaje y el consumidor
//! las da de alta a través de `VehicleService::create`.

pub mod consumer;
pub mod producer;
pub mod redis_queue;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::ImportedVehicleRow;
use crate::utils::errors::AppResult;

pub use consumer::{ConsumeReport, VehicleQueueConsumer};
pub use producer::{MessageIdGenerator, VehicleQueueProducer};
pub use redis_queue::RedisQueue;

/// Sobre de cada mensaje: id asignado por la aplicación y contenido
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage<T> {
    pub id: String,
    pub body: T,
}

/// Contenido de un mensaje: una fila o un lote de filas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    Many(Vec<ImportedVehicleRow>),
    One(ImportedVehicleRow),
}

impl MessageBody {
    pub fn into_rows(self) -> Vec<ImportedVehicleRow> {
        match self {
            MessageBody::Many(rows) => rows,
            MessageBody::One(row) => vec![row],
        }
    }
}

/// Publicación de filas importadas
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VehicleMessagePublisher: Send + Sync {
    /// Publicar una fila; los errores se propagan sin reintentos
    async fn send_message(&self, row: &ImportedVehicleRow) -> AppResult<()>;
}
