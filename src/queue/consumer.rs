use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{MessageBody, QueueMessage, RedisQueue};
use crate::config::QueueConfig;
use crate::models::VehicleFields;
use crate::services::VehicleService;

/// Resultado de procesar un mensaje
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumeReport {
    pub created: usize,
    pub failed: usize,
}

/// Consumidor de la cola de importación.
///
/// Cada fila recibida se da de alta con las mismas reglas de unicidad que
/// la API. Una fila rechazada se registra y se descarta: no hay reintentos
/// ni cola de mensajes muertos.
pub struct VehicleQueueConsumer {
    service: Arc<VehicleService>,
    queue: RedisQueue,
    poll_timeout: Duration,
    retry_delay: Duration,
}

/// Interpretar un payload: un objeto con `body` es un sobre `{id, body}`;
/// cualquier otro valor es contenido desnudo (fila o lote).
///
/// Un sobre mal formado es un error: no se reintenta como fila suelta.
fn parse_payload(payload: &str) -> Result<(Option<String>, MessageBody), serde_json::Error> {
    let value: Value = serde_json::from_str(payload)?;

    if value.get("body").is_some() {
        let message: QueueMessage<MessageBody> = serde_json::from_value(value)?;
        Ok((Some(message.id), message.body))
    } else {
        serde_json::from_value::<MessageBody>(value).map(|body| (None, body))
    }
}

/// Procesar un mensaje ya extraído de la cola
pub async fn handle_payload(service: &VehicleService, payload: &str) -> ConsumeReport {
    let mut report = ConsumeReport::default();

    let (id, body) = match parse_payload(payload) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("❌ Mensaje ilegible descartado: {}", e);
            return report;
        }
    };
    let id = id.unwrap_or_else(|| "-".to_string());

    for row in body.into_rows() {
        let plate = row.plate.clone().unwrap_or_default();
        match service.create(VehicleFields::from(row)).await {
            Ok(created) => {
                debug!("📥 Mensaje {}: vehículo {} creado", id, created.plate);
                report.created += 1;
            }
            Err(e) => {
                warn!("⚠️ Mensaje {}: fila con placa '{}' rechazada: {}", id, plate, e);
                report.failed += 1;
            }
        }
    }

    report
}

impl VehicleQueueConsumer {
    pub fn new(service: Arc<VehicleService>, queue: RedisQueue, config: &QueueConfig) -> Self {
        Self {
            service,
            queue,
            poll_timeout: config.poll_timeout(),
            retry_delay: config.retry_delay(),
        }
    }

    /// Bucle de consumo hasta que `shutdown` pase a `true`.
    ///
    /// La señal se revisa entre esperas; un `BLPOP` en curso termina por su
    /// propio timeout para no perder un mensaje ya extraído.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("👂 Consumidor escuchando la cola '{}'", self.queue.key());

        while !*shutdown.borrow() {
            match self.queue.pop(self.poll_timeout).await {
                Ok(Some(payload)) => {
                    let report = handle_payload(&self.service, &payload).await;
                    info!(
                        "📦 Mensaje procesado: {} creados, {} rechazados",
                        report.created, report.failed
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    error!("❌ Error leyendo la cola: {}", e);
                    tokio::select! {
                        _ = tokio::time::sleep(self.retry_delay) => {}
                        _ = shutdown.changed() => {}
                    }
                }
            }
        }

        info!("🛑 Consumidor detenido");
    }
}
