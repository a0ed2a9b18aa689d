use std::time::Duration;

use redis::aio::ConnectionManager;
use tracing::{debug, info};

use crate::config::QueueConfig;
use crate::utils::errors::AppResult;

/// Lista de Redis usada como cola FIFO.
///
/// Cada instancia abre su propia conexión: un `BLPOP` bloquea la conexión
/// multiplexada, así que productor y consumidor no deben compartirla.
#[derive(Clone)]
pub struct RedisQueue {
    manager: ConnectionManager,
    key: String,
}

impl RedisQueue {
    /// Conectar a Redis y verificar la conexión
    pub async fn connect(config: &QueueConfig) -> AppResult<Self> {
        info!("🔗 Conectando a Redis: {}", config.masked_url());

        let client = redis::Client::open(config.redis_url.clone())?;
        let manager = ConnectionManager::new(client).await?;

        let mut conn = manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Cola '{}' lista", config.queue_key());
        Ok(Self {
            manager,
            key: config.queue_key(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Encolar un mensaje ya serializado
    pub async fn push(&self, payload: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let length: i64 = redis::cmd("RPUSH")
            .arg(&self.key)
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        debug!("📤 Mensaje encolado en {} (pendientes: {})", self.key, length);
        Ok(())
    }

    /// Esperar hasta `timeout` por el próximo mensaje
    pub async fn pop(&self, timeout: Duration) -> AppResult<Option<String>> {
        let mut conn = self.manager.clone();
        let popped: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(&self.key)
            .arg(timeout.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(popped.map(|(_, payload)| payload))
    }
}
