use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vehicle_registry::config::{DatabaseConfig, EnvironmentConfig, QueueConfig, StorageBackend};
use vehicle_registry::database::{create_pool, ensure_schema};
use vehicle_registry::mappers::VehicleMapper;
use vehicle_registry::queue::{RedisQueue, VehicleQueueConsumer, VehicleQueueProducer};
use vehicle_registry::repositories::{
    InMemoryVehicleRepository, PgVehicleRepository, VehicleRepository,
};
use vehicle_registry::routes::create_app;
use vehicle_registry::services::VehicleService;
use vehicle_registry::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚗 Vehicle Registry API");
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);
    if config.is_development() {
        info!("🛠️ Modo desarrollo activo");
    }

    // Inicializar persistencia
    let repository: Arc<dyn VehicleRepository> = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = match create_pool(&DatabaseConfig::from_env()?).await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };
            ensure_schema(&pool).await?;
            Arc::new(PgVehicleRepository::new(pool))
        }
        StorageBackend::Memory => {
            warn!("⚠️ Usando almacenamiento en memoria: los datos se pierden al reiniciar");
            Arc::new(InMemoryVehicleRepository::new())
        }
    };

    // Inicializar la cola: productor y consumidor usan conexiones separadas
    let queue_config = QueueConfig::from_env();
    let producer_queue = RedisQueue::connect(&queue_config).await?;
    let consumer_queue = RedisQueue::connect(&queue_config).await?;

    let vehicles = Arc::new(VehicleService::new(
        repository,
        Arc::new(VehicleQueueProducer::new(producer_queue)),
        VehicleMapper::from_utc_offset_hours(config.display_utc_offset_hours),
        config.import_dir.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer = VehicleQueueConsumer::new(vehicles.clone(), consumer_queue, &queue_config);
    let consumer_handle = tokio::spawn(consumer.run(shutdown_rx));

    let addr: SocketAddr = config.server_url().parse()?;
    info!("📂 Directorio de importación: {}", config.import_dir.display());
    let app = create_app(AppState::new(vehicles, config));

    info!("🚀 Servidor iniciado en http://{}", addr);
    info!("📋 Endpoints disponibles:");
    info!("   GET    /health - Health check");
    info!("   POST   /vehicles - Crear vehículo");
    info!("   GET    /vehicles - Listar vehículos (search, page, limit)");
    info!("   GET    /vehicles/:id - Obtener vehículo");
    info!("   PUT    /vehicles/:id - Actualizar vehículo");
    info!("   DELETE /vehicles/:id - Eliminar vehículo");
    info!("   POST   /vehicles/import - Importar planilla a la cola");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
    }

    // Detener el consumidor después del servidor
    let _ = shutdown_tx.send(true);
    if let Err(e) = consumer_handle.await {
        error!("❌ El consumidor terminó con error: {}", e);
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
