//! Configuración de conexión a PostgreSQL
//! 
//! Este módulo abre el pool de conexiones y crea la tabla `vehicles` si no existe.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;

/// Esquema de la tabla de vehículos. Los nombres de las restricciones UNIQUE
/// son los que `repositories::vehicle_repository` traduce a conflictos.
const CREATE_VEHICLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS vehicles (
    id UUID PRIMARY KEY,
    plate TEXT NOT NULL,
    chassis TEXT NOT NULL,
    registration_number TEXT NOT NULL,
    model TEXT NOT NULL,
    make TEXT NOT NULL,
    year INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT vehicles_plate_key UNIQUE (plate),
    CONSTRAINT vehicles_chassis_key UNIQUE (chassis),
    CONSTRAINT vehicles_registration_number_key UNIQUE (registration_number)
)
"#;

const CREATE_CREATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS vehicles_created_at_idx ON vehicles (created_at, id)";

/// Crear un pool de conexiones a la base de datos
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    info!("🔗 Conectando a PostgreSQL: {}", mask_database_url(&config.url));
    let pool = config.create_pool().await?;
    info!("✅ Conexión a PostgreSQL establecida");
    Ok(pool)
}

/// Crear la tabla y los índices si no existen
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_VEHICLES_TABLE).execute(pool).await?;
    sqlx::query(CREATE_CREATED_AT_INDEX).execute(pool).await?;
    info!("📐 Esquema de vehículos verificado");
    Ok(())
}

/// Función helper para enmascarar la URL de la base de datos en logs
pub fn mask_database_url(url: &str) -> String {
    let Some(at_pos) = url.rfind('@') else {
        return url.to_string();
    };
    match url.find("://") {
        Some(scheme_end) if scheme_end + 3 <= at_pos => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => url.to_string(),
    }
}
