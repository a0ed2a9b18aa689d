//! Repositorio de vehículos
//!
//! Define el puerto de persistencia que consume `VehicleService` y su
//! implementación sobre PostgreSQL con SQLx. Los filtros estructurados de
//! `models::filter` se traducen aquí a SQL.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    FilterField, FilterValue, NewVehicle, Predicate, UniqueField, Vehicle, VehicleFields,
    VehicleFilter,
};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

/// Puerto de persistencia de vehículos
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn create(&self, data: &VehicleFields) -> AppResult<Vehicle>;

    /// Página `page` (desde 1) de `limit` elementos que cumplen el filtro
    async fn find(&self, filter: &VehicleFilter, page: u64, limit: u64) -> AppResult<Vec<Vehicle>>;

    async fn count(&self, filter: &VehicleFilter) -> AppResult<u64>;

    /// Falla con `NotFound` si no existe
    async fn find_by_id(&self, id: Uuid) -> AppResult<Vehicle>;

    /// Actualización parcial; falla con `NotFound` si no existe
    async fn update(&self, id: Uuid, changes: &VehicleFields) -> AppResult<Vehicle>;

    /// Falla con `NotFound` si no se eliminó nada
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    async fn find_by_field(
        &self,
        field: UniqueField,
        value: &str,
        ignore_id: Option<Uuid>,
    ) -> AppResult<Option<Vehicle>>;
}

const VEHICLE_COLUMNS: &str =
    "id, plate, chassis, registration_number, model, make, year, created_at, updated_at";

/// Nombres de las restricciones UNIQUE creadas en `database::connection::ensure_schema`
pub const PLATE_CONSTRAINT: &str = "vehicles_plate_key";
pub const CHASSIS_CONSTRAINT: &str = "vehicles_chassis_key";
pub const REGISTRATION_NUMBER_CONSTRAINT: &str = "vehicles_registration_number_key";

const UNIQUE_VIOLATION: &str = "23505";

fn column(field: FilterField) -> &'static str {
    match field {
        FilterField::Id => "id",
        FilterField::Plate => "plate",
        FilterField::Chassis => "chassis",
        FilterField::RegistrationNumber => "registration_number",
        FilterField::Model => "model",
        FilterField::Make => "make",
        FilterField::Year => "year",
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(text) => qb.push_bind(text.clone()),
        FilterValue::Integer(n) => qb.push_bind(*n),
        FilterValue::Id(id) => qb.push_bind(*id),
    };
}

fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Equals { field, value } => {
            qb.push(column(*field)).push(" = ");
            push_value(qb, value);
        }
        Predicate::NotEquals { field, value } => {
            qb.push(column(*field)).push(" <> ");
            push_value(qb, value);
        }
        Predicate::ContainsIgnoreCase { field, value } => {
            qb.push(column(*field))
                .push("::text ILIKE ")
                .push_bind(format!("%{}%", escape_like(value)));
        }
        Predicate::AnyOf(branches) => {
            if branches.is_empty() {
                qb.push("FALSE");
                return;
            }
            qb.push("(");
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                push_predicate(qb, branch);
            }
            qb.push(")");
        }
    }
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, filter: &VehicleFilter) {
    qb.push(" WHERE TRUE");
    for predicate in filter.predicates() {
        qb.push(" AND ");
        push_predicate(qb, predicate);
    }
}

fn field_for_constraint(constraint: &str) -> Option<UniqueField> {
    match constraint {
        PLATE_CONSTRAINT => Some(UniqueField::Plate),
        CHASSIS_CONSTRAINT => Some(UniqueField::Chassis),
        REGISTRATION_NUMBER_CONSTRAINT => Some(UniqueField::RegistrationNumber),
        _ => None,
    }
}

/// Una violación de UNIQUE que pasó el pre-chequeo (escrituras concurrentes)
/// se reporta igual que un conflicto detectado por el servicio.
fn map_write_error(error: sqlx::Error, data: &VehicleFields) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.code().as_deref() == Some(UNIQUE_VIOLATION) {
            if let Some(field) = db_error.constraint().and_then(field_for_constraint) {
                let mut conflicts = BTreeMap::new();
                conflicts.insert(
                    field.api_name().to_string(),
                    data.unique_value(field).unwrap_or_default().to_string(),
                );
                return conflict_error(conflicts);
            }
        }
    }
    AppError::Database(error)
}

fn page_bounds(page: u64, limit: u64) -> AppResult<(i64, i64)> {
    let offset = page.saturating_sub(1).checked_mul(limit);
    match (offset.and_then(|o| i64::try_from(o).ok()), i64::try_from(limit)) {
        (Some(offset), Ok(limit)) => Ok((offset, limit)),
        _ => Err(AppError::BadRequest("Parámetros de paginación fuera de rango".to_string())),
    }
}

/// Implementación del repositorio sobre PostgreSQL
#[derive(Clone)]
pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn create(&self, data: &VehicleFields) -> AppResult<Vehicle> {
        let new_vehicle = NewVehicle::try_from(data)?;
        let now = Utc::now();

        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            INSERT INTO vehicles (id, plate, chassis, registration_number, model, make, year, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(new_vehicle.plate)
        .bind(new_vehicle.chassis)
        .bind(new_vehicle.registration_number)
        .bind(new_vehicle.model)
        .bind(new_vehicle.make)
        .bind(new_vehicle.year)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, data))?;

        debug!("💾 Vehículo {} insertado", vehicle.id);
        Ok(vehicle)
    }

    async fn find(&self, filter: &VehicleFilter, page: u64, limit: u64) -> AppResult<Vec<Vehicle>> {
        let (offset, limit) = page_bounds(page, limit)?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM vehicles", VEHICLE_COLUMNS));
        push_where(&mut qb, filter);
        qb.push(" ORDER BY created_at ASC, id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let vehicles = qb.build_query_as::<Vehicle>().fetch_all(&self.pool).await?;
        Ok(vehicles)
    }

    async fn count(&self, filter: &VehicleFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM vehicles");
        push_where(&mut qb, filter);

        let total = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Vehicle> {
        sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {} FROM vehicles WHERE id = $1",
            VEHICLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error(id))
    }

    async fn update(&self, id: Uuid, changes: &VehicleFields) -> AppResult<Vehicle> {
        sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            UPDATE vehicles
            SET plate = COALESCE($2, plate),
                chassis = COALESCE($3, chassis),
                registration_number = COALESCE($4, registration_number),
                model = COALESCE($5, model),
                make = COALESCE($6, make),
                year = COALESCE($7, year),
                updated_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(id)
        .bind(changes.plate.clone())
        .bind(changes.chassis.clone())
        .bind(changes.registration_number.clone())
        .bind(changes.model.clone())
        .bind(changes.make.clone())
        .bind(changes.year)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, changes))?
        .ok_or_else(|| not_found_error(id))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error(id));
        }
        Ok(())
    }

    async fn find_by_field(
        &self,
        field: UniqueField,
        value: &str,
        ignore_id: Option<Uuid>,
    ) -> AppResult<Option<Vehicle>> {
        let mut filter = VehicleFilter::new().equals_text(field.into(), value);
        if let Some(id) = ignore_id {
            filter = filter.excluding_id(id);
        }

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM vehicles", VEHICLE_COLUMNS));
        push_where(&mut qb, &filter);
        qb.push(" LIMIT 1");

        let vehicle = qb.build_query_as::<Vehicle>().fetch_optional(&self.pool).await?;
        Ok(vehicle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_filter_translates_to_or_group() {
        let filter = VehicleFilter::new().search("2020");
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM vehicles");
        push_where(&mut qb, &filter);

        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM vehicles WHERE TRUE AND (plate::text ILIKE $1 OR chassis::text ILIKE $2 \
             OR registration_number::text ILIKE $3 OR model::text ILIKE $4 OR make::text ILIKE $5 OR year = $6)"
        );
    }

    #[test]
    fn test_find_by_field_filter_excludes_id() {
        let filter = VehicleFilter::new()
            .equals_text(FilterField::Chassis, "9BWZZZ377VT004251")
            .excluding_id(Uuid::new_v4());
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM vehicles");
        push_where(&mut qb, &filter);

        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM vehicles WHERE TRUE AND chassis = $1 AND id <> $2"
        );
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(1, 10).unwrap(), (0, 10));
        assert_eq!(page_bounds(3, 10).unwrap(), (20, 10));
        assert!(page_bounds(u64::MAX, u64::MAX).is_err());
    }

    /// Error de base de datos mínimo con código SQLSTATE y restricción
    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct StubDatabaseError {
        message: String,
        code: &'static str,
        constraint: Option<&'static str>,
    }

    impl sqlx::error::DatabaseError for StubDatabaseError {
        fn message(&self) -> &str {
            &self.message
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed(self.code))
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.code == UNIQUE_VIOLATION {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::Other
            }
        }
    }

    fn database_error(code: &'static str, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(StubDatabaseError {
            message: "duplicate key value violates unique constraint".to_string(),
            code,
            constraint,
        }))
    }

    fn chassis_fields() -> VehicleFields {
        VehicleFields {
            chassis: Some("9BWZZZ377VT004251".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_unique_violation_becomes_conflict() {
        let error = database_error(UNIQUE_VIOLATION, Some(CHASSIS_CONSTRAINT));

        match map_write_error(error, &chassis_fields()) {
            AppError::Conflict { conflicts, .. } => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts["chassis"], "9BWZZZ377VT004251");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_other_write_errors_stay_database_errors() {
        let unknown_constraint = database_error(UNIQUE_VIOLATION, Some("vehicles_pkey"));
        assert!(matches!(
            map_write_error(unknown_constraint, &chassis_fields()),
            AppError::Database(_)
        ));

        let not_null = database_error("23502", None);
        assert!(matches!(
            map_write_error(not_null, &chassis_fields()),
            AppError::Database(_)
        ));
    }

    #[test]
    fn test_field_for_constraint() {
        assert_eq!(field_for_constraint(PLATE_CONSTRAINT), Some(UniqueField::Plate));
        assert_eq!(
            field_for_constraint(REGISTRATION_NUMBER_CONSTRAINT),
            Some(UniqueField::RegistrationNumber)
        );
        assert_eq!(field_for_constraint("vehicles_pkey"), None);
    }
}
