//! Servicio de vehículos
//!
//! Orquesta validación de ids, detección de conflictos de unicidad,
//! paginación e importación de planillas. La persistencia y la cola se
//! reciben como puertos (`VehicleRepository`, `VehicleMessagePublisher`).
//!
//! La unicidad se verifica con "consultar y luego escribir": dos altas
//! concurrentes con la misma placa pueden pasar ambas el pre-chequeo. La
//! autoridad real son las restricciones UNIQUE de la base; el chequeo del
//! servicio solo produce un error más completo en el caso común.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::dto::vehicle_dto::{ImportSummary, PaginatedVehicles, VehicleFilterQuery, VehicleResponse};
use crate::mappers::VehicleMapper;
use crate::models::{FilterField, UniqueField, VehicleFields, VehicleFilter};
use crate::queue::VehicleMessagePublisher;
use crate::repositories::VehicleRepository;
use crate::services::spreadsheet_import;
use crate::utils::errors::{conflict_error, AppError, AppResult};
use crate::utils::validation::parse_vehicle_id;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

pub struct VehicleService {
    repository: Arc<dyn VehicleRepository>,
    publisher: Arc<dyn VehicleMessagePublisher>,
    mapper: VehicleMapper,
    import_dir: PathBuf,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn positive(value: Option<i64>, default: i64, name: &str) -> AppResult<u64> {
    let value = value.unwrap_or(default);
    if value < 1 {
        return Err(AppError::BadRequest(format!(
            "{} debe ser un entero mayor o igual a 1",
            name
        )));
    }
    Ok(value as u64)
}

/// Traducir la query del listado al vocabulario de filtros
pub fn build_filter(query: &VehicleFilterQuery) -> VehicleFilter {
    let mut filter = VehicleFilter::new();

    if let Some(search) = non_empty(&query.search) {
        filter = filter.search(search);
    }
    if let Some(plate) = non_empty(&query.plate) {
        filter = filter.contains(FilterField::Plate, plate);
    }
    if let Some(chassis) = non_empty(&query.chassis) {
        filter = filter.equals_text(FilterField::Chassis, chassis);
    }
    if let Some(registration_number) = non_empty(&query.registration_number) {
        filter = filter.equals_text(FilterField::RegistrationNumber, registration_number);
    }
    if let Some(model) = non_empty(&query.model) {
        filter = filter.equals_text(FilterField::Model, model);
    }
    if let Some(make) = non_empty(&query.make) {
        filter = filter.equals_text(FilterField::Make, make);
    }
    if let Some(year) = query.year {
        filter = filter.year(year);
    }

    filter
}

impl VehicleService {
    pub fn new(
        repository: Arc<dyn VehicleRepository>,
        publisher: Arc<dyn VehicleMessagePublisher>,
        mapper: VehicleMapper,
        import_dir: PathBuf,
    ) -> Self {
        Self {
            repository,
            publisher,
            mapper,
            import_dir,
        }
    }

    /// Buscar, para cada campo único presente, otro registro con el mismo valor
    async fn find_conflicts(
        &self,
        data: &VehicleFields,
        ignore_id: Option<Uuid>,
    ) -> AppResult<BTreeMap<String, String>> {
        let mut conflicts = BTreeMap::new();

        for field in UniqueField::ALL {
            let Some(value) = data.unique_value(field) else {
                continue;
            };
            if self
                .repository
                .find_by_field(field, value, ignore_id)
                .await?
                .is_some()
            {
                conflicts.insert(field.api_name().to_string(), value.to_string());
            }
        }

        Ok(conflicts)
    }

    pub async fn create(&self, data: VehicleFields) -> AppResult<VehicleResponse> {
        let conflicts = self.find_conflicts(&data, None).await?;
        if !conflicts.is_empty() {
            return Err(conflict_error(conflicts));
        }

        let created = self.repository.create(&data).await?;
        info!("🚗 Vehículo creado: {} ({})", created.plate, created.id);
        Ok(self.mapper.to_response(created))
    }

    pub async fn find_all(&self, query: VehicleFilterQuery) -> AppResult<PaginatedVehicles> {
        let page = positive(query.page, DEFAULT_PAGE, "page")?;
        let limit = positive(query.limit, DEFAULT_LIMIT, "limit")?;
        let filter = build_filter(&query);

        let total = self.repository.count(&filter).await?;
        let last_page = total.div_ceil(limit);

        if page > last_page && total > 0 {
            return Err(AppError::BadRequest(format!(
                "La página {} no existe. La última página disponible es {}",
                page, last_page
            )));
        }

        // Sin resultados cualquier página es válida y no hace falta consultar
        let vehicles = if total == 0 {
            Vec::new()
        } else {
            self.repository.find(&filter, page, limit).await?
        };

        Ok(PaginatedVehicles {
            data: vehicles
                .into_iter()
                .map(|v| self.mapper.to_response(v))
                .collect(),
            page,
            limit,
            total,
            last_page,
        })
    }

    pub async fn find_one(&self, id: &str) -> AppResult<VehicleResponse> {
        let id = parse_vehicle_id(id)?;
        let vehicle = self.repository.find_by_id(id).await?;
        Ok(self.mapper.to_response(vehicle))
    }

    pub async fn update(&self, id: &str, changes: VehicleFields) -> AppResult<VehicleResponse> {
        let id = parse_vehicle_id(id)?;

        let conflicts = self.find_conflicts(&changes, Some(id)).await?;
        if !conflicts.is_empty() {
            return Err(conflict_error(conflicts));
        }

        let updated = self.repository.update(id, &changes).await?;
        info!("✏️ Vehículo actualizado: {}", updated.id);
        Ok(self.mapper.to_response(updated))
    }

    pub async fn remove(&self, id: &str) -> AppResult<()> {
        let id = parse_vehicle_id(id)?;
        self.repository.delete(id).await?;
        info!("🗑️ Vehículo eliminado: {}", id);
        Ok(())
    }

    /// Leer la planilla de staging y publicar una fila por mensaje.
    ///
    /// El primer fallo de publicación aborta la importación; las filas ya
    /// publicadas no se retiran.
    pub async fn import_from_excel(&self) -> AppResult<ImportSummary> {
        let dir = self.import_dir.clone();
        let rows = tokio::task::spawn_blocking(move || spreadsheet_import::load_staged_rows(&dir))
            .await
            .map_err(|e| AppError::Internal(format!("Import task failed: {}", e)))??;

        for (index, row) in rows.iter().enumerate() {
            if let Err(e) = self.publisher.send_message(row).await {
                error!(
                    "❌ Error publicando la fila {} ({:?}): {}",
                    index + 1,
                    row.plate,
                    e
                );
                return Err(e);
            }
        }

        info!("📨 {} filas enviadas a la cola", rows.len());
        Ok(ImportSummary { sent: rows.len() })
    }
}
