//! Repositorio de vehículos en memoria
//!
//! Mismo contrato que `PgVehicleRepository`, incluidas las restricciones
//! UNIQUE y NOT NULL de la tabla. Se usa en desarrollo sin PostgreSQL
//! (`STORAGE_BACKEND=memory`) y en los tests de la API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::vehicle_repository::VehicleRepository;
use crate::models::{NewVehicle, UniqueField, Vehicle, VehicleFields, VehicleFilter};
use crate::utils::errors::{conflict_error, not_found_error, AppResult};

#[derive(Default)]
pub struct InMemoryVehicleRepository {
    vehicles: RwLock<Vec<Vehicle>>,
}

impl InMemoryVehicleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emula las restricciones UNIQUE de la tabla
    fn check_unique(vehicles: &[Vehicle], candidate: &Vehicle) -> AppResult<()> {
        let mut conflicts = BTreeMap::new();
        for other in vehicles.iter().filter(|v| v.id != candidate.id) {
            for field in UniqueField::ALL {
                if field.value_of(other) == field.value_of(candidate) {
                    conflicts.insert(
                        field.api_name().to_string(),
                        field.value_of(candidate).to_string(),
                    );
                }
            }
        }
        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(conflict_error(conflicts))
        }
    }
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn create(&self, data: &VehicleFields) -> AppResult<Vehicle> {
        let new_vehicle = NewVehicle::try_from(data)?;
        let now = Utc::now();
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            plate: new_vehicle.plate,
            chassis: new_vehicle.chassis,
            registration_number: new_vehicle.registration_number,
            model: new_vehicle.model,
            make: new_vehicle.make,
            year: new_vehicle.year,
            created_at: now,
            updated_at: now,
        };

        let mut vehicles = self.vehicles.write().await;
        Self::check_unique(&vehicles, &vehicle)?;
        vehicles.push(vehicle.clone());
        Ok(vehicle)
    }

    async fn find(&self, filter: &VehicleFilter, page: u64, limit: u64) -> AppResult<Vec<Vehicle>> {
        let skip = page.saturating_sub(1).saturating_mul(limit);
        let vehicles = self.vehicles.read().await;
        Ok(vehicles
            .iter()
            .filter(|v| filter.matches(v))
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &VehicleFilter) -> AppResult<u64> {
        let vehicles = self.vehicles.read().await;
        Ok(vehicles.iter().filter(|v| filter.matches(v)).count() as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Vehicle> {
        let vehicles = self.vehicles.read().await;
        vehicles
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| not_found_error(id))
    }

    async fn update(&self, id: Uuid, changes: &VehicleFields) -> AppResult<Vehicle> {
        let mut vehicles = self.vehicles.write().await;
        let index = vehicles.iter().position(|v| v.id == id).ok_or_else(|| not_found_error(id))?;

        let mut updated = vehicles[index].clone();
        changes.apply_to(&mut updated);
        updated.updated_at = Utc::now();
        Self::check_unique(&vehicles, &updated)?;

        vehicles[index] = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut vehicles = self.vehicles.write().await;
        let before = vehicles.len();
        vehicles.retain(|v| v.id != id);
        if vehicles.len() == before {
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
        let vehicles = self.vehicles.read().await;
        Ok(vehicles
            .iter()
            .filter(|v| ignore_id != Some(v.id))
            .find(|v| field.value_of(v) == value)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::AppError;

    fn civic() -> VehicleFields {
        VehicleFields {
            plate: Some("ABC1D23".to_string()),
            chassis: Some("9BWZZZ377VT004251".to_string()),
            registration_number: Some("12345678900".to_string()),
            model: Some("Civic".to_string()),
            make: Some("Honda".to_string()),
            year: Some(2020),
        }
    }

    #[tokio::test]
    async fn test_create_then_find_by_id_round_trip() {
        let repo = InMemoryVehicleRepository::new();
        let data = civic();

        let created = repo.create(&data).await.unwrap();
        let found = repo.find_by_id(created.id).await.unwrap();

        assert_eq!(found, created);
        assert_eq!(found.plate, "ABC1D23");
        assert_eq!(found.chassis, "9BWZZZ377VT004251");
        assert_eq!(found.registration_number, "12345678900");
        assert_eq!(found.model, "Civic");
        assert_eq!(found.make, "Honda");
        assert_eq!(found.year, 2020);
        assert_eq!(found.created_at, found.updated_at);
    }

    #[tokio::test]
    async fn test_unique_constraint_is_enforced() {
        let repo = InMemoryVehicleRepository::new();
        repo.create(&civic()).await.unwrap();

        let err = repo.create(&civic()).await.unwrap_err();
        match err {
            AppError::Conflict { conflicts, .. } => assert_eq!(conflicts.len(), 3),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_find_by_field_ignores_given_id() {
        let repo = InMemoryVehicleRepository::new();
        let created = repo.create(&civic()).await.unwrap();

        let found = repo
            .find_by_field(UniqueField::Chassis, "9BWZZZ377VT004251", None)
            .await
            .unwrap();
        assert!(found.is_some());

        let found = repo
            .find_by_field(UniqueField::Chassis, "9BWZZZ377VT004251", Some(created.id))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_ids() {
        let repo = InMemoryVehicleRepository::new();
        let missing = Uuid::new_v4();

        assert!(matches!(
            repo.update(missing, &VehicleFields::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(repo.delete(missing).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_paginates_in_insertion_order() {
        let repo = InMemoryVehicleRepository::new();
        for i in 0..3 {
            let data = VehicleFields {
                plate: Some(format!("ABC123{}", i)),
                chassis: Some(format!("9BWZZZ377VT00425{}", i)),
                registration_number: Some(format!("1234567890{}", i)),
                ..civic()
            };
            repo.create(&data).await.unwrap();
        }

        let page = repo.find(&VehicleFilter::new(), 2, 2).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].plate, "ABC1232");
        assert_eq!(repo.count(&VehicleFilter::new()).await.unwrap(), 3);
    }
}
