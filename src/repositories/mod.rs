//! Repositorios
//!
//! Capa de persistencia: el puerto `VehicleRepository` y sus adaptadores.

pub mod memory_vehicle_repository;
pub mod vehicle_repository;

pub use memory_vehicle_repository::InMemoryVehicleRepository;
pub use vehicle_repository::{PgVehicleRepository, VehicleRepository};
