//! Modelos del sistema
//!
//! Este módulo contiene el modelo de vehículo y el vocabulario de filtros
//! que consume la capa de persistencia.

pub mod filter;
pub mod vehicle;

pub use filter::{FilterField, FilterValue, Predicate, VehicleFilter};
pub use vehicle::{ImportedVehicleRow, NewVehicle, UniqueField, Vehicle, VehicleFields};
