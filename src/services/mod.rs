//! Services module
//! 
//! Este módulo contiene la lógica de negocio de la aplicación: el servicio
//! de vehículos y la lectura de planillas de importación.

pub mod spreadsheet_import;
pub mod vehicle_service;

pub use vehicle_service::VehicleService;
