//! Shared application state
//! 
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::services::VehicleService;

#[derive(Clone)]
pub struct AppState {
    pub vehicles: Arc<VehicleService>,
    pub config: EnvironmentConfig,
}

impl AppState {
    pub fn new(vehicles: Arc<VehicleService>, config: EnvironmentConfig) -> Self {
        Self { vehicles, config }
    }
}
