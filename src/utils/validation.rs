//! Utilidades de validación
//!
//! Este módulo contiene los patrones y funciones helper para validar
//! placas, chasis, renavam, año y los identificadores de vehículos.

use std::borrow::Cow;

use chrono::{Datelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;
use validator::ValidationError;

use crate::utils::errors::{AppError, AppResult};

/// Primer año admitido (Benz Patent-Motorwagen)
pub const MIN_VEHICLE_YEAR: i32 = 1886;

lazy_static! {
    /// Placa antigua (ABC1234) o Mercosul (ABC1D23)
    pub static ref PLATE_REGEX: Regex =
        Regex::new(r"^[A-Z]{3}(?:[0-9]{4}|[0-9][A-Z][0-9]{2})$").unwrap();

    /// Chasis: 17 caracteres alfanuméricos sin I, O ni Q
    pub static ref CHASSIS_REGEX: Regex = Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap();

    /// Renavam: exactamente 11 dígitos
    pub static ref REGISTRATION_NUMBER_REGEX: Regex = Regex::new(r"^\d{11}$").unwrap();
}

/// Año calendario actual, evaluado en el momento de la validación
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Validar que el año no sea anterior a 1886 ni posterior al año actual
pub fn validate_vehicle_year(year: i32) -> Result<(), ValidationError> {
    let max = current_year();
    if year < MIN_VEHICLE_YEAR || year > max {
        let mut error = ValidationError::new("year");
        error.add_param("min".into(), &MIN_VEHICLE_YEAR);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &year);
        error.message = Some(Cow::Owned(format!(
            "El año debe estar entre {} y {}",
            MIN_VEHICLE_YEAR, max
        )));
        return Err(error);
    }
    Ok(())
}

/// Validar y convertir el identificador de un vehículo.
///
/// Todo id mal formado se reporta como `BadRequest`, antes de tocar el store.
pub fn parse_vehicle_id(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::BadRequest(format!("ID inválido: '{}' no es un UUID", value)))
}
