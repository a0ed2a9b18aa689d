//! Mapper de Vehicle a su representación en la API
//!
//! Las fechas se muestran como `dd/mm/aaaa HH:MM:SS` (formato pt-BR) en un
//! desfase fijo respecto de UTC, por defecto -3.
//!
//! No se usa la zona con nombre `America/Sao_Paulo`: hoy coincide con UTC-3
//! porque Brasil no aplica horario de verano desde 2019, pero si esa regla
//! cambia el desfase fijo no la sigue y hay que ajustar
//! `DISPLAY_UTC_OFFSET_HOURS`.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::warn;

use crate::dto::vehicle_dto::VehicleResponse;
use crate::models::Vehicle;

const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Debug, Clone, Copy)]
pub struct VehicleMapper {
    offset: FixedOffset,
}

impl VehicleMapper {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Crear el mapper a partir de un desfase en horas respecto de UTC
    pub fn from_utc_offset_hours(hours: i32) -> Self {
        let offset = hours.checked_mul(3600).and_then(FixedOffset::east_opt).unwrap_or_else(|| {
            warn!("⚠️ Desfase horario inválido ({}h), usando UTC", hours);
            Utc.fix()
        });
        Self::new(offset)
    }

    pub fn format_timestamp(&self, timestamp: &DateTime<Utc>) -> String {
        timestamp.with_timezone(&self.offset).format(DISPLAY_FORMAT).to_string()
    }

    pub fn to_response(&self, vehicle: Vehicle) -> VehicleResponse {
        VehicleResponse {
            id: vehicle.id.to_string(),
            plate: vehicle.plate,
            chassis: vehicle.chassis,
            registration_number: vehicle.registration_number,
            model: vehicle.model,
            make: vehicle.make,
            year: vehicle.year,
            created_at: self.format_timestamp(&vehicle.created_at),
            updated_at: self.format_timestamp(&vehicle.updated_at),
        }
    }
}

impl Default for VehicleMapper {
    fn default() -> Self {
        Self::from_utc_offset_hours(-3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn test_to_response_localizes_timestamps() {
        let vehicle = Vehicle {
            id: Uuid::parse_str("507f191e-810c-4972-9de8-60ea00000000").unwrap(),
            plate: "ABC1D23".to_string(),
            chassis: "9BWZZZ377VT004251".to_string(),
            registration_number: "12345678901".to_string(),
            model: "Civic".to_string(),
            make: "Honda".to_string(),
            year: 2021,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 2, 30, 15).unwrap(),
        };

        let response = VehicleMapper::default().to_response(vehicle);

        assert_eq!(response.id, "507f191e-810c-4972-9de8-60ea00000000");
        assert_eq!(response.registration_number, "12345678901");
        assert_eq!(response.created_at, "01/01/2024 09:00:00");
        assert_eq!(response.updated_at, "01/01/2024 23:30:15");
    }

    #[test]
    fn test_default_offset_is_fixed_all_year() {
        let mapper = VehicleMapper::default();
        let summer = Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap();
        let winter = Utc.with_ymd_and_hms(2024, 7, 15, 15, 0, 0).unwrap();

        assert_eq!(mapper.format_timestamp(&summer), "15/01/2024 12:00:00");
        assert_eq!(mapper.format_timestamp(&winter), "15/07/2024 12:00:00");
    }

    #[test]
    fn test_invalid_offset_falls_back_to_utc() {
        let mapper = VehicleMapper::from_utc_offset_hours(48);
        let ts = Utc.with_ymd_and_hms(2024, 5, 3, 10, 14, 22).unwrap();
        assert_eq!(mapper.format_timestamp(&ts), "03/05/2024 10:14:22");
    }
}
