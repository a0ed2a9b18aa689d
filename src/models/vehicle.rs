//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle, el struct de campos opcionales
//! usado para altas parciales y actualizaciones, y la fila de importación
//! que viaja por la cola.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::errors::AppError;

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate: String,
    pub chassis: String,
    pub registration_number: String,
    pub model: String,
    pub make: String,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campos con restricción de unicidad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    Plate,
    Chassis,
    RegistrationNumber,
}

impl UniqueField {
    pub const ALL: [UniqueField; 3] = [
        UniqueField::Plate,
        UniqueField::Chassis,
        UniqueField::RegistrationNumber,
    ];

    /// Nombre del campo tal como se expone en la API
    pub fn api_name(self) -> &'static str {
        match self {
            UniqueField::Plate => "plate",
            UniqueField::Chassis => "chassis",
            UniqueField::RegistrationNumber => "registrationNumber",
        }
    }

    pub fn value_of(self, vehicle: &Vehicle) -> &str {
        match self {
            UniqueField::Plate => &vehicle.plate,
            UniqueField::Chassis => &vehicle.chassis,
            UniqueField::RegistrationNumber => &vehicle.registration_number,
        }
    }
}

/// Subconjunto cualquiera de los campos de un vehículo.
///
/// Se usa para el alta desde la cola (campos posiblemente incompletos)
/// y para las actualizaciones parciales.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFields {
    pub plate: Option<String>,
    pub chassis: Option<String>,
    pub registration_number: Option<String>,
    pub model: Option<String>,
    pub make: Option<String>,
    pub year: Option<i32>,
}

impl VehicleFields {
    /// Valor presente (y no vacío) de un campo único
    pub fn unique_value(&self, field: UniqueField) -> Option<&str> {
        let value = match field {
            UniqueField::Plate => self.plate.as_deref(),
            UniqueField::Chassis => self.chassis.as_deref(),
            UniqueField::RegistrationNumber => self.registration_number.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Aplicar los campos presentes sobre un vehículo existente
    pub fn apply_to(&self, vehicle: &mut Vehicle) {
        if let Some(plate) = &self.plate {
            vehicle.plate = plate.clone();
        }
        if let Some(chassis) = &self.chassis {
            vehicle.chassis = chassis.clone();
        }
        if let Some(registration_number) = &self.registration_number {
            vehicle.registration_number = registration_number.clone();
        }
        if let Some(model) = &self.model {
            vehicle.model = model.clone();
        }
        if let Some(make) = &self.make {
            vehicle.make = make.clone();
        }
        if let Some(year) = self.year {
            vehicle.year = year;
        }
    }
}

/// Vehículo completo listo para insertar.
///
/// Equivale a las restricciones `NOT NULL` de la tabla: los adaptadores de
/// persistencia lo exigen antes de escribir.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVehicle {
    pub plate: String,
    pub chassis: String,
    pub registration_number: String,
    pub model: String,
    pub make: String,
    pub year: i32,
}

impl TryFrom<&VehicleFields> for NewVehicle {
    type Error = AppError;

    fn try_from(fields: &VehicleFields) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        let mut take = |value: &Option<String>, name: &'static str| match value {
            Some(v) if !v.is_empty() => v.clone(),
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let plate = take(&fields.plate, "plate");
        let chassis = take(&fields.chassis, "chassis");
        let registration_number = take(&fields.registration_number, "registrationNumber");
        let model = take(&fields.model, "model");
        let make = take(&fields.make, "make");
        if fields.year.is_none() {
            missing.push("year");
        }

        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Campos obligatorios ausentes: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            plate,
            chassis,
            registration_number,
            model,
            make,
            year: fields.year.unwrap_or_default(),
        })
    }
}

/// Fila de planilla publicada en la cola.
///
/// Las celdas pueden llegar como texto o como número; la coerción ocurre
/// al deserializar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedVehicleRow {
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub chassis: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, deserialize_with = "deserialize_year", skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl From<ImportedVehicleRow> for VehicleFields {
    fn from(row: ImportedVehicleRow) -> Self {
        Self {
            plate: row.plate,
            chassis: row.chassis,
            registration_number: row.registration_number,
            model: row.model,
            make: row.make,
            year: row.year,
        }
    }
}

fn number_to_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        // 12345678900.0 viene así desde las celdas numéricas de Excel
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(number_to_text(&n)),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }))
}

fn deserialize_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).ok(),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i32::MIN as f64 && *f <= i32::MAX as f64)
                .map(|f| f as i32),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i32>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && *f >= i32::MIN as f64 && *f <= i32::MAX as f64)
                    .map(|f| f as i32)
            })
        }
        _ => None,
    }))
}
