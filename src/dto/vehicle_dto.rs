use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::VehicleFields;
use crate::utils::validation::{
    validate_vehicle_year, CHASSIS_REGEX, PLATE_REGEX, REGISTRATION_NUMBER_REGEX,
};

// Request para crear un vehículo
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_year", skip_on_field_errors = false))]
pub struct CreateVehicleRequest {
    #[validate(regex(
        path = "PLATE_REGEX",
        message = "La placa debe seguir el patrón antiguo (ABC1234) o Mercosul (ABC1D23)"
    ))]
    pub plate: String,

    #[validate(regex(
        path = "CHASSIS_REGEX",
        message = "El chasis debe tener 17 caracteres alfanuméricos, sin I, O ni Q"
    ))]
    pub chassis: String,

    #[validate(regex(
        path = "REGISTRATION_NUMBER_REGEX",
        message = "El renavam debe tener exactamente 11 dígitos"
    ))]
    pub registration_number: String,

    #[validate(length(min = 1, message = "El modelo es requerido"))]
    pub model: String,

    #[validate(length(min = 1, message = "La marca es requerida"))]
    pub make: String,

    pub year: i32,
}

fn validate_create_year(request: &CreateVehicleRequest) -> Result<(), ValidationError> {
    validate_vehicle_year(request.year)
}

impl From<CreateVehicleRequest> for VehicleFields {
    fn from(request: CreateVehicleRequest) -> Self {
        Self {
            plate: Some(request.plate),
            chassis: Some(request.chassis),
            registration_number: Some(request.registration_number),
            model: Some(request.model),
            make: Some(request.make),
            year: Some(request.year),
        }
    }
}

// Request para actualizar un vehículo (cualquier subconjunto de campos)
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_year", skip_on_field_errors = false))]
pub struct UpdateVehicleRequest {
    #[validate(regex(
        path = "PLATE_REGEX",
        message = "La placa debe seguir el patrón antiguo (ABC1234) o Mercosul (ABC1D23)"
    ))]
    pub plate: Option<String>,

    #[validate(regex(
        path = "CHASSIS_REGEX",
        message = "El chasis debe tener 17 caracteres alfanuméricos, sin I, O ni Q"
    ))]
    pub chassis: Option<String>,

    #[validate(regex(
        path = "REGISTRATION_NUMBER_REGEX",
        message = "El renavam debe tener exactamente 11 dígitos"
    ))]
    pub registration_number: Option<String>,

    #[validate(length(min = 1, message = "El modelo no puede estar vacío"))]
    pub model: Option<String>,

    #[validate(length(min = 1, message = "La marca no puede estar vacía"))]
    pub make: Option<String>,

    pub year: Option<i32>,
}

fn validate_update_year(request: &UpdateVehicleRequest) -> Result<(), ValidationError> {
    match request.year {
        Some(year) => validate_vehicle_year(year),
        None => Ok(()),
    }
}

impl From<UpdateVehicleRequest> for VehicleFields {
    fn from(request: UpdateVehicleRequest) -> Self {
        Self {
            plate: request.plate,
            chassis: request.chassis,
            registration_number: request.registration_number,
            model: request.model,
            make: request.make,
            year: request.year,
        }
    }
}

// Query string del listado
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFilterQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub plate: Option<String>,
    pub chassis: Option<String>,
    pub registration_number: Option<String>,
    pub model: Option<String>,
    pub make: Option<String>,
    pub year: Option<i64>,
}

// Response de vehículo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub id: String,
    pub plate: String,
    pub chassis: String,
    pub registration_number: String,
    pub model: String,
    pub make: String,
    pub year: i32,
    pub created_at: String,
    pub updated_at: String,
}

// Response paginada del listado
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedVehicles {
    pub data: Vec<VehicleResponse>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub last_page: u64,
}

// Resultado de la importación de planilla
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub sent: usize,
}
