//! Lectura de la planilla de importación
//!
//! Busca el único `.xlsx` del directorio de staging y convierte las filas
//! de la primera hoja en `ImportedVehicleRow`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Reader, Xlsx};
use serde_json::{Map, Number, Value};
use tracing::{debug, info};

use crate::models::ImportedVehicleRow;
use crate::utils::errors::{AppError, AppResult};

/// Encabezados obligatorios, con el nombre de campo que usa la fila
pub const REQUIRED_HEADERS: [&str; 6] = [
    "plate",
    "chassis",
    "registrationNumber",
    "model",
    "make",
    "year",
];

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

fn is_import_file(path: &Path) -> bool {
    let is_xlsx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    // Excel deja archivos de bloqueo "~$nombre.xlsx" mientras la planilla está abierta
    let is_lock_file = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with("~$"))
        .unwrap_or(false);
    is_xlsx && !is_lock_file && path.is_file()
}

/// Localizar exactamente un `.xlsx` en el directorio; cero o varios es un error
pub fn locate_import_file(dir: &Path) -> AppResult<PathBuf> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        AppError::BadRequest(format!(
            "No se pudo leer el directorio de importación {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| AppError::Internal(format!("Error recorriendo {}: {}", dir.display(), e)))?
            .path();
        if is_import_file(&path) {
            candidates.push(path);
        }
    }

    match candidates.len() {
        0 => Err(AppError::BadRequest(format!(
            "No se encontró ningún archivo .xlsx en {}",
            dir.display()
        ))),
        1 => Ok(candidates.remove(0)),
        n => Err(AppError::BadRequest(format!(
            "Se esperaba un único archivo .xlsx en {}, se encontraron {}",
            dir.display(),
            n
        ))),
    }
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        other => Value::String(other.to_string()),
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Leer las filas de datos de la primera hoja
pub fn read_vehicle_rows(path: &Path) -> AppResult<Vec<ImportedVehicleRow>> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
        AppError::BadRequest(format!("No se pudo abrir la planilla {}: {}", path.display(), e))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::BadRequest("La planilla no tiene hojas".to_string()))?
        .map_err(|e| AppError::BadRequest(format!("No se pudo leer la primera hoja: {}", e)))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| AppError::BadRequest("La planilla está vacía".to_string()))?;

    let positions: HashMap<String, usize> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| (normalize_header(&cell.to_string()), idx))
        .collect();

    let mut columns = Vec::with_capacity(REQUIRED_HEADERS.len());
    let mut missing = Vec::new();
    for header in REQUIRED_HEADERS {
        match positions.get(&normalize_header(header)) {
            Some(idx) => columns.push((header, *idx)),
            None => missing.push(header),
        }
    }
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Encabezados obligatorios ausentes: {}",
            missing.join(", ")
        )));
    }

    let mut vehicles = Vec::new();
    for (line, row) in rows.enumerate() {
        if row.iter().all(is_blank) {
            continue;
        }

        let mut object = Map::new();
        for (header, idx) in &columns {
            let value = row.get(*idx).map(cell_to_value).unwrap_or(Value::Null);
            object.insert((*header).to_string(), value);
        }

        let vehicle: ImportedVehicleRow = serde_json::from_value(Value::Object(object)).map_err(|e| {
            AppError::BadRequest(format!("Fila {} inválida: {}", line + 2, e))
        })?;
        vehicles.push(vehicle);
    }

    debug!("📄 {} filas leídas de {}", vehicles.len(), path.display());
    Ok(vehicles)
}

/// Localizar y leer la planilla del directorio de staging
pub fn load_staged_rows(dir: &Path) -> AppResult<Vec<ImportedVehicleRow>> {
    let path = locate_import_file(dir)?;
    info!("📥 Importando vehículos desde {}", path.display());
    read_vehicle_rows(&path)
}
