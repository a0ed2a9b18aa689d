use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::dto::vehicle_dto::{
    CreateVehicleRequest, ImportSummary, PaginatedVehicles, UpdateVehicleRequest,
    VehicleFilterQuery, VehicleResponse,
};
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_vehicle).get(list_vehicles))
        .route("/import", post(import_vehicles))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

async fn create_vehicle(
    State(state): State<AppState>,
    payload: Result<Json<CreateVehicleRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<VehicleResponse>)> {
    let request = body(payload)?;
    request.validate()?;

    let response = state.vehicles.create(request.into()).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_vehicles(
    State(state): State<AppState>,
    query: Result<Query<VehicleFilterQuery>, QueryRejection>,
) -> AppResult<Json<PaginatedVehicles>> {
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let response = state.vehicles.find_all(query).await?;
    Ok(Json(response))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<VehicleResponse>> {
    let response = state.vehicles.find_one(&id).await?;
    Ok(Json(response))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateVehicleRequest>, JsonRejection>,
) -> AppResult<Json<VehicleResponse>> {
    let request = body(payload)?;
    request.validate()?;

    let response = state.vehicles.update(&id, request.into()).await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.vehicles.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn import_vehicles(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<ImportSummary>)> {
    let summary = state.vehicles.import_from_excel().await?;
    Ok((StatusCode::ACCEPTED, Json(summary)))
}
