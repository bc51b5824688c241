use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};

use crate::{
    error::{AppError, Result},
    models::user::Identity,
    repositories::user::Lookup,
    response::{not_implemented, ApiResponse},
    services::session::UserData,
    state::AppState,
    validation::{
        extract::{PathParam, ValidatedJson},
        users::{CreateVehicleRequest, UpdateProfileRequest},
    },
};

/// Returns the current user's profile.
pub async fn get_profile(Extension(identity): Extension<Identity>) -> Response {
    ApiResponse::success()
        .data(UserData { user: identity })
        .into_response()
}

pub async fn update_profile(
    Extension(identity): Extension<Identity>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Response {
    tracing::debug!("Profile update for {}: {:?}", identity.id, payload);
    not_implemented("Update profile")
}

/// Public profile of an active user.
pub async fn get_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
) -> Result<Response> {
    let identity = state
        .store
        .find_by_id(user_id, Lookup::ActiveOnly)
        .await?
        .ok_or_else(|| AppError::status(StatusCode::NOT_FOUND, "User not found"))?;

    Ok(ApiResponse::success()
        .data(UserData { user: identity })
        .into_response())
}

pub async fn user_reviews(PathParam(user_id): PathParam<i64>) -> Response {
    tracing::debug!("Reviews of {} requested", user_id);
    not_implemented("Get user reviews")
}

pub async fn user_vehicles(PathParam(user_id): PathParam<i64>) -> Response {
    tracing::debug!("Vehicles of {} requested", user_id);
    not_implemented("Get user vehicles")
}

pub async fn add_vehicle(
    Extension(identity): Extension<Identity>,
    ValidatedJson(payload): ValidatedJson<CreateVehicleRequest>,
) -> Response {
    tracing::debug!("🚙 Vehicle for {}: {:?}", identity.id, payload);
    not_implemented("Add vehicle")
}

pub async fn update_vehicle(
    Extension(identity): Extension<Identity>,
    PathParam(vehicle_id): PathParam<i64>,
) -> Response {
    tracing::debug!("Vehicle {} update by {}", vehicle_id, identity.id);
    not_implemented("Update vehicle")
}

pub async fn delete_vehicle(
    Extension(identity): Extension<Identity>,
    PathParam(vehicle_id): PathParam<i64>,
) -> Response {
    tracing::debug!("Vehicle {} delete by {}", vehicle_id, identity.id);
    not_implemented("Delete vehicle")
}
