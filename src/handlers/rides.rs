//! Ride routes. The controllers are not written yet; each route runs its auth
//! and validation and then answers 501.

use axum::{response::Response, Extension};

use crate::{
    middleware_layer::auth::Viewer,
    models::user::Identity,
    response::not_implemented,
    validation::{
        extract::{PathParam, ValidatedJson, ValidatedQuery},
        rides::{CreateRideRequest, SearchRidesQuery},
    },
};

pub async fn search_rides(
    Viewer(viewer): Viewer,
    ValidatedQuery(query): ValidatedQuery<SearchRidesQuery>,
) -> Response {
    tracing::debug!(
        "🔎 Ride search {:?} by {:?}",
        query,
        viewer.map(|identity| identity.id)
    );
    not_implemented("Search rides")
}

pub async fn get_ride(PathParam(ride_id): PathParam<i64>) -> Response {
    tracing::debug!("Ride {} requested", ride_id);
    not_implemented("Get ride")
}

pub async fn create_ride(
    Extension(identity): Extension<Identity>,
    ValidatedJson(payload): ValidatedJson<CreateRideRequest>,
) -> Response {
    tracing::debug!("🚗 Ride offer from {}: {:?}", identity.id, payload);
    not_implemented("Create ride")
}

pub async fn update_ride(
    Extension(identity): Extension<Identity>,
    PathParam(ride_id): PathParam<i64>,
) -> Response {
    tracing::debug!("Ride {} update by {}", ride_id, identity.id);
    not_implemented("Update ride")
}

pub async fn delete_ride(
    Extension(identity): Extension<Identity>,
    PathParam(ride_id): PathParam<i64>,
) -> Response {
    tracing::debug!("Ride {} delete by {}", ride_id, identity.id);
    not_implemented("Delete ride")
}

pub async fn my_rides(Extension(identity): Extension<Identity>) -> Response {
    tracing::debug!("Rides of {} requested", identity.id);
    not_implemented("Get my rides")
}
