//! Booking routes. All of them need an authenticated user; none has a
//! controller yet.

use axum::{response::Response, Extension};

use crate::{
    models::user::Identity,
    response::not_implemented,
    validation::{
        bookings::{CancelBookingRequest, CreateBookingRequest},
        extract::{PathParam, ValidatedJson},
    },
};

pub async fn list_bookings(Extension(identity): Extension<Identity>) -> Response {
    tracing::debug!("Bookings of {} requested", identity.id);
    not_implemented("Get user bookings")
}

pub async fn get_booking(
    Extension(identity): Extension<Identity>,
    PathParam(booking_id): PathParam<i64>,
) -> Response {
    tracing::debug!("Booking {} requested by {}", booking_id, identity.id);
    not_implemented("Get booking")
}

pub async fn create_booking(
    Extension(identity): Extension<Identity>,
    ValidatedJson(payload): ValidatedJson<CreateBookingRequest>,
) -> Response {
    tracing::debug!("🎫 Booking request from {}: {:?}", identity.id, payload);
    not_implemented("Create booking")
}

pub async fn confirm_booking(
    Extension(identity): Extension<Identity>,
    PathParam(booking_id): PathParam<i64>,
) -> Response {
    tracing::debug!("Booking {} confirm by {}", booking_id, identity.id);
    not_implemented("Confirm booking")
}

pub async fn cancel_booking(
    Extension(identity): Extension<Identity>,
    PathParam(booking_id): PathParam<i64>,
    ValidatedJson(payload): ValidatedJson<CancelBookingRequest>,
) -> Response {
    tracing::debug!(
        "Booking {} cancel by {}: {:?}",
        booking_id,
        identity.id,
        payload.cancellation_reason
    );
    not_implemented("Cancel booking")
}

pub async fn complete_booking(
    Extension(identity): Extension<Identity>,
    PathParam(booking_id): PathParam<i64>,
) -> Response {
    tracing::debug!("Booking {} complete by {}", booking_id, identity.id);
    not_implemented("Complete booking")
}

pub async fn ride_bookings(
    Extension(identity): Extension<Identity>,
    PathParam(ride_id): PathParam<i64>,
) -> Response {
    tracing::debug!("Bookings for ride {} requested by {}", ride_id, identity.id);
    not_implemented("Get ride bookings")
}
