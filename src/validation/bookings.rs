use garde::Validate;
use serde::Deserialize;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[garde(range(min = 1))]
    pub ride_id: i64,
    #[garde(range(min = 1))]
    pub seats_booked: i32,
    #[garde(skip)]
    pub pickup_location: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CancelBookingRequest {
    #[garde(skip)]
    pub cancellation_reason: Option<String>,
}
