use chrono::{DateTime, NaiveDate, Utc};
use garde::Validate;
use serde::Deserialize;

use super::rules::not_blank;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRideRequest {
    #[garde(range(min = 1))]
    pub vehicle_id: i64,
    #[garde(custom(not_blank))]
    pub origin: String,
    #[garde(custom(not_blank))]
    pub destination: String,
    #[garde(skip)]
    pub departure_time: DateTime<Utc>,
    #[garde(range(min = 1, max = 8))]
    pub available_seats: i32,
    #[garde(range(min = 0.0))]
    pub price_per_seat: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchRidesQuery {
    #[garde(skip)]
    pub origin: Option<String>,
    #[garde(skip)]
    pub destination: Option<String>,
    #[garde(skip)]
    pub date: Option<NaiveDate>,
    #[garde(range(min = 1))]
    pub seats: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_must_fit_a_car() {
        let ride: CreateRideRequest = serde_json::from_value(serde_json::json!({
            "vehicle_id": 3,
            "origin": "Porto",
            "destination": "Lisboa",
            "departure_time": "2030-05-01T08:00:00Z",
            "available_seats": 9,
            "price_per_seat": 12.5,
        }))
        .unwrap();
        assert!(ride.validate().is_err());
    }

    #[test]
    fn empty_search_is_valid() {
        let query: SearchRidesQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(query.validate().is_ok());

        let query: SearchRidesQuery =
            serde_json::from_value(serde_json::json!({ "seats": 0 })).unwrap();
        assert!(query.validate().is_err());
    }
}
