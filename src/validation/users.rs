use chrono::NaiveDate;
use garde::Validate;
use serde::Deserialize;

use super::rules::{not_blank, optional_not_blank, optional_phone, vehicle_year};

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[garde(custom(optional_not_blank))]
    pub first_name: Option<String>,
    #[garde(custom(optional_not_blank))]
    pub last_name: Option<String>,
    #[garde(custom(optional_phone))]
    pub phone: Option<String>,
    #[garde(skip)]
    pub bio: Option<String>,
    #[garde(skip)]
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[garde(custom(not_blank))]
    pub make: String,
    #[garde(custom(not_blank))]
    pub model: String,
    #[garde(custom(vehicle_year))]
    pub year: i32,
    #[garde(custom(not_blank))]
    pub license_plate: String,
    #[garde(range(min = 1, max = 8))]
    pub seats: i32,
    #[garde(skip)]
    pub color: Option<String>,
}
