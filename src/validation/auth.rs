use garde::Validate;
use serde::Deserialize;

use super::rules::{not_blank, optional_phone};

/// The request payload for user registration.
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 6, max = 128))]
    pub password: String,
    #[garde(custom(not_blank))]
    pub first_name: String,
    #[garde(custom(not_blank))]
    pub last_name: String,
    #[garde(custom(optional_phone))]
    pub phone: Option<String>,
}

/// The request payload for user login.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(email)]
    pub email: String,
    #[garde(custom(not_blank))]
    pub password: String,
}

/// The request payload for changing a user's password.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[garde(custom(not_blank))]
    pub current_password: String,
    #[garde(length(min = 6, max = 128))]
    pub new_password: String,
}
