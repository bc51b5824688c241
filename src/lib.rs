pub mod config;
pub mod db;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;

pub mod crypto {
    pub mod token;
}

pub mod models {
    pub mod user;
}

pub mod repositories {
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod session;
}

pub mod handlers {
    pub mod auth;
    pub mod bookings;
    pub mod health;
    pub mod rides;
    pub mod users;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod errors;
}

pub mod validation {
    pub mod auth;
    pub mod bookings;
    pub mod extract;
    pub mod rides;
    pub mod rules;
    pub mod users;
}

pub use config::Config;
pub use routes::build_router;
pub use state::AppState;
