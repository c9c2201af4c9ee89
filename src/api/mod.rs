//! API Module
//! Mission: Route wiring and request handlers for the REST surface

pub mod admin;
pub mod followships;
pub mod replies;
pub mod routes;
pub mod tweets;
pub mod users;

pub use routes::{create_router, AppState};
