// API routes and handlers

pub mod auth;
pub mod health;
pub mod progress;
pub mod routes;
pub mod routines;

pub use routes::{create_routes, AppState};
