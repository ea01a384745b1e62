//! HTTP layer of the Shelf server: gatekeeping middleware, session cookies
//! and the routes they protect.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod telemetry;

pub use app::{configure_routes, create_app, Gatekeeper};
