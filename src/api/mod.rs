//! API Module - HTTP Surface
//!
//! Axum routes, handlers, middleware and the request/response envelope.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
