//! HTTP API layer for gatherly.
//!
//! - **Endpoints**: accounts, events, the deletion lifecycle, admin tools
//! - **Extractors**: bearer-token authentication, client IP
//! - **Middleware**: token resolution into request extensions
//!
//! Built on Axum 0.8 with Tower middleware.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
