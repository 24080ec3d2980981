//! HTTP API application wiring (axum router + service wiring).
//!
//! - `services.rs`: store backends + reconciliation service wiring
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use stockroom_auth::Hs256JwtValidator;

use crate::middleware::AuthState;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, build_services};

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: AppServices, jwt_secret: String) -> Router {
    let auth_state = AuthState {
        jwt: Arc::new(Hs256JwtValidator::new(jwt_secret)),
    };

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/orders", routes::orders::router(auth_state.clone()))
        .nest("/products", routes::products::router(auth_state))
        .layer(Extension(Arc::new(services)))
}
