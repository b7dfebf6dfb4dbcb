pub mod auth;
mod bookings;
pub mod error;
mod flights;
mod validation;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Plain `{message}` acknowledgement body.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Flight mutations are admin-only multipart routes. The body limit is
    // raised past the logo cap so oversized uploads reach the handler's own
    // size check instead of axum's default 2 MB cut-off.
    let flight_admin_routes = Router::new()
        .route("/", post(flights::create_flight))
        .route("/:id", put(flights::update_flight))
        .route("/:id", delete(flights::delete_flight))
        .layer(DefaultBodyLimit::max(flights::MAX_LOGO_BYTES + 64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let flight_routes = Router::new()
        .route("/", get(flights::list_flights))
        .merge(flight_admin_routes);

    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .route("/", get(bookings::list_bookings))
        .route("/:id", put(bookings::update_booking))
        .route("/:id", delete(bookings::cancel_booking))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    // Allow requests from any origin, matching the browser front end's needs
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/flights", flight_routes)
        .nest("/api/bookings", booking_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
