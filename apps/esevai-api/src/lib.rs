//! e-Sevai API Server - Backend for the citizen services portal
//!
//! Provides REST endpoints for:
//! - Service catalog browsing and seeding
//! - Users, service requests and their status lifecycle
//! - Payment records and request messages
//! - E-signing output PDFs

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod seed;
pub mod state;

use handlers::{catalog, esign, messages, payments, requests};
use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = if state.config.cors_allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Catalog
        .route("/api/categories", get(catalog::list_categories))
        .route("/api/services", get(catalog::list_services))
        .route("/api/services/:code", get(catalog::get_service))
        .route("/api/admin/seed", post(catalog::seed))
        // Users and requests
        .route("/api/users", post(requests::create_user))
        .route("/api/users/:id/requests", get(requests::list_user_requests))
        .route("/api/requests", post(requests::create_request))
        .route("/api/requests/:id", get(requests::get_request))
        .route("/api/requests/:id/status", patch(requests::update_request_status))
        .route(
            "/api/requests/:id/messages",
            get(messages::list_messages).post(messages::post_message),
        )
        // Payments
        .route("/api/payments", post(payments::create_payment))
        .route(
            "/api/payments/:id",
            get(payments::get_payment).patch(payments::update_payment),
        )
        // E-sign
        .route("/api/esign", post(esign::esign))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory state and fixtures for handler-level tests

    use axum::{extract::State, Json};
    use esevai_types::{new_id, ServiceRequest};
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;

    use crate::config::Config;
    use crate::handlers::requests::{create_request, create_user};
    use crate::models::{CreateServiceRequest, CreateUserRequest};
    use crate::seed::seed_catalog;
    use crate::state::AppState;

    /// Fresh migrated and seeded database
    pub async fn memory_state() -> Arc<AppState> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let state = AppState::with_pool(pool, Config::default()).await.unwrap();
        seed_catalog(&state.db).await.unwrap();
        Arc::new(state)
    }

    /// New user with one request for `service_code`
    pub async fn submit_request(state: &Arc<AppState>, service_code: &str) -> ServiceRequest {
        let (_, Json(user)) = create_user(
            State(state.clone()),
            Json(CreateUserRequest {
                name: "Meena K".into(),
                email: format!("{}@example.com", new_id()),
                phone: None,
                role: None,
            }),
        )
        .await
        .unwrap();

        let (_, Json(request)) = create_request(
            State(state.clone()),
            Json(CreateServiceRequest {
                user_id: user.id,
                service_code: service_code.into(),
                documents: Vec::new(),
                notes: None,
            }),
        )
        .await
        .unwrap();
        request
    }
}
