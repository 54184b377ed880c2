//! Service catalog browsing and seeding

use axum::{
    extract::{Path, Query, State},
    Json,
};
use esevai_types::{Service, ServiceCategory};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{DbCategory, DbService, ServiceFilter};
use crate::seed::{seed_catalog, SeedReport};
use crate::state::AppState;

const SERVICE_COLUMNS: &str = "code, name, description, category_id, price, required_documents_json, processing_days";

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ServiceCategory>>, ApiError> {
    let rows: Vec<DbCategory> = sqlx::query_as(
        "SELECT id, name, description, icon FROM service_categories ORDER BY name",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(ServiceCategory::from).collect()))
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ServiceFilter>,
) -> Result<Json<Vec<Service>>, ApiError> {
    let rows: Vec<DbService> = match filter.category.as_deref() {
        Some(category) => {
            sqlx::query_as(&format!(
                "SELECT {} FROM services WHERE category_id = ? ORDER BY name",
                SERVICE_COLUMNS
            ))
            .bind(category)
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as(&format!(
                "SELECT {} FROM services ORDER BY category_id, name",
                SERVICE_COLUMNS
            ))
            .fetch_all(&state.db)
            .await?
        }
    };

    rows.into_iter()
        .map(Service::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map(Json)
}

/// Look up a service by code
pub async fn find_service(state: &AppState, code: &str) -> Result<Service, ApiError> {
    let row: Option<DbService> = sqlx::query_as(&format!(
        "SELECT {} FROM services WHERE code = ?",
        SERVICE_COLUMNS
    ))
    .bind(code)
    .fetch_optional(&state.db)
    .await?;

    row.ok_or_else(|| ApiError::not_found("Service", code))?
        .try_into()
}

pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Service>, ApiError> {
    find_service(&state, &code).await.map(Json)
}

/// Upsert the built-in catalog; safe to call repeatedly
pub async fn seed(State(state): State<Arc<AppState>>) -> Result<Json<SeedReport>, ApiError> {
    Ok(Json(seed_catalog(&state.db).await?))
}
