//! Users and service requests

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use esevai_types::{new_id, RequestStatus, ServiceRequest, User, UserRole};
use sqlx::SqlitePool;
use std::sync::Arc;

use super::catalog::find_service;
use crate::error::{conflict_on_unique, ApiError};
use crate::models::{
    CreateServiceRequest, CreateUserRequest, DbServiceRequest, DbUser, UpdateRequestStatus,
};
use crate::state::AppState;

const REQUEST_COLUMNS: &str = "id, user_id, service_code, status, documents_json, output_document_json, notes, created_at, updated_at";

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Internal(e.into()))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();
    if name.is_empty() {
        return Err(ApiError::InvalidRequest("Name must not be empty".into()));
    }
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(ApiError::InvalidRequest(format!("Invalid email: {}", email)));
    }

    let user = User {
        id: new_id(),
        name: name.to_string(),
        email,
        phone: req.phone.filter(|p| !p.trim().is_empty()),
        role: req.role.unwrap_or(UserRole::Customer),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO users (id, name, email, phone, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(user.role.as_str())
    .bind(user.created_at)
    .execute(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, "User with this email"))?;

    tracing::info!("Created user {} ({})", user.id, user.role.as_str());
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn find_user(state: &AppState, id: &str) -> Result<User, ApiError> {
    let row: Option<DbUser> =
        sqlx::query_as("SELECT id, name, email, phone, role, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    row.ok_or_else(|| ApiError::not_found("User", id))?
        .try_into()
}

pub async fn find_request(state: &AppState, id: &str) -> Result<ServiceRequest, ApiError> {
    let row: Option<DbServiceRequest> = sqlx::query_as(&format!(
        "SELECT {} FROM service_requests WHERE id = ?",
        REQUEST_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&state.db)
    .await?;
    row.ok_or_else(|| ApiError::not_found("Request", id))?
        .try_into()
}

/// Submit a new service request. Paid services start in PAYMENT_PENDING.
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceRequest>), ApiError> {
    let user = find_user(&state, &req.user_id).await?;
    let service = find_service(&state, &req.service_code).await?;

    let now = Utc::now();
    let request = ServiceRequest {
        id: new_id(),
        user_id: user.id,
        status: ServiceRequest::initial_status(&service),
        service_code: service.code,
        documents: req.documents,
        output_document: None,
        notes: req.notes,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO service_requests (id, user_id, service_code, status, documents_json, output_document_json, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, NULL, ?, ?, ?)
        "#,
    )
    .bind(&request.id)
    .bind(&request.user_id)
    .bind(&request.service_code)
    .bind(request.status.as_str())
    .bind(to_json(&request.documents)?)
    .bind(&request.notes)
    .bind(request.created_at)
    .bind(request.updated_at)
    .execute(&state.db)
    .await?;

    tracing::info!(
        "Created request {} for service {} (status {})",
        request.id,
        request.service_code,
        request.status
    );
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ServiceRequest>, ApiError> {
    find_request(&state, &id).await.map(Json)
}

pub async fn list_user_requests(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ServiceRequest>>, ApiError> {
    find_user(&state, &user_id).await?;

    let rows: Vec<DbServiceRequest> = sqlx::query_as(&format!(
        "SELECT {} FROM service_requests WHERE user_id = ? ORDER BY created_at DESC",
        REQUEST_COLUMNS
    ))
    .bind(&user_id)
    .fetch_all(&state.db)
    .await?;

    rows.into_iter()
        .map(ServiceRequest::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map(Json)
}

/// Write a status change, provided the stored status is still `previous`.
/// A concurrent writer that got there first turns this into a 409.
pub(crate) async fn save_status_change(
    db: &SqlitePool,
    request: &ServiceRequest,
    previous: RequestStatus,
) -> Result<(), ApiError> {
    let output_json = request.output_document.as_ref().map(to_json).transpose()?;

    let result = sqlx::query(
        r#"
        UPDATE service_requests
        SET status = ?, output_document_json = ?, notes = ?, updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(request.status.as_str())
    .bind(output_json)
    .bind(&request.notes)
    .bind(request.updated_at)
    .bind(&request.id)
    .bind(previous.as_str())
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict(format!(
            "Request {} is no longer {}",
            request.id, previous
        )));
    }
    Ok(())
}

/// Change a request's status; closed requests reject any other status
pub async fn update_request_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequestStatus>,
) -> Result<Json<ServiceRequest>, ApiError> {
    let mut request = find_request(&state, &id).await?;

    if !request.status.can_transition_to(req.status) {
        return Err(ApiError::InvalidRequestTransition {
            from: request.status,
            to: req.status,
        });
    }

    let previous = request.status;
    request.status = req.status;
    if req.output_document.is_some() {
        request.output_document = req.output_document;
    }
    if req.notes.is_some() {
        request.notes = req.notes;
    }
    request.updated_at = Utc::now();

    save_status_change(&state.db, &request, previous).await?;

    tracing::info!("Request {}: {} -> {}", request.id, previous, request.status);
    Ok(Json(request))
}
