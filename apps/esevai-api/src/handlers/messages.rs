//! Conversation thread attached to a service request

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use esevai_types::{new_id, Message};
use std::sync::Arc;

use super::requests::find_request;
use crate::error::ApiError;
use crate::models::{CreateMessageRequest, DbMessage};
use crate::state::AppState;

const MAX_MESSAGE_CHARS: usize = 4000;

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let body = req.body.trim();
    if body.is_empty() {
        return Err(ApiError::InvalidRequest("Message body must not be empty".into()));
    }
    if body.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::InvalidRequest(format!(
            "Message body exceeds {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    find_request(&state, &request_id).await?;

    let message = Message {
        id: new_id(),
        request_id,
        sender_id: req.sender_id,
        body: body.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO messages (id, request_id, sender_id, body, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&message.id)
    .bind(&message.request_id)
    .bind(&message.sender_id)
    .bind(&message.body)
    .bind(message.created_at)
    .execute(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Messages on a request, oldest first
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    find_request(&state, &request_id).await?;

    let rows: Vec<DbMessage> = sqlx::query_as(
        r#"
        SELECT id, request_id, sender_id, body, created_at
        FROM messages
        WHERE request_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(&request_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(Message::from).collect()))
}
