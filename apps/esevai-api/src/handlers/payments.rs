//! Payment records for paid service requests
//!
//! The gateway itself is driven by the browser; these endpoints only store
//! the order and the order/payment/signature triple it reports back.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use esevai_types::{new_id, Payment, PaymentStatus, RequestStatus};
use sqlx::SqlitePool;
use std::sync::Arc;

use super::catalog::find_service;
use super::requests::find_request;
use crate::error::ApiError;
use crate::models::{CreatePaymentRequest, DbPayment, UpdatePaymentRequest};
use crate::state::AppState;

const CURRENCY: &str = "INR";

async fn find_payment(state: &AppState, id: &str) -> Result<Payment, ApiError> {
    let row: Option<DbPayment> = sqlx::query_as(
        r#"
        SELECT id, request_id, user_id, amount, currency, status, gateway_order_id,
               gateway_payment_id, gateway_signature, created_at, updated_at
        FROM payments
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?;
    row.ok_or_else(|| ApiError::not_found("Payment", id))?
        .try_into()
}

/// Open a payment for a request, charged at the service's price
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let request = find_request(&state, &req.request_id).await?;
    if request.status != RequestStatus::PaymentPending {
        return Err(ApiError::Conflict(format!(
            "Request {} is {}, not awaiting payment",
            request.id, request.status
        )));
    }

    let service = find_service(&state, &request.service_code).await?;
    if service.is_free() {
        return Err(ApiError::InvalidRequest(format!(
            "Service {} has no fee",
            service.code
        )));
    }

    let now = Utc::now();
    let payment = Payment {
        id: new_id(),
        request_id: request.id,
        user_id: request.user_id,
        amount: service.price,
        currency: CURRENCY.to_string(),
        status: PaymentStatus::Created,
        gateway_order_id: req.gateway_order_id,
        gateway_payment_id: None,
        gateway_signature: None,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO payments (id, request_id, user_id, amount, currency, status, gateway_order_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.request_id)
    .bind(&payment.user_id)
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(payment.status.as_str())
    .bind(&payment.gateway_order_id)
    .bind(payment.created_at)
    .bind(payment.updated_at)
    .execute(&state.db)
    .await?;

    tracing::info!(
        "Created payment {} for request {}: {} paise",
        payment.id,
        payment.request_id,
        payment.amount
    );
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    find_payment(&state, &id).await.map(Json)
}

/// Write a payment update, provided the stored status is still `previous`.
/// Reaching PAID also releases a PAYMENT_PENDING request, in the same
/// transaction.
pub(crate) async fn save_payment_update(
    db: &SqlitePool,
    payment: &Payment,
    previous: PaymentStatus,
) -> Result<(), ApiError> {
    let mut tx = db.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE payments
        SET status = ?, gateway_order_id = ?, gateway_payment_id = ?, gateway_signature = ?, updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(payment.status.as_str())
    .bind(&payment.gateway_order_id)
    .bind(&payment.gateway_payment_id)
    .bind(&payment.gateway_signature)
    .bind(payment.updated_at)
    .bind(&payment.id)
    .bind(previous.as_str())
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        // Dropping tx rolls back
        return Err(ApiError::Conflict(format!(
            "Payment {} is no longer {}",
            payment.id, previous
        )));
    }

    if payment.status == PaymentStatus::Paid && previous != PaymentStatus::Paid {
        let released = sqlx::query(
            "UPDATE service_requests SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(RequestStatus::InProgress.as_str())
        .bind(payment.updated_at)
        .bind(&payment.request_id)
        .bind(RequestStatus::PaymentPending.as_str())
        .execute(&mut *tx)
        .await?;

        if released.rows_affected() > 0 {
            tracing::info!("Request {} moved to IN_PROGRESS", payment.request_id);
        }
    }

    tx.commit().await?;
    Ok(())
}

/// Record a gateway outcome. A successful payment releases its request
/// from PAYMENT_PENDING into IN_PROGRESS.
pub async fn update_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePaymentRequest>,
) -> Result<Json<Payment>, ApiError> {
    let mut payment = find_payment(&state, &id).await?;

    if !payment.status.can_transition_to(req.status) {
        return Err(ApiError::InvalidPaymentTransition {
            from: payment.status,
            to: req.status,
        });
    }

    let previous = payment.status;
    payment.status = req.status;
    if let Some(gateway) = req.gateway {
        payment.apply_gateway_response(gateway);
    }
    payment.updated_at = Utc::now();

    save_payment_update(&state.db, &payment, previous).await?;

    tracing::info!("Payment {}: {} -> {}", payment.id, previous, payment.status);
    Ok(Json(payment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_state, submit_request};

    #[tokio::test]
    async fn test_stale_payment_write_is_rejected() {
        let state = memory_state().await;
        let request = submit_request(&state, "CERT-INCOME").await;
        let (_, Json(payment)) = create_payment(
            State(state.clone()),
            Json(CreatePaymentRequest {
                request_id: request.id.clone(),
                gateway_order_id: Some("order_1".into()),
            }),
        )
        .await
        .unwrap();

        let mut paid = payment.clone();
        paid.status = PaymentStatus::Paid;
        save_payment_update(&state.db, &paid, PaymentStatus::Created)
            .await
            .unwrap();

        // A racing FAILED update that read CREATED before PAID landed
        let mut failed = payment.clone();
        failed.status = PaymentStatus::Failed;
        let result = save_payment_update(&state.db, &failed, PaymentStatus::Created).await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));

        let stored = find_payment(&state, &payment.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Paid);
        let stored_request = find_request(&state, &request.id).await.unwrap();
        assert_eq!(stored_request.status, RequestStatus::InProgress);
    }

    #[tokio::test]
    async fn test_rejected_payment_write_leaves_request_alone() {
        let state = memory_state().await;
        let request = submit_request(&state, "BILL-EB").await;
        let (_, Json(payment)) = create_payment(
            State(state.clone()),
            Json(CreatePaymentRequest {
                request_id: request.id.clone(),
                gateway_order_id: None,
            }),
        )
        .await
        .unwrap();

        // Stored status is CREATED, so a write expecting FAILED must not apply
        let mut paid = payment.clone();
        paid.status = PaymentStatus::Paid;
        let result = save_payment_update(&state.db, &paid, PaymentStatus::Failed).await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));

        let stored_request = find_request(&state, &request.id).await.unwrap();
        assert_eq!(stored_request.status, RequestStatus::PaymentPending);
    }
}
