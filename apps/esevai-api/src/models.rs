//! Database rows and API request/response bodies

use chrono::{DateTime, Utc};
use esevai_types::{
    DocumentRef, GatewayPaymentResponse, Message, Payment, PaymentStatus, RequestStatus, Service,
    ServiceCategory, ServiceRequest, User, UserRole,
};
use esign_utils::Viewport;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ApiError;

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str, column: &str) -> Result<T, ApiError> {
    serde_json::from_str(raw)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Bad JSON in {}: {}", column, e)))
}

#[derive(Debug, Clone, FromRow)]
pub struct DbCategory {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl From<DbCategory> for ServiceCategory {
    fn from(row: DbCategory) -> Self {
        ServiceCategory {
            id: row.id,
            name: row.name,
            description: row.description,
            icon: row.icon,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbService {
    pub code: String,
    pub name: String,
    pub description: String,
    pub category_id: String,
    pub price: i64,
    pub required_documents_json: String,
    pub processing_days: i64,
}

impl TryFrom<DbService> for Service {
    type Error = ApiError;

    fn try_from(row: DbService) -> Result<Self, Self::Error> {
        Ok(Service {
            required_documents: parse_json(&row.required_documents_json, "required_documents_json")?,
            code: row.code,
            name: row.name,
            description: row.description,
            category_id: row.category_id,
            price: row.price,
            processing_days: row.processing_days.max(0) as u32,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = ApiError;

    fn try_from(row: DbUser) -> Result<Self, Self::Error> {
        let role = UserRole::parse(&row.role).ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("Unknown role {} for user {}", row.role, row.id))
        })?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbServiceRequest {
    pub id: String,
    pub user_id: String,
    pub service_code: String,
    pub status: String,
    pub documents_json: String,
    pub output_document_json: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbServiceRequest> for ServiceRequest {
    type Error = ApiError;

    fn try_from(row: DbServiceRequest) -> Result<Self, Self::Error> {
        let output_document = row
            .output_document_json
            .as_deref()
            .map(|raw| parse_json(raw, "output_document_json"))
            .transpose()?;
        Ok(ServiceRequest {
            status: row.status.parse::<RequestStatus>()?,
            documents: parse_json(&row.documents_json, "documents_json")?,
            output_document,
            id: row.id,
            user_id: row.user_id,
            service_code: row.service_code,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbPayment {
    pub id: String,
    pub request_id: String,
    pub user_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbPayment> for Payment {
    type Error = ApiError;

    fn try_from(row: DbPayment) -> Result<Self, Self::Error> {
        Ok(Payment {
            status: row.status.parse::<PaymentStatus>()?,
            id: row.id,
            request_id: row.request_id,
            user_id: row.user_id,
            amount: row.amount,
            currency: row.currency,
            gateway_order_id: row.gateway_order_id,
            gateway_payment_id: row.gateway_payment_id,
            gateway_signature: row.gateway_signature,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbMessage {
    pub id: String,
    pub request_id: String,
    pub sender_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbMessage> for Message {
    fn from(row: DbMessage) -> Self {
        Message {
            id: row.id,
            request_id: row.request_id,
            sender_id: row.sender_id,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

/// Query string for the service listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceFilter {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceRequest {
    pub user_id: String,
    pub service_code: String,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequestStatus {
    pub status: RequestStatus,
    #[serde(default)]
    pub output_document: Option<DocumentRef>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub request_id: String,
    #[serde(default)]
    pub gateway_order_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentRequest {
    pub status: PaymentStatus,
    #[serde(default)]
    pub gateway: Option<GatewayPaymentResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessageRequest {
    pub sender_id: String,
    pub body: String,
}

/// One signature image in an e-sign request
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureInput {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub viewport: Option<Viewport>,
    /// `data:image/png;base64,...` URL or bare base64
    pub image: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct EsignRequest {
    pub pdf_base64: String,
    pub signatures: Vec<SignatureInput>,
    #[serde(default = "default_true")]
    pub timestamp: bool,
    #[serde(default)]
    pub signer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsignResponse {
    pub pdf_base64: String,
    /// Hex SHA-256 of the signed PDF
    pub sha256: String,
    pub page_count: u32,
    pub signatures_applied: usize,
}
