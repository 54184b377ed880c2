//! Portal records

use crate::status::{PaymentStatus, RequestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Grouping shown on the portal landing page (certificates, bills, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
}

/// A government document service a citizen can request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Unique key, e.g. `CERT-INCOME`
    pub code: String,
    pub name: String,
    pub description: String,
    pub category_id: String,
    /// Fee in paise; zero for free services
    pub price: i64,
    pub required_documents: Vec<String>,
    pub processing_days: u32,
}

impl Service {
    pub fn is_free(&self) -> bool {
        self.price == 0
    }

    /// Price formatted as rupees, e.g. `₹60.00`
    pub fn display_price(&self) -> String {
        format!("₹{}.{:02}", self.price / 100, self.price % 100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Operator,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Operator => "operator",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(UserRole::Customer),
            "operator" => Some(UserRole::Operator),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Pointer to a blob held by file storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub storage_id: String,
    pub file_name: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "application/pdf".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: String,
    pub user_id: String,
    pub service_code: String,
    pub status: RequestStatus,
    pub documents: Vec<DocumentRef>,
    pub output_document: Option<DocumentRef>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    /// Status a freshly submitted request starts in
    pub fn initial_status(service: &Service) -> RequestStatus {
        if service.is_free() {
            RequestStatus::Pending
        } else {
            RequestStatus::PaymentPending
        }
    }
}

/// Order/payment/signature triple the payment gateway hands back to the
/// browser after checkout. Stored as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPaymentResponse {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub request_id: String,
    pub user_id: String,
    /// Amount in paise
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn apply_gateway_response(&mut self, response: GatewayPaymentResponse) {
        self.gateway_order_id = Some(response.order_id);
        self.gateway_payment_id = Some(response.payment_id);
        self.gateway_signature = Some(response.signature);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub request_id: String,
    pub sender_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Fresh random identifier for new records
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn service(price: i64) -> Service {
        Service {
            code: "CERT-INCOME".into(),
            name: "Income Certificate".into(),
            description: String::new(),
            category_id: "certificates".into(),
            price,
            required_documents: vec![],
            processing_days: 7,
        }
    }

    #[test]
    fn test_display_price() {
        assert_eq!(service(6000).display_price(), "₹60.00");
        assert_eq!(service(12050).display_price(), "₹120.50");
        assert_eq!(service(0).display_price(), "₹0.00");
    }

    #[test]
    fn test_initial_status_depends_on_price() {
        assert_eq!(
            ServiceRequest::initial_status(&service(0)),
            RequestStatus::Pending
        );
        assert_eq!(
            ServiceRequest::initial_status(&service(6000)),
            RequestStatus::PaymentPending
        );
    }

    #[test]
    fn test_user_role_round_trip() {
        for role in [UserRole::Customer, UserRole::Operator, UserRole::Admin] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
            assert_eq!(
                serde_json::to_string(&role).unwrap(),
                format!("\"{}\"", role.as_str())
            );
        }
        assert_eq!(UserRole::parse("root"), None);
    }

    #[test]
    fn test_document_ref_default_content_type() {
        let doc: DocumentRef =
            serde_json::from_str(r#"{"storage_id":"kg2abc","file_name":"aadhaar.pdf"}"#).unwrap();
        assert_eq!(doc.content_type, "application/pdf");
    }

    #[test]
    fn test_apply_gateway_response() {
        let now = Utc::now();
        let mut payment = Payment {
            id: new_id(),
            request_id: new_id(),
            user_id: new_id(),
            amount: 6000,
            currency: "INR".into(),
            status: PaymentStatus::Created,
            gateway_order_id: None,
            gateway_payment_id: None,
            gateway_signature: None,
            created_at: now,
            updated_at: now,
        };
        payment.apply_gateway_response(GatewayPaymentResponse {
            order_id: "order_1".into(),
            payment_id: "pay_1".into(),
            signature: "sig".into(),
        });
        assert_eq!(payment.gateway_order_id.as_deref(), Some("order_1"));
        assert_eq!(payment.gateway_payment_id.as_deref(), Some("pay_1"));
        assert_eq!(payment.gateway_signature.as_deref(), Some("sig"));
    }
}
