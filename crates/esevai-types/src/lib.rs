//! Shared e-Sevai record types
//!
//! Plain CRUD records for the citizen-services portal, the two status
//! lifecycles (requests and payments), and the static catalog seeded into
//! storage on startup.

pub mod catalog;
pub mod models;
pub mod status;

pub use models::{
    new_id, DocumentRef, GatewayPaymentResponse, Message, Payment, Service, ServiceCategory,
    ServiceRequest, User, UserRole,
};
pub use status::{ParseStatusError, PaymentStatus, RequestStatus};
