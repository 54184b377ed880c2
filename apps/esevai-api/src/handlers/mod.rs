//! HTTP handlers for the e-Sevai API

pub mod catalog;
pub mod esign;
pub mod messages;
pub mod payments;
pub mod requests;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}
