//! Request and payment status enums
//!
//! Both serialize as SCREAMING_SNAKE_CASE and round-trip through
//! `Display`/`FromStr`, which is how they are stored as TEXT columns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} status: {value}")]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}

/// Lifecycle of a citizen's service request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    PaymentPending,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Pending,
        RequestStatus::PaymentPending,
        RequestStatus::InProgress,
        RequestStatus::Completed,
        RequestStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::PaymentPending => "PAYMENT_PENDING",
            RequestStatus::InProgress => "IN_PROGRESS",
            RequestStatus::Completed => "COMPLETED",
            RequestStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }

    /// Any move is allowed until the request is closed; re-applying the
    /// current status is always a no-op success.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        self == next || !self.is_terminal()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                kind: "request",
                value: s.to_string(),
            })
    }
}

/// Payment record status as reported back from the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Created,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Created,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Created => "CREATED",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }

    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        match (self, next) {
            (a, b) if a == b => true,
            (PaymentStatus::Created, _) => true,
            (PaymentStatus::Paid, PaymentStatus::Refunded) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                kind: "payment",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_serde_matches_display() {
        for status in RequestStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
            assert_eq!(status.to_string().parse::<RequestStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_payment_status_serde_matches_display() {
        for status in PaymentStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }

    #[test]
    fn test_unknown_status_is_error() {
        let err = "DONE".parse::<RequestStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown request status: DONE");
        assert!("paid".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_terminal_requests_stay_closed() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::InProgress));
        assert!(RequestStatus::InProgress.can_transition_to(RequestStatus::Pending));
        assert!(RequestStatus::Completed.can_transition_to(RequestStatus::Completed));
        assert!(!RequestStatus::Completed.can_transition_to(RequestStatus::InProgress));
        assert!(!RequestStatus::Cancelled.can_transition_to(RequestStatus::Pending));
    }

    #[test]
    fn test_payment_transitions() {
        assert!(PaymentStatus::Created.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::Created.can_transition_to(PaymentStatus::Failed));
        assert!(PaymentStatus::Paid.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Refunded.can_transition_to(PaymentStatus::Paid));
        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Paid));
    }
}
