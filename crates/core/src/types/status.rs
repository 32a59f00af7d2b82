//! Status enums reported by the backend.
//!
//! Backend values are lowercase strings. Anything unrecognized maps to
//! `Unknown` so a new backend state never breaks the order history page.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    #[serde(alias = "canceled")]
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Human readable label for templates.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the order can still change.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Processing | Self::Shipped)
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Refunded,
    Failed,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Human readable label for templates.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unpaid => "Awaiting payment",
            Self::Paid => "Paid",
            Self::Refunded => "Refunded",
            Self::Failed => "Payment failed",
            Self::Unknown => "Unknown",
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    #[serde(alias = "customer")]
    User,
    Admin,
    #[serde(other)]
    Unknown,
}

impl UserRole {
    /// Human readable label for templates.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "Customer",
            Self::Admin => "Administrator",
            Self::Unknown => "Member",
        }
    }
}
