//! Order and payment status enums.
//!
//! Orders move forward through a fixed fulfilment chain:
//!
//! ```text
//! PENDING -> CONFIRMED -> PROCESSING -> SHIPPED -> DELIVERED
//!    \___________\____________\___________\______> CANCELLED
//! ```
//!
//! Admins may skip forward (a phone order can go straight from `PENDING` to
//! `SHIPPED`) but never backward, and `DELIVERED` / `CANCELLED` are final.
//! Status changes never touch stock.

use serde::{Deserialize, Serialize};

/// Errors for status parsing and transitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusTransitionError {
    /// The target state is not reachable from the current one.
    #[error("cannot change order status from {from} to {to}")]
    NotAllowed {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },
    /// The string is not a known status.
    #[error("unknown status: {0}")]
    Unknown(String),
}

/// Order fulfilment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.order_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Position along the fulfilment chain. `None` for `Cancelled`.
    const fn rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Processing => Some(2),
            Self::Shipped => Some(3),
            Self::Delivered => Some(4),
            Self::Cancelled => None,
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether an admin may move an order from `self` to `next`.
    ///
    /// Setting the current status again is accepted as a no-op.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }

    /// Validate a transition, returning the new status.
    ///
    /// # Errors
    ///
    /// Returns `StatusTransitionError::NotAllowed` for backward moves and
    /// for any change out of a terminal state.
    pub fn transition_to(self, next: Self) -> Result<Self, StatusTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StatusTransitionError::NotAllowed {
                from: self,
                to: next,
            })
        }
    }

    /// Wire/database spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusTransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StatusTransitionError::Unknown(s.to_owned()))
    }
}

/// Payment state of an order. Cash on delivery starts unpaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.payment_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Failed,
}

impl PaymentStatus {
    /// Wire/database spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = StatusTransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNPAID" => Ok(Self::Unpaid),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            _ => Err(StatusTransitionError::Unknown(s.to_owned())),
        }
    }
}

/// How the customer pays. Only cash on delivery is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "storefront.payment_method"))]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "COD")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "COD"))]
    CashOnDelivery,
}

impl PaymentMethod {
    /// Label shown to customers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on Delivery",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        // skipping ahead
        assert!(Pending.can_transition_to(Shipped));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        use OrderStatus::*;
        assert!(!Shipped.can_transition_to(Pending));
        assert!(!Processing.can_transition_to(Confirmed));
        assert_eq!(
            Shipped.transition_to(Confirmed),
            Err(StatusTransitionError::NotAllowed {
                from: Shipped,
                to: Confirmed,
            })
        );
    }

    #[test]
    fn test_cancel_from_any_open_state() {
        for status in OrderStatus::ALL {
            let allowed = status.can_transition_to(OrderStatus::Cancelled);
            assert_eq!(allowed, status != OrderStatus::Delivered, "{status}");
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_same_status_is_noop() {
        for status in OrderStatus::ALL {
            assert_eq!(status.transition_to(status), Ok(status));
        }
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(OrderStatus::Processing.to_string(), "PROCESSING");
        assert!("LOST".parse::<OrderStatus>().is_err());
        assert_eq!("Paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
    }

    #[test]
    fn test_serde_spelling() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"COD\""
        );
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
    }
}
