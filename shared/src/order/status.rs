//! Order status state machine (client-side projection)
//!
//! Forward sequence: `pending → claimed → confirmed → delivered`.
//! `cancelled` is terminal and reachable from `pending` or `claimed` only.
//! The backend owns transitions; the client maps whatever status string it
//! receives onto a progress step and decides which actions to offer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status as stored by the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Claimed,
    Confirmed,
    Delivered,
    Cancelled,
}

/// Progress-step presentation for one forward status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderStep {
    pub status: OrderStatus,
    pub label: &'static str,
    pub description: &'static str,
}

/// Forward steps, in display order
pub const ORDER_STEPS: [OrderStep; 4] = [
    OrderStep {
        status: OrderStatus::Pending,
        label: "Order Placed",
        description: "Your order has been received",
    },
    OrderStep {
        status: OrderStatus::Claimed,
        label: "Runner Assigned",
        description: "A runner has claimed your order",
    },
    OrderStep {
        status: OrderStatus::Confirmed,
        label: "Runner En Route",
        description: "Your runner picked up the food and is heading to you",
    },
    OrderStep {
        status: OrderStatus::Delivered,
        label: "Delivered",
        description: "Enjoy your meal!",
    },
];

/// The next status a runner can move an order to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerAction {
    pub label: &'static str,
    pub next: OrderStatus,
}

/// Unrecognized status string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown order status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Confirmed => "confirmed",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Position in the forward sequence; `None` for `cancelled`
    pub fn step_index(&self) -> Option<usize> {
        ORDER_STEPS.iter().position(|s| s.status == *self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Customers may cancel until the food is picked up
    pub fn can_cancel(&self) -> bool {
        matches!(self, Self::Pending | Self::Claimed)
    }

    /// Whether `next` is a legal move from `self`
    ///
    /// Only single forward steps and cancellation from `pending`/`claimed`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if next == Self::Cancelled {
            return self.can_cancel();
        }
        match (self.step_index(), next.step_index()) {
            (Some(from), Some(to)) => to == from + 1,
            _ => false,
        }
    }

    /// Action offered to the runner holding this order
    pub fn runner_action(&self) -> Option<RunnerAction> {
        match self {
            Self::Claimed => Some(RunnerAction {
                label: "Mark Picked Up",
                next: Self::Confirmed,
            }),
            Self::Confirmed => Some(RunnerAction {
                label: "Mark Delivered",
                next: Self::Delivered,
            }),
            _ => None,
        }
    }

    /// Status line shown while the order is in flight
    pub fn waiting_message(&self) -> Option<&'static str> {
        match self {
            Self::Pending => Some("Waiting for a runner to claim your order…"),
            Self::Claimed => Some("Runner is picking up your food…"),
            Self::Confirmed => Some("Runner is on the way to your seat!"),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "claimed" => Ok(Self::Claimed),
            "confirmed" => Ok(Self::Confirmed),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Map a raw backend status string onto a progress step.
///
/// Anything that is not one of the four forward statuses lands on step 0.
pub fn progress_step(status: &str) -> usize {
    status
        .parse::<OrderStatus>()
        .ok()
        .and_then(|s| s.step_index())
        .unwrap_or(0)
}

/// Headline for the confirmation screen
pub fn headline(status: &str) -> &'static str {
    match status.parse::<OrderStatus>() {
        Ok(OrderStatus::Cancelled) => "Order Cancelled",
        Ok(OrderStatus::Delivered) => "Order Delivered!",
        _ => "Order Confirmed!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_step_known() {
        assert_eq!(progress_step("pending"), 0);
        assert_eq!(progress_step("claimed"), 1);
        assert_eq!(progress_step("confirmed"), 2);
        assert_eq!(progress_step("delivered"), 3);
    }

    #[test]
    fn test_progress_step_unknown_defaults_to_zero() {
        for s in ["", "cancelled", "CLAIMED", "refunded", " pending", "delivered!"] {
            assert_eq!(progress_step(s), 0, "status {s:?}");
        }
    }

    #[test]
    fn test_forward_transitions_only() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Claimed));
        assert!(Claimed.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Delivered));

        assert!(!Pending.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Claimed));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn test_cancel_only_before_pickup() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Claimed.can_transition_to(Cancelled));
        assert!(!Confirmed.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_runner_action() {
        assert_eq!(
            OrderStatus::Claimed.runner_action().map(|a| a.next),
            Some(OrderStatus::Confirmed)
        );
        assert_eq!(
            OrderStatus::Confirmed.runner_action().map(|a| a.label),
            Some("Mark Delivered")
        );
        assert!(OrderStatus::Pending.runner_action().is_none());
        assert!(OrderStatus::Delivered.runner_action().is_none());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
        let parsed: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn test_headline() {
        assert_eq!(headline("cancelled"), "Order Cancelled");
        assert_eq!(headline("delivered"), "Order Delivered!");
        assert_eq!(headline("claimed"), "Order Confirmed!");
        assert_eq!(headline("whatever"), "Order Confirmed!");
    }
}
