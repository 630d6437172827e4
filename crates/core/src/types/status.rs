//! Order status state machine.
//!
//! The status enum carries the full transition table, so every component
//! that holds an order can answer "is this move legal?" without I/O.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Wire format is SCREAMING_SNAKE_CASE (`PENDING`, `IN_PROCESS`, ...), which
/// is also what the relational store persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Freshly assembled, not yet confirmed.
    #[default]
    Pending,
    /// Accepted and awaiting preparation.
    Confirmed,
    /// Being picked and packed.
    InProcess,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer. Terminal.
    Delivered,
    /// Cancelled with stock restored. Terminal.
    Cancelled,
}

/// Every status in a fixed order, for exhaustive iteration in tests and
/// admin listings.
pub const ALL_STATUSES: [OrderStatus; 6] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::InProcess,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
];

impl OrderStatus {
    /// The set of statuses this status may legally move to.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::InProcess, Self::Cancelled],
            Self::InProcess => &[Self::Shipped, Self::Cancelled],
            Self::Shipped => &[Self::Delivered],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    /// Whether moving to `target` is legal from this status.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Whether an order in this status may still be cancelled.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::InProcess)
    }

    /// Whether this status is terminal (no outgoing transitions).
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::InProcess => "IN_PROCESS",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "IN_PROCESS" => Ok(Self::InProcess),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions_table() {
        use OrderStatus::{Cancelled, Confirmed, Delivered, InProcess, Pending, Shipped};

        assert_eq!(Pending.allowed_transitions(), &[Confirmed, Cancelled]);
        assert_eq!(Confirmed.allowed_transitions(), &[InProcess, Cancelled]);
        assert_eq!(InProcess.allowed_transitions(), &[Shipped, Cancelled]);
        assert_eq!(Shipped.allowed_transitions(), &[Delivered]);
        assert!(Delivered.allowed_transitions().is_empty());
        assert!(Cancelled.allowed_transitions().is_empty());
    }

    #[test]
    fn test_every_unlisted_pair_is_rejected() {
        // The table is exhaustive: any (from, to) pair not listed is illegal.
        for from in ALL_STATUSES {
            for to in ALL_STATUSES {
                let expected = from.allowed_transitions().contains(&to);
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} disagreed with the table"
                );
            }
        }
    }

    #[test]
    fn test_self_transition_is_never_legal() {
        for status in ALL_STATUSES {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_cancellable_set() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(OrderStatus::InProcess.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_terminal_set() {
        for status in ALL_STATUSES {
            assert_eq!(
                status.is_completed(),
                status.allowed_transitions().is_empty()
            );
        }
    }

    #[test]
    fn test_display_fromstr_roundtrip() {
        for status in ALL_STATUSES {
            let s = status.to_string();
            assert_eq!(s.parse::<OrderStatus>().unwrap(), status);
        }
        assert!("REFUNDED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProcess).unwrap(),
            "\"IN_PROCESS\""
        );
        let back: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(back, OrderStatus::Cancelled);
    }
}
