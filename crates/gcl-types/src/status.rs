use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Lifecycle status of an order as reported by the storefront.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
    Refunded,
    Replaced,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 7] = [
        Self::Placed,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::Returned,
        Self::Refunded,
        Self::Replaced,
    ];

    /// Canonical lowercase name, as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Returned => "returned",
            Self::Refunded => "refunded",
            Self::Replaced => "replaced",
        }
    }

    /// Statuses that undo a previously applied ledger effect.
    pub fn is_reversal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Returned | Self::Refunded)
    }
}

impl FromStr for OrderStatus {
    type Err = TypeError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == lower)
            .ok_or_else(|| TypeError::UnknownStatus(s.trim().to_string()))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Delivered".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert_eq!(" CANCELLED ".parse::<OrderStatus>(), Ok(OrderStatus::Cancelled));
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(
            "lost".parse::<OrderStatus>(),
            Err(TypeError::UnknownStatus("lost".into()))
        );
    }

    #[test]
    fn every_status_parses_from_its_name() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn reversal_statuses() {
        let reversals: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::is_reversal)
            .collect();
        assert_eq!(
            reversals,
            vec![
                OrderStatus::Cancelled,
                OrderStatus::Returned,
                OrderStatus::Refunded
            ]
        );
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Replaced).unwrap();
        assert_eq!(json, "\"replaced\"");
    }
}
