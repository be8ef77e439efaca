//! Upstream source identifiers.
//!
//! Declaration order is significant: it is the order used when reporting
//! per-source failures and when iterating sources for logging.

use std::fmt;

use serde::Serialize;

/// One upstream domain service feeding the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Member profile (level, savings, favourite categories).
    Profile,
    /// Loyalty points balance.
    Points,
    /// Coupons, coupon usage and expiring coupons.
    Coupons,
    /// Campaigns, participation and expiring campaigns.
    Campaigns,
    /// Redeemable rewards.
    Rewards,
    /// Initial notification list.
    Notifications,
    /// Shopping cart.
    Cart,
    /// Stored payment methods.
    PaymentMethods,
}

impl Source {
    /// Every source, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Profile,
        Self::Points,
        Self::Coupons,
        Self::Campaigns,
        Self::Rewards,
        Self::Notifications,
        Self::Cart,
        Self::PaymentMethods,
    ];

    /// Stable snake_case label used in logs and serialised error maps.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Points => "points",
            Self::Coupons => "coupons",
            Self::Campaigns => "campaigns",
            Self::Rewards => "rewards",
            Self::Notifications => "notifications",
            Self::Cart => "cart",
            Self::PaymentMethods => "payment_methods",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_sorted_in_declaration_order() {
        let mut sorted = Source::ALL;
        sorted.sort();
        assert_eq!(sorted, Source::ALL);
    }

    #[test]
    fn serialises_with_display_label() {
        for source in Source::ALL {
            let encoded = serde_json::to_string(&source).expect("serialise source");
            assert_eq!(encoded, format!("\"{source}\""));
        }
    }
}
