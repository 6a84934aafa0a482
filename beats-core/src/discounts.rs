//! Promotional discounts and server-side code validation.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use beats_common::ItemKind;

use crate::client::{opt_id_string, parse_timestamp};

const GLOBAL_SCOPE: &str = "global";

/// An active promotion as listed by the server. Displayed prices use
/// [`Discount::discounted_price`]; the server re-validates at checkout, so
/// this is presentation, not authority.
#[derive(Debug, Clone, Deserialize)]
pub struct Discount {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub percentage: f64,
    /// "global", or an item type, optionally narrowed to one item.
    #[serde(default = "global_scope")]
    pub applicable_to: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub item_id: Option<String>,
    #[serde(default)]
    pub valid_until: Option<String>,
    #[serde(default)]
    pub max_uses: Option<i64>,
    #[serde(default)]
    pub used_count: i64,
}

fn global_scope() -> String {
    GLOBAL_SCOPE.to_string()
}

impl Discount {
    /// Whether this discount covers the given item.
    pub fn applies_to(&self, kind: ItemKind, item_id: &str) -> bool {
        if self.applicable_to == GLOBAL_SCOPE {
            return true;
        }
        if self.applicable_to != kind.as_str() {
            return false;
        }
        match &self.item_id {
            Some(scoped) => scoped == item_id,
            None => true,
        }
    }

    /// Whether the discount can still be used at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if let Some(max) = self.max_uses {
            if self.used_count >= max {
                return false;
            }
        }
        match self.valid_until.as_deref().and_then(parse_timestamp) {
            Some(until) => now <= until,
            None => true,
        }
    }

    /// Price after applying the percentage, rounded to cents.
    pub fn discounted_price(&self, price: f64) -> f64 {
        let discounted = price * (1.0 - self.percentage / 100.0);
        (discounted * 100.0).round() / 100.0
    }
}

/// Server verdict on a discount code for a specific item. `valid: false`
/// is a normal answer, not a transport failure.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscountValidation {
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub discount: Option<AppliedDiscount>,
}

/// The priced-out result of a successful validation.
#[derive(Debug, Clone, Deserialize)]
pub struct AppliedDiscount {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub original_price: f64,
    #[serde(default)]
    pub final_price: f64,
    #[serde(default)]
    pub savings: f64,
}
