//! Usage extraction for customer hour packages.
//!
//! Package rows reach us in several historical shapes: typed columns from
//! the current schema, plus a `usage_summary` JSON blob written by the
//! legacy importer whose keys alternate between camelCase and snake_case.
//! The extractor resolves each fact once, with explicit precedence, so no
//! other code ever touches the raw shapes.

use driftline_shared::types::coerce_decimal;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A package row as loaded from storage, before normalization.
///
/// Typed columns are optional because historical rows predate them; the
/// summary blob (when present) may carry the same facts under camelCase or
/// snake_case keys.
#[derive(Debug, Clone, Default)]
pub struct PackageRecord {
    /// Total hours purchased.
    pub total_hours: Option<Decimal>,
    /// Hours already consumed.
    pub used_hours: Option<Decimal>,
    /// Hours remaining, when stored explicitly.
    pub remaining_hours: Option<Decimal>,
    /// Purchase price of the package.
    pub purchase_price: Option<Decimal>,
    /// Legacy usage summary blob.
    pub usage_summary: Option<Value>,
}

/// Normalized usage figures for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageUsage {
    /// Total hours purchased.
    pub total_hours: Decimal,
    /// Hours already consumed.
    pub used_hours: Decimal,
    /// Hours remaining.
    pub remaining_hours: Decimal,
    /// Purchase price of the package.
    pub purchase_price: Decimal,
    /// Price of one hour (0 when the package has no hours).
    pub price_per_hour: Decimal,
    /// Monetary value of the consumed hours.
    pub used_amount: Decimal,
    /// Monetary value of the remaining hours.
    pub remaining_amount: Decimal,
}

/// Normalizes heterogeneous package records into one usage figure set.
pub struct PackageUsageExtractor;

impl PackageUsageExtractor {
    /// Extracts normalized usage from a raw package record.
    ///
    /// Per-field precedence: typed column, then the summary blob's
    /// camelCase key, then its snake_case key, then the computed fallback.
    /// Remaining hours are recomputed as `max(0, total - used)` whenever
    /// the stored value is absent or disagrees with total/used - stored
    /// inconsistencies are corrected, not trusted, because these figures
    /// feed wallet debits. Coercion failures resolve to zero.
    #[must_use]
    pub fn extract_usage(record: &PackageRecord) -> PackageUsage {
        let summary = record.usage_summary.as_ref();

        let total_hours = resolve(
            record.total_hours,
            summary,
            &["totalHours", "total_hours"],
        )
        .unwrap_or(Decimal::ZERO);
        let used_hours = resolve(record.used_hours, summary, &["usedHours", "used_hours"])
            .unwrap_or(Decimal::ZERO);

        let computed_remaining = (total_hours - used_hours).max(Decimal::ZERO);
        let remaining_hours = match resolve(
            record.remaining_hours,
            summary,
            &["remainingHours", "remaining_hours"],
        ) {
            // A stored remaining that breaks used + remaining == total is a
            // correction opportunity, not a fact.
            Some(stored) if total_hours > Decimal::ZERO && used_hours + stored != total_hours => {
                computed_remaining
            }
            Some(stored) => stored,
            None => computed_remaining,
        };

        let purchase_price = resolve(
            record.purchase_price,
            summary,
            &["purchasePrice", "purchase_price", "price"],
        )
        .unwrap_or(Decimal::ZERO);

        let price_per_hour = if total_hours == Decimal::ZERO {
            Decimal::ZERO
        } else {
            purchase_price / total_hours
        };

        let used_amount = resolve(None, summary, &["usedAmount", "used_amount"])
            .unwrap_or(used_hours * price_per_hour);
        let remaining_amount = resolve(None, summary, &["remainingAmount", "remaining_amount"])
            .unwrap_or(remaining_hours * price_per_hour);

        PackageUsage {
            total_hours,
            used_hours,
            remaining_hours,
            purchase_price,
            price_per_hour,
            used_amount,
            remaining_amount,
        }
    }
}

/// Resolves one fact: typed column first, then summary keys in order.
///
/// Summary keys that exist but hold junk coerce to zero (a present key is
/// an answer, even a bad one); absent keys fall through.
fn resolve(column: Option<Decimal>, summary: Option<&Value>, keys: &[&str]) -> Option<Decimal> {
    if let Some(value) = column {
        return Some(value);
    }

    let summary = summary?;
    for key in keys {
        if let Some(value) = summary.get(key) {
            if !value.is_null() {
                return Some(coerce_decimal(value));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_typed_columns_win() {
        let record = PackageRecord {
            total_hours: Some(dec!(10)),
            used_hours: Some(dec!(4)),
            remaining_hours: Some(dec!(6)),
            purchase_price: Some(dec!(200)),
            usage_summary: Some(json!({
                "totalHours": 99,
                "usedHours": 99,
            })),
        };

        let usage = PackageUsageExtractor::extract_usage(&record);

        assert_eq!(usage.total_hours, dec!(10));
        assert_eq!(usage.used_hours, dec!(4));
        assert_eq!(usage.remaining_hours, dec!(6));
        assert_eq!(usage.price_per_hour, dec!(20));
        assert_eq!(usage.used_amount, dec!(80));
        assert_eq!(usage.remaining_amount, dec!(120));
    }

    #[test]
    fn test_camel_case_summary_beats_snake_case() {
        let record = PackageRecord {
            usage_summary: Some(json!({
                "totalHours": 8,
                "total_hours": 12,
                "usedHours": "3",
            })),
            ..PackageRecord::default()
        };

        let usage = PackageUsageExtractor::extract_usage(&record);

        assert_eq!(usage.total_hours, dec!(8));
        assert_eq!(usage.used_hours, dec!(3));
        assert_eq!(usage.remaining_hours, dec!(5));
    }

    #[test]
    fn test_snake_case_summary_fallback() {
        let record = PackageRecord {
            usage_summary: Some(json!({
                "total_hours": 12,
                "used_hours": 2,
                "purchase_price": "360",
            })),
            ..PackageRecord::default()
        };

        let usage = PackageUsageExtractor::extract_usage(&record);

        assert_eq!(usage.total_hours, dec!(12));
        assert_eq!(usage.remaining_hours, dec!(10));
        assert_eq!(usage.price_per_hour, dec!(30));
        assert_eq!(usage.used_amount, dec!(60));
    }

    #[test]
    fn test_summary_monetary_values_used_verbatim() {
        let record = PackageRecord {
            total_hours: Some(dec!(10)),
            used_hours: Some(dec!(5)),
            usage_summary: Some(json!({
                "usedAmount": 42,
                "remainingAmount": 58,
            })),
            ..PackageRecord::default()
        };

        let usage = PackageUsageExtractor::extract_usage(&record);

        assert_eq!(usage.used_amount, dec!(42));
        assert_eq!(usage.remaining_amount, dec!(58));
    }

    #[test]
    fn test_inconsistent_stored_remaining_is_corrected() {
        let record = PackageRecord {
            total_hours: Some(dec!(10)),
            used_hours: Some(dec!(4)),
            remaining_hours: Some(dec!(9)),
            ..PackageRecord::default()
        };

        let usage = PackageUsageExtractor::extract_usage(&record);

        assert_eq!(usage.remaining_hours, dec!(6));
        assert_eq!(
            usage.used_hours + usage.remaining_hours,
            usage.total_hours
        );
    }

    #[test]
    fn test_zero_total_hours_yields_zero_price_per_hour() {
        let record = PackageRecord {
            purchase_price: Some(dec!(500)),
            ..PackageRecord::default()
        };

        let usage = PackageUsageExtractor::extract_usage(&record);

        assert_eq!(usage.price_per_hour, Decimal::ZERO);
        assert_eq!(usage.used_amount, Decimal::ZERO);
    }

    #[test]
    fn test_junk_everywhere_resolves_to_zeroes() {
        let record = PackageRecord {
            usage_summary: Some(json!({
                "totalHours": "banana",
                "usedHours": null,
                "purchasePrice": {"nested": true},
            })),
            ..PackageRecord::default()
        };

        let usage = PackageUsageExtractor::extract_usage(&record);

        assert_eq!(usage, PackageUsage::default());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// used + remaining == total for any package with positive hours
        /// and usage within the purchased amount, regardless of what the
        /// stored remaining claims.
        #[test]
        fn prop_hours_add_up(
            total_cents in 1i64..10_000,
            used_ratio in 0u32..=100,
            stored_remaining in proptest::option::of(-500i64..500),
        ) {
            let total = Decimal::new(total_cents, 2);
            let used = total * Decimal::from(used_ratio) / Decimal::ONE_HUNDRED;
            let record = PackageRecord {
                total_hours: Some(total),
                used_hours: Some(used),
                remaining_hours: stored_remaining.map(|r| Decimal::new(r, 2)),
                ..PackageRecord::default()
            };

            let usage = PackageUsageExtractor::extract_usage(&record);

            prop_assert_eq!(usage.used_hours + usage.remaining_hours, total);
        }

        /// Monetary split follows the hour split when no explicit amounts
        /// are stored: the two parts reassemble the purchase price (up to
        /// the per-hour price's division rounding).
        #[test]
        fn prop_amounts_follow_hours(
            total in 1i64..100,
            used in 0i64..100,
            price in 0i64..100_000,
        ) {
            prop_assume!(used <= total);
            let record = PackageRecord {
                total_hours: Some(Decimal::from(total)),
                used_hours: Some(Decimal::from(used)),
                purchase_price: Some(Decimal::new(price, 2)),
                ..PackageRecord::default()
            };

            let usage = PackageUsageExtractor::extract_usage(&record);

            let reassembled = usage.used_amount + usage.remaining_amount;
            let drift = (reassembled - usage.purchase_price).abs();
            prop_assert!(drift <= dec!(0.000001), "drift {drift} too large");
        }
    }
}
