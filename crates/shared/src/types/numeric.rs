//! Safe numeric coercion for loosely-typed upstream data.
//!
//! Records imported from the legacy operator system carry numbers as JSON
//! numbers, numeric strings, or nulls depending on which exporter produced
//! them. Everything funnels through `coerce_decimal` so downstream
//! arithmetic never sees a parse failure: anything unusable becomes zero.

use rust_decimal::Decimal;
use serde_json::Value;

/// Coerces a loose JSON value to a `Decimal`.
///
/// Accepts JSON numbers and numeric strings (with surrounding whitespace).
/// Nulls, booleans, arrays, objects, and unparseable strings all coerce to
/// zero. These values feed wallet arithmetic, so the result is always a
/// finite decimal, never an error.
#[must_use]
pub fn coerce_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .unwrap_or(Decimal::ZERO),
        Value::String(s) => s.trim().parse::<Decimal>().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Applies a percentage rate to a base amount: `base * rate_pct / 100`.
#[must_use]
pub fn apply_pct(base: Decimal, rate_pct: Decimal) -> Decimal {
    base * rate_pct / Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[rstest]
    #[case(json!(42), dec!(42))]
    #[case(json!(19.5), dec!(19.5))]
    #[case(json!(-3.25), dec!(-3.25))]
    #[case(json!("120.50"), dec!(120.50))]
    #[case(json!("  7 "), dec!(7))]
    #[case(json!("not a number"), dec!(0))]
    #[case(json!(null), dec!(0))]
    #[case(json!(true), dec!(0))]
    #[case(json!([1, 2]), dec!(0))]
    #[case(json!({"amount": 5}), dec!(0))]
    fn test_coerce_decimal(#[case] input: serde_json::Value, #[case] expected: Decimal) {
        assert_eq!(coerce_decimal(&input), expected);
    }

    #[test]
    fn test_apply_pct() {
        assert_eq!(apply_pct(dec!(500), dec!(10)), dec!(50));
        assert_eq!(apply_pct(dec!(500), dec!(0)), dec!(0));
        assert_eq!(apply_pct(dec!(0), dec!(18)), dec!(0));
        assert_eq!(apply_pct(dec!(-200), dec!(5)), dec!(-10));
    }
}
