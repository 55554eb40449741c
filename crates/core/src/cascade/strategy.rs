//! Package disposition strategies and the per-package cascade state machine.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::CascadeError;
use crate::package::PackageUsage;

/// How a package linked to a deleted transaction is disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CascadeStrategy {
    /// Keep the package row, debit the wallet for the consumed hours.
    ChargeUsed,
    /// Delete every lesson booked against the package; no wallet debit.
    DeleteAllLessons,
}

impl CascadeStrategy {
    /// Returns the wire representation of the strategy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChargeUsed => "charge-used",
            Self::DeleteAllLessons => "delete-all-lessons",
        }
    }

    /// Parses a caller-supplied strategy value.
    ///
    /// # Errors
    ///
    /// Returns `CascadeError::InvalidStrategy` for anything other than the
    /// two known values - unknown strategies are rejected, never coerced.
    pub fn parse(value: &str) -> Result<Self, CascadeError> {
        match value {
            "charge-used" => Ok(Self::ChargeUsed),
            "delete-all-lessons" => Ok(Self::DeleteAllLessons),
            other => Err(CascadeError::InvalidStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for CascadeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-supplied disposition for one package in a deletion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeOption {
    /// The package this option applies to.
    pub package_id: Uuid,
    /// Strategy override; `None` accepts the derived default.
    #[serde(default)]
    pub strategy: Option<String>,
    /// Whether the wallet may go negative to settle a charge-used debit.
    /// Defaults to true - overdrawing to settle consumed hours is the
    /// standing business policy, overridable per package per call.
    #[serde(default)]
    pub allow_negative: Option<bool>,
}

/// A fully resolved disposition for one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStrategy {
    /// The strategy to execute.
    pub strategy: CascadeStrategy,
    /// Whether the wallet may go negative for this package's debit.
    pub allow_negative: bool,
}

/// Resolves the disposition strategy for each package in a cascade.
pub struct CascadeStrategyResolver;

impl CascadeStrategyResolver {
    /// Default strategy for a package: packages with consumed hours are
    /// charged for them; untouched packages just lose their lessons.
    #[must_use]
    pub fn default_for(usage: &PackageUsage) -> CascadeStrategy {
        if usage.used_hours > Decimal::ZERO {
            CascadeStrategy::ChargeUsed
        } else {
            CascadeStrategy::DeleteAllLessons
        }
    }

    /// Resolves the strategy for one package, honoring a caller override.
    ///
    /// # Errors
    ///
    /// Returns `CascadeError::InvalidStrategy` when the override is not a
    /// known strategy value.
    pub fn resolve(
        usage: &PackageUsage,
        option: Option<&CascadeOption>,
    ) -> Result<ResolvedStrategy, CascadeError> {
        let strategy = match option.and_then(|o| o.strategy.as_deref()) {
            Some(value) => CascadeStrategy::parse(value)?,
            None => Self::default_for(usage),
        };

        Ok(ResolvedStrategy {
            strategy,
            allow_negative: option.and_then(|o| o.allow_negative).unwrap_or(true),
        })
    }

    /// Checks the negative-balance policy for a charge-used debit.
    ///
    /// # Errors
    ///
    /// Returns `CascadeError::NegativeBalanceBlocked` naming the package
    /// when the debit would overdraw the wallet and the caller forbade it.
    pub fn ensure_chargeable(
        package_id: Uuid,
        balance: Decimal,
        debit: Decimal,
        allow_negative: bool,
    ) -> Result<(), CascadeError> {
        if !allow_negative && balance - debit < Decimal::ZERO {
            return Err(CascadeError::NegativeBalanceBlocked {
                package_id,
                balance,
                debit,
            });
        }
        Ok(())
    }
}

/// State of one package inside a single deletion cascade.
///
/// Valid transitions:
/// - Pending → ChargedUsed (charge the consumed hours)
/// - Pending → LessonsDeleted (delete the linked lessons)
/// - ChargedUsed → Finalized
/// - LessonsDeleted → Finalized
///
/// A package is never both charged and lesson-stripped in one cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageCascadeState {
    /// Not yet processed.
    Pending,
    /// The consumed-hours debit was emitted; the package row remains.
    ChargedUsed,
    /// Every linked lesson was deleted; no debit was issued.
    LessonsDeleted,
    /// Processing for this cascade is complete.
    Finalized,
}

impl PackageCascadeState {
    /// Returns the string representation of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ChargedUsed => "charged_used",
            Self::LessonsDeleted => "lessons_deleted",
            Self::Finalized => "finalized",
        }
    }

    /// Applies the charge-used transition.
    ///
    /// # Errors
    ///
    /// Returns `CascadeError::InvalidTransition` unless pending.
    pub fn charge_used(self) -> Result<Self, CascadeError> {
        match self {
            Self::Pending => Ok(Self::ChargedUsed),
            _ => Err(CascadeError::InvalidTransition {
                from: self,
                to: Self::ChargedUsed,
            }),
        }
    }

    /// Applies the delete-all-lessons transition.
    ///
    /// # Errors
    ///
    /// Returns `CascadeError::InvalidTransition` unless pending.
    pub fn delete_lessons(self) -> Result<Self, CascadeError> {
        match self {
            Self::Pending => Ok(Self::LessonsDeleted),
            _ => Err(CascadeError::InvalidTransition {
                from: self,
                to: Self::LessonsDeleted,
            }),
        }
    }

    /// Finalizes the package for this cascade.
    ///
    /// # Errors
    ///
    /// Returns `CascadeError::InvalidTransition` unless a disposition was
    /// applied first.
    pub fn finalize(self) -> Result<Self, CascadeError> {
        match self {
            Self::ChargedUsed | Self::LessonsDeleted => Ok(Self::Finalized),
            _ => Err(CascadeError::InvalidTransition {
                from: self,
                to: Self::Finalized,
            }),
        }
    }

    /// Check if a state transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: Self, to: Self) -> bool {
        matches!(
            (from, to),
            (Self::Pending, Self::ChargedUsed | Self::LessonsDeleted)
                | (Self::ChargedUsed | Self::LessonsDeleted, Self::Finalized)
        )
    }
}

impl fmt::Display for PackageCascadeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn usage(used_hours: Decimal) -> PackageUsage {
        PackageUsage {
            total_hours: dec!(10),
            used_hours,
            remaining_hours: dec!(10) - used_hours,
            ..PackageUsage::default()
        }
    }

    #[test]
    fn test_default_charge_used_when_hours_consumed() {
        assert_eq!(
            CascadeStrategyResolver::default_for(&usage(dec!(3))),
            CascadeStrategy::ChargeUsed
        );
    }

    #[test]
    fn test_default_delete_lessons_when_untouched() {
        assert_eq!(
            CascadeStrategyResolver::default_for(&usage(Decimal::ZERO)),
            CascadeStrategy::DeleteAllLessons
        );
    }

    #[test]
    fn test_caller_override_accepted() {
        let option = CascadeOption {
            package_id: Uuid::new_v4(),
            strategy: Some("delete-all-lessons".to_string()),
            allow_negative: Some(false),
        };

        let resolved = CascadeStrategyResolver::resolve(&usage(dec!(3)), Some(&option)).unwrap();

        assert_eq!(resolved.strategy, CascadeStrategy::DeleteAllLessons);
        assert!(!resolved.allow_negative);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let option = CascadeOption {
            package_id: Uuid::new_v4(),
            strategy: Some("refund-everything".to_string()),
            allow_negative: None,
        };

        let result = CascadeStrategyResolver::resolve(&usage(dec!(3)), Some(&option));

        assert!(matches!(result, Err(CascadeError::InvalidStrategy(_))));
    }

    #[test]
    fn test_allow_negative_defaults_true() {
        let resolved = CascadeStrategyResolver::resolve(&usage(dec!(3)), None).unwrap();
        assert!(resolved.allow_negative);
    }

    #[rstest]
    #[case(dec!(20), dec!(30), false, true)]
    #[case(dec!(20), dec!(30), true, false)]
    #[case(dec!(50), dec!(30), false, false)]
    #[case(dec!(30), dec!(30), false, false)]
    fn test_ensure_chargeable(
        #[case] balance: Decimal,
        #[case] debit: Decimal,
        #[case] allow_negative: bool,
        #[case] blocked: bool,
    ) {
        let result = CascadeStrategyResolver::ensure_chargeable(
            Uuid::new_v4(),
            balance,
            debit,
            allow_negative,
        );
        assert_eq!(result.is_err(), blocked);
    }

    #[test]
    fn test_state_machine_happy_paths() {
        let charged = PackageCascadeState::Pending.charge_used().unwrap();
        assert_eq!(charged, PackageCascadeState::ChargedUsed);
        assert_eq!(charged.finalize().unwrap(), PackageCascadeState::Finalized);

        let stripped = PackageCascadeState::Pending.delete_lessons().unwrap();
        assert_eq!(stripped, PackageCascadeState::LessonsDeleted);
        assert_eq!(stripped.finalize().unwrap(), PackageCascadeState::Finalized);
    }

    #[test]
    fn test_cannot_charge_and_delete_in_same_cascade() {
        let charged = PackageCascadeState::Pending.charge_used().unwrap();
        assert!(matches!(
            charged.delete_lessons(),
            Err(CascadeError::InvalidTransition { .. })
        ));

        let stripped = PackageCascadeState::Pending.delete_lessons().unwrap();
        assert!(matches!(
            stripped.charge_used(),
            Err(CascadeError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_cannot_finalize_pending() {
        assert!(matches!(
            PackageCascadeState::Pending.finalize(),
            Err(CascadeError::InvalidTransition { .. })
        ));
    }

    #[rstest]
    #[case(PackageCascadeState::Pending, PackageCascadeState::ChargedUsed, true)]
    #[case(PackageCascadeState::Pending, PackageCascadeState::LessonsDeleted, true)]
    #[case(PackageCascadeState::ChargedUsed, PackageCascadeState::Finalized, true)]
    #[case(PackageCascadeState::LessonsDeleted, PackageCascadeState::Finalized, true)]
    #[case(PackageCascadeState::Pending, PackageCascadeState::Finalized, false)]
    #[case(PackageCascadeState::ChargedUsed, PackageCascadeState::LessonsDeleted, false)]
    #[case(PackageCascadeState::Finalized, PackageCascadeState::Pending, false)]
    fn test_transition_table(
        #[case] from: PackageCascadeState,
        #[case] to: PackageCascadeState,
        #[case] valid: bool,
    ) {
        assert_eq!(PackageCascadeState::is_valid_transition(from, to), valid);
    }
}
