//! Cascade planning.
//!
//! Builds the full execution plan for one deletion from the discovered
//! dependency set and the caller's selections, before anything touches
//! storage. Strategy validation happens here, so an invalid selection
//! rejects the whole call with zero mutation.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::CascadeError;
use super::strategy::{CascadeOption, CascadeStrategy, CascadeStrategyResolver};
use crate::package::PackageUsage;

/// A booking linked to the transaction under deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedBooking {
    /// Booking id.
    pub id: Uuid,
    /// The package the booking consumes hours from, if any.
    pub package_id: Option<Uuid>,
}

/// A package funded by the transaction under deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedPackage {
    /// Package id.
    pub id: Uuid,
    /// Normalized usage figures for the package.
    pub usage: PackageUsage,
}

/// A rental funded by the transaction under deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedRental {
    /// Rental id.
    pub id: Uuid,
}

/// Planned disposition for one package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageAction {
    /// The package this action applies to.
    pub package_id: Uuid,
    /// The resolved strategy.
    pub strategy: CascadeStrategy,
    /// Whether the wallet may go negative for this package's debit.
    pub allow_negative: bool,
    /// Debit to emit when charging consumed hours (zero for the
    /// lessons-deletion strategy).
    pub debit_amount: Decimal,
    /// Bookings to delete as part of this package's disposition.
    pub booking_ids: Vec<Uuid>,
}

/// The complete plan for one deletion cascade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CascadePlan {
    /// Bookings to delete directly (not owned by a package disposition).
    pub bookings_to_delete: Vec<Uuid>,
    /// Per-package dispositions.
    pub package_actions: Vec<PackageAction>,
    /// Rentals to delete.
    pub rentals_to_delete: Vec<Uuid>,
}

impl CascadePlan {
    /// Builds the plan from a dependency set and caller selections.
    ///
    /// Bookings claimed by a package whose strategy deletes lessons are
    /// removed under that package's action; every other booking is deleted
    /// directly. Duplicate ids coming from redundant join paths are
    /// collapsed.
    ///
    /// # Errors
    ///
    /// Returns `CascadeError::InvalidStrategy` when any selection carries
    /// an unknown strategy; no partial plan is produced.
    pub fn build(
        bookings: &[LinkedBooking],
        packages: &[LinkedPackage],
        rentals: &[LinkedRental],
        options: &[CascadeOption],
    ) -> Result<Self, CascadeError> {
        let options_by_package: HashMap<Uuid, &CascadeOption> =
            options.iter().map(|o| (o.package_id, o)).collect();

        let mut package_actions = Vec::with_capacity(packages.len());
        let mut claimed_bookings: HashSet<Uuid> = HashSet::new();
        let mut seen_packages: HashSet<Uuid> = HashSet::new();

        for package in packages {
            if !seen_packages.insert(package.id) {
                continue;
            }

            let resolved = CascadeStrategyResolver::resolve(
                &package.usage,
                options_by_package.get(&package.id).copied(),
            )?;

            let (debit_amount, booking_ids) = match resolved.strategy {
                CascadeStrategy::ChargeUsed => (package.usage.used_amount, Vec::new()),
                CascadeStrategy::DeleteAllLessons => {
                    let ids: Vec<Uuid> = bookings
                        .iter()
                        .filter(|b| b.package_id == Some(package.id))
                        .map(|b| b.id)
                        .filter(|id| claimed_bookings.insert(*id))
                        .collect();
                    (Decimal::ZERO, ids)
                }
            };

            package_actions.push(PackageAction {
                package_id: package.id,
                strategy: resolved.strategy,
                allow_negative: resolved.allow_negative,
                debit_amount,
                booking_ids,
            });
        }

        let mut direct: Vec<Uuid> = Vec::new();
        let mut seen_bookings: HashSet<Uuid> = HashSet::new();
        for booking in bookings {
            if claimed_bookings.contains(&booking.id) || !seen_bookings.insert(booking.id) {
                continue;
            }
            direct.push(booking.id);
        }

        let mut seen_rentals: HashSet<Uuid> = HashSet::new();
        let rentals_to_delete = rentals
            .iter()
            .map(|r| r.id)
            .filter(|id| seen_rentals.insert(*id))
            .collect();

        Ok(Self {
            bookings_to_delete: direct,
            package_actions,
            rentals_to_delete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn used_usage() -> PackageUsage {
        PackageUsage {
            total_hours: dec!(10),
            used_hours: dec!(3),
            remaining_hours: dec!(7),
            purchase_price: dec!(100),
            price_per_hour: dec!(10),
            used_amount: dec!(30),
            remaining_amount: dec!(70),
        }
    }

    fn fresh_usage() -> PackageUsage {
        PackageUsage {
            total_hours: dec!(10),
            remaining_hours: dec!(10),
            purchase_price: dec!(100),
            price_per_hour: dec!(10),
            remaining_amount: dec!(100),
            ..PackageUsage::default()
        }
    }

    #[test]
    fn test_charge_used_default_carries_debit() {
        let package = LinkedPackage {
            id: Uuid::new_v4(),
            usage: used_usage(),
        };

        let plan = CascadePlan::build(&[], &[package.clone()], &[], &[]).unwrap();

        assert_eq!(plan.package_actions.len(), 1);
        let action = &plan.package_actions[0];
        assert_eq!(action.strategy, CascadeStrategy::ChargeUsed);
        assert_eq!(action.debit_amount, dec!(30));
        assert!(action.booking_ids.is_empty());
    }

    #[test]
    fn test_delete_lessons_claims_package_bookings() {
        let package_id = Uuid::new_v4();
        let lesson_a = Uuid::new_v4();
        let lesson_b = Uuid::new_v4();
        let stray = Uuid::new_v4();

        let bookings = vec![
            LinkedBooking {
                id: lesson_a,
                package_id: Some(package_id),
            },
            LinkedBooking {
                id: lesson_b,
                package_id: Some(package_id),
            },
            LinkedBooking {
                id: stray,
                package_id: None,
            },
        ];
        let packages = vec![LinkedPackage {
            id: package_id,
            usage: fresh_usage(),
        }];

        let plan = CascadePlan::build(&bookings, &packages, &[], &[]).unwrap();

        let action = &plan.package_actions[0];
        assert_eq!(action.strategy, CascadeStrategy::DeleteAllLessons);
        assert_eq!(action.debit_amount, Decimal::ZERO);
        assert_eq!(action.booking_ids, vec![lesson_a, lesson_b]);
        assert_eq!(plan.bookings_to_delete, vec![stray]);
    }

    #[test]
    fn test_charged_package_leaves_bookings_to_direct_deletion() {
        let package_id = Uuid::new_v4();
        let lesson = Uuid::new_v4();

        let bookings = vec![LinkedBooking {
            id: lesson,
            package_id: Some(package_id),
        }];
        let packages = vec![LinkedPackage {
            id: package_id,
            usage: used_usage(),
        }];

        let plan = CascadePlan::build(&bookings, &packages, &[], &[]).unwrap();

        assert_eq!(plan.package_actions[0].strategy, CascadeStrategy::ChargeUsed);
        assert_eq!(plan.bookings_to_delete, vec![lesson]);
    }

    #[test]
    fn test_invalid_selection_rejects_whole_plan() {
        let package_id = Uuid::new_v4();
        let packages = vec![LinkedPackage {
            id: package_id,
            usage: used_usage(),
        }];
        let options = vec![CascadeOption {
            package_id,
            strategy: Some("void-and-pray".to_string()),
            allow_negative: None,
        }];

        let result = CascadePlan::build(&[], &packages, &[], &options);

        assert!(matches!(result, Err(CascadeError::InvalidStrategy(_))));
    }

    #[test]
    fn test_duplicate_ids_collapsed() {
        let booking_id = Uuid::new_v4();
        let rental_id = Uuid::new_v4();
        let bookings = vec![
            LinkedBooking {
                id: booking_id,
                package_id: None,
            },
            LinkedBooking {
                id: booking_id,
                package_id: None,
            },
        ];
        let rentals = vec![LinkedRental { id: rental_id }, LinkedRental { id: rental_id }];

        let plan = CascadePlan::build(&bookings, &[], &rentals, &[]).unwrap();

        assert_eq!(plan.bookings_to_delete, vec![booking_id]);
        assert_eq!(plan.rentals_to_delete, vec![rental_id]);
    }

    #[test]
    fn test_caller_option_switches_strategy() {
        let package_id = Uuid::new_v4();
        let lesson = Uuid::new_v4();
        let bookings = vec![LinkedBooking {
            id: lesson,
            package_id: Some(package_id),
        }];
        let packages = vec![LinkedPackage {
            id: package_id,
            usage: used_usage(),
        }];
        let options = vec![CascadeOption {
            package_id,
            strategy: Some("delete-all-lessons".to_string()),
            allow_negative: None,
        }];

        let plan = CascadePlan::build(&bookings, &packages, &[], &options).unwrap();

        let action = &plan.package_actions[0];
        assert_eq!(action.strategy, CascadeStrategy::DeleteAllLessons);
        assert_eq!(action.booking_ids, vec![lesson]);
        assert!(plan.bookings_to_delete.is_empty());
    }
}
