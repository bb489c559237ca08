//! Inventory ledger tests
//!
//! Tests for balance bookkeeping including:
//! - Reversal of a document restores every balance it touched
//! - Balances never go negative unless the policy allows it
//! - Netting and ordering of effects preserve per-row totals

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::ledger::{
    adjustment_effect, application_order, apply, lock_order, manufacturing_effects,
    manufacturing_sources, net_effects, plan, quantity_change_effect, transfer_effects, BalanceKey,
};
use shared::models::{Direction, MovementSource};
use shared::{BalanceEffect, BalancePolicy, LedgerError};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Apply effects in ledger order, stopping at the first refusal
fn apply_all(
    balances: &mut BTreeMap<BalanceKey, Decimal>,
    effects: &[BalanceEffect],
    policy: BalancePolicy,
) -> Result<(), LedgerError> {
    let mut staged = balances.clone();
    for effect in application_order(effects) {
        let current = staged.get(&effect.key()).copied().unwrap_or(Decimal::ZERO);
        let next = apply(current, &effect, policy)?;
        staged.insert(effect.key(), next);
    }
    *balances = staged;
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_sell_more_than_held_is_refused() {
        let warehouse = Uuid::new_v4();
        let eggs = Uuid::new_v4();
        let mut balances = BTreeMap::new();
        balances.insert(
            BalanceKey {
                warehouse_id: warehouse,
                material_name_id: eggs,
            },
            dec("30"),
        );

        let sale = BalanceEffect::new(warehouse, eggs, Direction::Out, dec("31"));
        let result = apply_all(&mut balances, &[sale], BalancePolicy::ForbidNegative);

        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                available: dec("30"),
                requested: dec("31"),
            })
        );
        // Nothing changed
        assert_eq!(balances.values().copied().collect::<Vec<_>>(), vec![dec("30")]);
    }

    #[test]
    fn test_allow_negative_policy_accepts_overdraw() {
        let sale = BalanceEffect::new(Uuid::new_v4(), Uuid::new_v4(), Direction::Out, dec("5"));
        assert_eq!(
            apply(Decimal::ZERO, &sale, BalancePolicy::AllowNegative),
            Ok(dec("-5"))
        );
    }

    #[test]
    fn test_manufacturing_run_on_empty_warehouse() {
        let warehouse = Uuid::new_v4();
        let feed = Uuid::new_v4();
        let corn = Uuid::new_v4();
        let soy = Uuid::new_v4();

        let mut balances = BTreeMap::new();
        for (material, qty) in [(corn, "600"), (soy, "400")] {
            balances.insert(
                BalanceKey {
                    warehouse_id: warehouse,
                    material_name_id: material,
                },
                dec(qty),
            );
        }

        let effects = manufacturing_effects(
            warehouse,
            (feed, dec("1000")),
            &[(corn, dec("600")), (soy, dec("400"))],
        );
        apply_all(&mut balances, &effects, BalancePolicy::ForbidNegative).unwrap();

        let key = |m| BalanceKey {
            warehouse_id: warehouse,
            material_name_id: m,
        };
        assert_eq!(balances[&key(feed)], dec("1000"));
        assert_eq!(balances[&key(corn)], Decimal::ZERO);
        assert_eq!(balances[&key(soy)], Decimal::ZERO);
    }

    #[test]
    fn test_run_using_its_own_output_succeeds_when_incoming_applied_first() {
        let warehouse = Uuid::new_v4();
        let feed = Uuid::new_v4();

        // A run that consumes part of what it produces never dips below zero
        let effects = manufacturing_effects(warehouse, (feed, dec("10")), &[(feed, dec("4"))]);
        let mut balances = BTreeMap::new();
        apply_all(&mut balances, &effects, BalancePolicy::ForbidNegative).unwrap();

        assert_eq!(balances.values().copied().collect::<Vec<_>>(), vec![dec("6")]);
    }

    #[test]
    fn test_transfer_requires_distinct_warehouses() {
        let warehouse = Uuid::new_v4();
        assert_eq!(
            transfer_effects(warehouse, warehouse, Uuid::new_v4(), dec("1")),
            Err(LedgerError::SameWarehouse)
        );
        assert_eq!(
            transfer_effects(warehouse, Uuid::new_v4(), Uuid::new_v4(), Decimal::ZERO),
            Err(LedgerError::NonPositiveQuantity)
        );
    }

    #[test]
    fn test_quantity_edit_moves_only_the_difference() {
        let original = BalanceEffect::new(Uuid::new_v4(), Uuid::new_v4(), Direction::In, dec("20"));

        let grown = quantity_change_effect(&original, dec("25")).unwrap();
        assert_eq!(grown.direction, Direction::In);
        assert_eq!(grown.quantity, dec("5"));

        let shrunk = quantity_change_effect(&original, dec("12")).unwrap();
        assert_eq!(shrunk.direction, Direction::Out);
        assert_eq!(shrunk.quantity, dec("8"));

        assert!(quantity_change_effect(&original, dec("20")).is_none());
    }

    #[test]
    fn test_adjustment_to_counted_balance() {
        let warehouse = Uuid::new_v4();
        let material = Uuid::new_v4();

        let up = adjustment_effect(warehouse, material, dec("10"), dec("12.5")).unwrap();
        assert_eq!((up.direction, up.quantity), (Direction::In, dec("2.5")));

        let down = adjustment_effect(warehouse, material, dec("10"), dec("7")).unwrap();
        assert_eq!((down.direction, down.quantity), (Direction::Out, dec("3")));

        assert!(adjustment_effect(warehouse, material, dec("10"), dec("10")).is_none());
    }

    #[test]
    fn test_lock_order_is_sorted_and_distinct() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let effects = [
            BalanceEffect::new(b, a, Direction::In, dec("1")),
            BalanceEffect::new(a, b, Direction::Out, dec("1")),
            BalanceEffect::new(b, a, Direction::Out, dec("2")),
        ];

        let keys = lock_order(&effects);
        assert_eq!(keys.len(), 2);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_mirrored_runs_lock_rows_in_the_same_order() {
        let warehouse = Uuid::from_u128(10);
        let x = Uuid::from_u128(2);
        let y = Uuid::from_u128(1);

        // One run makes X from Y, the other makes Y from X
        let x_from_y = manufacturing_effects(warehouse, (x, dec("5")), &[(y, dec("5"))]);
        let y_from_x = manufacturing_effects(warehouse, (y, dec("5")), &[(x, dec("5"))]);

        let first = plan(&manufacturing_sources(&x_from_y));
        let second = plan(&manufacturing_sources(&y_from_x));

        let expected = vec![
            BalanceKey {
                warehouse_id: warehouse,
                material_name_id: y,
            },
            BalanceKey {
                warehouse_id: warehouse,
                material_name_id: x,
            },
        ];
        assert_eq!(first.locks, expected);
        assert_eq!(second.locks, expected);
    }

    #[test]
    fn test_run_steps_keep_their_movement_source() {
        let warehouse = Uuid::new_v4();
        let feed = Uuid::new_v4();
        let corn = Uuid::new_v4();
        let effects = manufacturing_effects(warehouse, (feed, dec("10")), &[(corn, dec("10"))]);

        let planned = plan(&manufacturing_sources(&effects));
        assert_eq!(planned.steps.len(), 2);
        assert_eq!(planned.steps[0].0.material_name_id, feed);
        assert_eq!(planned.steps[0].1, MovementSource::ManufacturingOutput);
        assert_eq!(planned.steps[1].1, MovementSource::ManufacturingInput);

        // Deleting the run takes the product out after the inputs come back
        let reversed: Vec<BalanceEffect> = effects.iter().map(BalanceEffect::reversed).collect();
        let undo = plan(&manufacturing_sources(&reversed));
        assert_eq!(undo.locks, planned.locks);
        assert_eq!(undo.steps[0].0.material_name_id, corn);
        assert_eq!(undo.steps[0].1, MovementSource::ManufacturingInput);
        assert_eq!(undo.steps[1].1, MovementSource::ManufacturingOutput);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        prop_oneof![Just(Direction::In), Just(Direction::Out)]
    }

    /// Effects over a small pool of warehouses and materials so keys collide
    fn effects_strategy() -> impl Strategy<Value = Vec<BalanceEffect>> {
        prop::collection::vec(
            (0u128..3, 0u128..3, direction_strategy(), quantity_strategy()),
            1..20,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .map(|(w, m, dir, qty)| {
                    BalanceEffect::new(Uuid::from_u128(w + 1), Uuid::from_u128(m + 100), dir, qty)
                })
                .collect()
        })
    }

    fn totals(effects: &[BalanceEffect]) -> BTreeMap<BalanceKey, Decimal> {
        let mut totals = BTreeMap::new();
        for e in effects {
            *totals.entry(e.key()).or_insert(Decimal::ZERO) += e.signed_delta();
        }
        totals.retain(|_, v| !v.is_zero());
        totals
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Reversing a document returns every balance to where it was
        #[test]
        fn prop_reversal_restores_balances(effects in effects_strategy()) {
            let mut balances = BTreeMap::new();
            apply_all(&mut balances, &effects, BalancePolicy::AllowNegative).unwrap();

            let reversal: Vec<BalanceEffect> = effects.iter().map(BalanceEffect::reversed).collect();
            apply_all(&mut balances, &reversal, BalancePolicy::AllowNegative).unwrap();

            prop_assert!(balances.values().all(|b| b.is_zero()));
        }

        /// Under the default policy no accepted sequence leaves a negative balance
        #[test]
        fn prop_no_negative_balance_when_forbidden(effects in effects_strategy()) {
            let mut balances = BTreeMap::new();
            for effect in &effects {
                let _ = apply_all(&mut balances, &[*effect], BalancePolicy::ForbidNegative);
                prop_assert!(balances.values().all(|b| *b >= Decimal::ZERO));
            }
        }

        /// A refused batch leaves balances untouched
        #[test]
        fn prop_refused_batch_is_atomic(effects in effects_strategy()) {
            let mut balances = BTreeMap::new();
            let before = balances.clone();
            if apply_all(&mut balances, &effects, BalancePolicy::ForbidNegative).is_err() {
                prop_assert_eq!(balances, before);
            }
        }

        /// Netting keeps the per-row sum and yields one positive effect per row
        #[test]
        fn prop_net_effects_preserve_totals(effects in effects_strategy()) {
            let netted = net_effects(&effects);

            prop_assert_eq!(totals(&netted), totals(&effects));
            prop_assert!(netted.iter().all(|e| e.quantity > Decimal::ZERO));
            prop_assert_eq!(lock_order(&netted).len(), netted.len());
        }

        /// Ordering for application is a permutation with all incoming stock first
        #[test]
        fn prop_application_order_puts_incoming_first(effects in effects_strategy()) {
            let ordered = application_order(&effects);

            prop_assert_eq!(ordered.len(), effects.len());
            prop_assert_eq!(totals(&ordered), totals(&effects));
            let first_out = ordered.iter().position(|e| e.direction == Direction::Out);
            if let Some(idx) = first_out {
                prop_assert!(ordered[idx..].iter().all(|e| e.direction == Direction::Out));
            }
        }

        /// A transfer moves stock without changing the total held
        #[test]
        fn prop_transfer_conserves_stock(qty in quantity_strategy(), held in quantity_strategy()) {
            let from = Uuid::new_v4();
            let to = Uuid::new_v4();
            let material = Uuid::new_v4();
            let effects = transfer_effects(from, to, material, qty).unwrap();

            let mut balances = BTreeMap::new();
            balances.insert(BalanceKey { warehouse_id: from, material_name_id: material }, held);

            let result = apply_all(&mut balances, &effects, BalancePolicy::ForbidNegative);
            prop_assert_eq!(result.is_ok(), held >= qty);
            prop_assert_eq!(balances.values().copied().sum::<Decimal>(), held);
        }
    }
}
