//! Inventory ledger arithmetic
//!
//! Every stock-affecting document (buy/sell invoice items, manufacturing runs,
//! medicine issues, transfers and manual adjustments) is reduced to a list of
//! [`BalanceEffect`]s keyed by warehouse and material name. The backend applies
//! those effects to `materials.current_balance` inside a transaction; this module
//! holds the arithmetic so it can be tested without a database.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Direction, InvoiceType, MovementSource};

/// Whether balances may go below zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancePolicy {
    #[default]
    ForbidNegative,
    AllowNegative,
}

impl BalancePolicy {
    pub fn from_flag(allow_negative: bool) -> Self {
        if allow_negative {
            BalancePolicy::AllowNegative
        } else {
            BalancePolicy::ForbidNegative
        }
    }
}

/// Ledger rule violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("quantity must be greater than zero")]
    NonPositiveQuantity,

    #[error("insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance {
        available: Decimal,
        requested: Decimal,
    },

    #[error("source and destination warehouse must differ")]
    SameWarehouse,
}

/// Identifies a material row: one material name held in one warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BalanceKey {
    pub warehouse_id: Uuid,
    pub material_name_id: Uuid,
}

/// A single intended change to a material balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEffect {
    pub warehouse_id: Uuid,
    pub material_name_id: Uuid,
    pub direction: Direction,
    pub quantity: Decimal,
}

impl BalanceEffect {
    pub fn new(
        warehouse_id: Uuid,
        material_name_id: Uuid,
        direction: Direction,
        quantity: Decimal,
    ) -> Self {
        Self {
            warehouse_id,
            material_name_id,
            direction,
            quantity,
        }
    }

    pub fn key(&self) -> BalanceKey {
        BalanceKey {
            warehouse_id: self.warehouse_id,
            material_name_id: self.material_name_id,
        }
    }

    /// The effect that undoes this one
    pub fn reversed(&self) -> Self {
        Self {
            direction: self.direction.opposite(),
            ..*self
        }
    }

    /// Positive for stock coming in, negative for stock going out
    pub fn signed_delta(&self) -> Decimal {
        match self.direction {
            Direction::In => self.quantity,
            Direction::Out => -self.quantity,
        }
    }
}

/// Apply an effect to a balance and return the new balance
pub fn apply(
    current: Decimal,
    effect: &BalanceEffect,
    policy: BalancePolicy,
) -> Result<Decimal, LedgerError> {
    if effect.quantity <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveQuantity);
    }

    let next = current + effect.signed_delta();
    if next < Decimal::ZERO && policy == BalancePolicy::ForbidNegative {
        return Err(LedgerError::InsufficientBalance {
            available: current,
            requested: effect.quantity,
        });
    }

    Ok(next)
}

/// Stock effect of one buy or sell invoice line
pub fn invoice_item_effect(
    invoice_type: InvoiceType,
    warehouse_id: Uuid,
    material_name_id: Uuid,
    quantity: Decimal,
) -> BalanceEffect {
    BalanceEffect::new(warehouse_id, material_name_id, invoice_type.direction(), quantity)
}

/// Effects of a manufacturing run: the product comes in, every input goes out
pub fn manufacturing_effects(
    warehouse_id: Uuid,
    output: (Uuid, Decimal),
    inputs: &[(Uuid, Decimal)],
) -> Vec<BalanceEffect> {
    let mut effects = Vec::with_capacity(inputs.len() + 1);
    effects.push(BalanceEffect::new(warehouse_id, output.0, Direction::In, output.1));
    effects.extend(
        inputs
            .iter()
            .map(|(material, qty)| BalanceEffect::new(warehouse_id, *material, Direction::Out, *qty)),
    );
    effects
}

/// Stock leaving a warehouse for a medicine issue
pub fn medicine_issue_effect(
    warehouse_id: Uuid,
    material_name_id: Uuid,
    quantity: Decimal,
) -> BalanceEffect {
    BalanceEffect::new(warehouse_id, material_name_id, Direction::Out, quantity)
}

/// Effects of moving stock between two warehouses
pub fn transfer_effects(
    from_warehouse: Uuid,
    to_warehouse: Uuid,
    material_name_id: Uuid,
    quantity: Decimal,
) -> Result<[BalanceEffect; 2], LedgerError> {
    if from_warehouse == to_warehouse {
        return Err(LedgerError::SameWarehouse);
    }
    if quantity <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveQuantity);
    }
    Ok([
        BalanceEffect::new(from_warehouse, material_name_id, Direction::Out, quantity),
        BalanceEffect::new(to_warehouse, material_name_id, Direction::In, quantity),
    ])
}

/// Effect needed when a line's quantity changes from `original.quantity` to `new_quantity`
pub fn quantity_change_effect(
    original: &BalanceEffect,
    new_quantity: Decimal,
) -> Option<BalanceEffect> {
    let delta = new_quantity - original.quantity;
    if delta.is_zero() {
        return None;
    }

    let direction = if delta > Decimal::ZERO {
        original.direction
    } else {
        original.direction.opposite()
    };

    Some(BalanceEffect {
        direction,
        quantity: delta.abs(),
        ..*original
    })
}

/// Effect that brings a balance to a counted quantity
pub fn adjustment_effect(
    warehouse_id: Uuid,
    material_name_id: Uuid,
    current: Decimal,
    counted: Decimal,
) -> Option<BalanceEffect> {
    let delta = counted - current;
    if delta.is_zero() {
        return None;
    }
    let direction = if delta > Decimal::ZERO {
        Direction::In
    } else {
        Direction::Out
    };
    Some(BalanceEffect::new(
        warehouse_id,
        material_name_id,
        direction,
        delta.abs(),
    ))
}

/// Fold effects into one net effect per material row, ordered by key.
///
/// Keys whose effects cancel out are dropped.
pub fn net_effects(effects: &[BalanceEffect]) -> Vec<BalanceEffect> {
    let mut totals: BTreeMap<BalanceKey, Decimal> = BTreeMap::new();
    for effect in effects {
        *totals.entry(effect.key()).or_insert(Decimal::ZERO) += effect.signed_delta();
    }

    totals
        .into_iter()
        .filter(|(_, delta)| !delta.is_zero())
        .map(|(key, delta)| BalanceEffect {
            warehouse_id: key.warehouse_id,
            material_name_id: key.material_name_id,
            direction: if delta > Decimal::ZERO {
                Direction::In
            } else {
                Direction::Out
            },
            quantity: delta.abs(),
        })
        .collect()
}

/// Distinct material rows touched by `effects`, in the order rows must be locked
pub fn lock_order(effects: &[BalanceEffect]) -> Vec<BalanceKey> {
    let mut keys: Vec<BalanceKey> = effects.iter().map(BalanceEffect::key).collect();
    keys.sort();
    keys.dedup();
    keys
}

fn application_rank(effect: &BalanceEffect) -> u8 {
    match effect.direction {
        Direction::In => 0,
        Direction::Out => 1,
    }
}

/// Order effects for sequential application: incoming stock before outgoing
pub fn application_order(effects: &[BalanceEffect]) -> Vec<BalanceEffect> {
    let mut ordered = effects.to_vec();
    ordered.sort_by_key(application_rank);
    ordered
}

/// Tag the effects of a manufacturing run, or of its reversal, with their
/// movement source. The first effect is the product, the rest are inputs.
pub fn manufacturing_sources(effects: &[BalanceEffect]) -> Vec<(BalanceEffect, MovementSource)> {
    effects
        .iter()
        .enumerate()
        .map(|(i, effect)| {
            let source = if i == 0 {
                MovementSource::ManufacturingOutput
            } else {
                MovementSource::ManufacturingInput
            };
            (*effect, source)
        })
        .collect()
}

/// One document's effects, ready to be written: every row to lock, in lock
/// order, and the effects in application order with their tags.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerPlan<T> {
    pub locks: Vec<BalanceKey>,
    pub steps: Vec<(BalanceEffect, T)>,
}

/// Plan a batch of tagged effects. Zero-quantity effects are dropped.
pub fn plan<T: Copy>(steps: &[(BalanceEffect, T)]) -> LedgerPlan<T> {
    let mut steps: Vec<(BalanceEffect, T)> = steps
        .iter()
        .copied()
        .filter(|(effect, _)| !effect.quantity.is_zero())
        .collect();
    let effects: Vec<BalanceEffect> = steps.iter().map(|(effect, _)| *effect).collect();
    steps.sort_by_key(|(effect, _)| application_rank(effect));

    LedgerPlan {
        locks: lock_order(&effects),
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn effect(direction: Direction, qty: &str) -> BalanceEffect {
        BalanceEffect::new(Uuid::nil(), Uuid::nil(), direction, dec(qty))
    }

    #[test]
    fn test_apply_in_and_out() {
        let policy = BalancePolicy::ForbidNegative;
        assert_eq!(apply(dec("10"), &effect(Direction::In, "5"), policy), Ok(dec("15")));
        assert_eq!(apply(dec("10"), &effect(Direction::Out, "10"), policy), Ok(dec("0")));
    }

    #[test]
    fn test_apply_rejects_overdraw() {
        let result = apply(dec("3"), &effect(Direction::Out, "4"), BalancePolicy::ForbidNegative);
        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                available: dec("3"),
                requested: dec("4"),
            })
        );
    }

    #[test]
    fn test_apply_allows_overdraw_when_configured() {
        let result = apply(dec("3"), &effect(Direction::Out, "4"), BalancePolicy::AllowNegative);
        assert_eq!(result, Ok(dec("-1")));
    }

    #[test]
    fn test_apply_rejects_non_positive_quantity() {
        let policy = BalancePolicy::AllowNegative;
        assert_eq!(
            apply(dec("3"), &effect(Direction::In, "0"), policy),
            Err(LedgerError::NonPositiveQuantity)
        );
        assert_eq!(
            apply(dec("3"), &effect(Direction::In, "-1"), policy),
            Err(LedgerError::NonPositiveQuantity)
        );
    }

    #[test]
    fn test_invoice_item_direction() {
        let w = Uuid::new_v4();
        let m = Uuid::new_v4();
        assert_eq!(invoice_item_effect(InvoiceType::Buy, w, m, dec("1")).direction, Direction::In);
        assert_eq!(invoice_item_effect(InvoiceType::Sell, w, m, dec("1")).direction, Direction::Out);
    }

    #[test]
    fn test_manufacturing_effects() {
        let w = Uuid::new_v4();
        let feed = Uuid::new_v4();
        let corn = Uuid::new_v4();
        let soy = Uuid::new_v4();
        let effects = manufacturing_effects(w, (feed, dec("100")), &[(corn, dec("60")), (soy, dec("40"))]);

        assert_eq!(effects.len(), 3);
        assert_eq!(effects[0].direction, Direction::In);
        assert_eq!(effects[0].material_name_id, feed);
        assert!(effects[1..].iter().all(|e| e.direction == Direction::Out));
    }

    #[test]
    fn test_transfer_effects() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let m = Uuid::new_v4();
        let [out, incoming] = transfer_effects(a, b, m, dec("7")).unwrap();
        assert_eq!(out.warehouse_id, a);
        assert_eq!(out.direction, Direction::Out);
        assert_eq!(incoming.warehouse_id, b);
        assert_eq!(incoming.direction, Direction::In);

        assert_eq!(transfer_effects(a, a, m, dec("7")), Err(LedgerError::SameWarehouse));
        assert_eq!(transfer_effects(a, b, m, dec("0")), Err(LedgerError::NonPositiveQuantity));
    }

    #[test]
    fn test_quantity_change_effect() {
        let sell = effect(Direction::Out, "10");

        // Selling more takes more stock out
        let more = quantity_change_effect(&sell, dec("12")).unwrap();
        assert_eq!(more.direction, Direction::Out);
        assert_eq!(more.quantity, dec("2"));

        // Selling less returns stock
        let less = quantity_change_effect(&sell, dec("4")).unwrap();
        assert_eq!(less.direction, Direction::In);
        assert_eq!(less.quantity, dec("6"));

        assert!(quantity_change_effect(&sell, dec("10")).is_none());
    }

    #[test]
    fn test_adjustment_effect() {
        let w = Uuid::new_v4();
        let m = Uuid::new_v4();
        let up = adjustment_effect(w, m, dec("5"), dec("8")).unwrap();
        assert_eq!((up.direction, up.quantity), (Direction::In, dec("3")));
        let down = adjustment_effect(w, m, dec("5"), dec("1")).unwrap();
        assert_eq!((down.direction, down.quantity), (Direction::Out, dec("4")));
        assert!(adjustment_effect(w, m, dec("5"), dec("5")).is_none());
    }

    #[test]
    fn test_net_effects_cancel_and_merge() {
        let w = Uuid::new_v4();
        let m1 = Uuid::new_v4();
        let m2 = Uuid::new_v4();
        let effects = vec![
            BalanceEffect::new(w, m1, Direction::In, dec("10")),
            BalanceEffect::new(w, m1, Direction::Out, dec("10")),
            BalanceEffect::new(w, m2, Direction::Out, dec("3")),
            BalanceEffect::new(w, m2, Direction::Out, dec("2")),
        ];
        let net = net_effects(&effects);
        assert_eq!(net.len(), 1);
        assert_eq!(net[0].material_name_id, m2);
        assert_eq!(net[0].direction, Direction::Out);
        assert_eq!(net[0].quantity, dec("5"));
    }

    #[test]
    fn test_lock_order_is_sorted_and_unique() {
        let w = Uuid::new_v4();
        let m = Uuid::new_v4();
        let other = Uuid::new_v4();
        let effects = vec![
            BalanceEffect::new(w, m, Direction::In, dec("1")),
            BalanceEffect::new(w, other, Direction::Out, dec("1")),
            BalanceEffect::new(w, m, Direction::Out, dec("1")),
        ];
        let keys = lock_order(&effects);
        assert_eq!(keys.len(), 2);
        assert!(keys[0] < keys[1]);
    }

    #[test]
    fn test_plan_drops_zero_quantities() {
        let steps = [(effect(Direction::Out, "0"), 'a'), (effect(Direction::In, "2"), 'b')];
        let planned = plan(&steps);
        assert_eq!(planned.locks.len(), 1);
        assert_eq!(planned.steps, vec![(effect(Direction::In, "2"), 'b')]);
    }

    #[test]
    fn test_application_order_puts_incoming_first() {
        let effects = vec![effect(Direction::Out, "1"), effect(Direction::In, "2")];
        let ordered = application_order(&effects);
        assert_eq!(ordered[0].direction, Direction::In);
    }
}
