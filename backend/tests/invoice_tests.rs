//! Trade and manufacturing invoice tests
//!
//! Tests for invoice arithmetic including:
//! - Buy totals add expenses, sell totals deduct them
//! - Lines with a weight are priced by weight
//! - Sequential document numbering
//! - Stock direction of invoice lines

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::ledger::{invoice_item_effect, net_effects};
use shared::models::{Direction, InvoiceLine, InvoiceType, MixLine};
use shared::pricing::{
    compute_totals, latest_invoice_number, line_value, manufacturing_unit_cost,
    next_invoice_number, validate_mix_percentages,
};
use std::str::FromStr;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_numbering_starts_at_one() {
        assert_eq!(next_invoice_number("BUY", None), "BUY-000001");
    }

    #[test]
    fn test_numbering_continues_sequence() {
        assert_eq!(next_invoice_number("SEL", Some("SEL-000041")), "SEL-000042");
        assert_eq!(next_invoice_number("MFG", Some("MFG-999999")), "MFG-1000000");
    }

    #[test]
    fn test_numbering_past_six_digits_stays_unique() {
        let mut issued = vec!["BUY-999998".to_string(), "BUY-999999".to_string()];
        for _ in 0..3 {
            let last = latest_invoice_number("BUY", issued.iter().map(String::as_str));
            let next = next_invoice_number("BUY", last);
            assert!(!issued.contains(&next), "{} issued twice", next);
            issued.push(next);
        }
        assert_eq!(&issued[2..], ["BUY-1000000", "BUY-1000001", "BUY-1000002"]);
    }

    #[test]
    fn test_numbering_ignores_foreign_prefix() {
        assert_eq!(next_invoice_number("MED", Some("BUY-000010")), "MED-000001");
        assert_eq!(next_invoice_number("MED", Some("MED-abc")), "MED-000001");
    }

    #[test]
    fn test_invoice_type_directions() {
        assert_eq!(InvoiceType::Buy.direction(), Direction::In);
        assert_eq!(InvoiceType::Sell.direction(), Direction::Out);
        assert_eq!(InvoiceType::from_str("sell").unwrap(), InvoiceType::Sell);
        assert!(InvoiceType::from_str("gift").is_err());
    }

    #[test]
    fn test_egg_sale_with_transport_expense() {
        // 30 trays at 4.5, less 10 for transport
        let totals = compute_totals(
            InvoiceType::Sell,
            &[InvoiceLine {
                quantity: dec("30"),
                weight: Decimal::ZERO,
                price: dec("4.5"),
            }],
            &[dec("10")],
        );
        assert_eq!(totals.total_items, dec("135"));
        assert_eq!(totals.net_total, dec("125"));
    }

    #[test]
    fn test_unit_cost_needs_output() {
        assert_eq!(manufacturing_unit_cost(dec("500"), dec("50"), Decimal::ZERO), None);
        assert_eq!(
            manufacturing_unit_cost(dec("500"), dec("50"), dec("1000")),
            Some(dec("0.55"))
        );
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn line_strategy() -> impl Strategy<Value = InvoiceLine> {
        (1i64..10_000i64, prop::option::of(1i64..10_000i64), amount_strategy()).prop_map(
            |(q, w, price)| InvoiceLine {
                quantity: Decimal::new(q, 1),
                weight: w.map(|w| Decimal::new(w, 1)).unwrap_or(Decimal::ZERO),
                price,
            },
        )
    }

    proptest! {
        /// Item total is the sum of line values and expenses move the net total
        #[test]
        fn prop_totals_balance(
            lines in prop::collection::vec(line_strategy(), 0..10),
            expenses in prop::collection::vec(amount_strategy(), 0..5),
        ) {
            let buy = compute_totals(InvoiceType::Buy, &lines, &expenses);
            let sell = compute_totals(InvoiceType::Sell, &lines, &expenses);

            let items: Decimal = lines.iter().map(|l| line_value(l.quantity, l.weight, l.price)).sum();
            let extra: Decimal = expenses.iter().sum();

            prop_assert_eq!(buy.total_items, items);
            prop_assert_eq!(buy.net_total, items + extra);
            prop_assert_eq!(sell.net_total, items - extra);
            prop_assert_eq!(buy.net_total - sell.net_total, extra * dec("2"));
        }

        /// Weight takes precedence over quantity when pricing a line
        #[test]
        fn prop_weight_priced_lines(line in line_strategy()) {
            let value = line_value(line.quantity, line.weight, line.price);
            if line.weight > Decimal::ZERO {
                prop_assert_eq!(value, line.weight * line.price);
            } else {
                prop_assert_eq!(value, line.quantity * line.price);
            }
        }

        /// Numbers increase by one and keep their prefix
        #[test]
        fn prop_numbering_increments(n in 1u64..999_999u64) {
            let last = format!("BUY-{:06}", n);
            let next = next_invoice_number("BUY", Some(&last));
            prop_assert_eq!(next, format!("BUY-{:06}", n + 1));
        }

        /// Deleting an invoice cancels the stock its lines moved
        #[test]
        fn prop_invoice_lines_cancel_on_delete(
            is_buy in any::<bool>(),
            quantities in prop::collection::vec(1i64..10_000i64, 1..8),
        ) {
            let invoice_type = if is_buy { InvoiceType::Buy } else { InvoiceType::Sell };
            let warehouse = Uuid::new_v4();
            let material = Uuid::new_v4();

            let mut effects: Vec<_> = quantities
                .iter()
                .map(|q| invoice_item_effect(invoice_type, warehouse, material, Decimal::new(*q, 2)))
                .collect();
            prop_assert!(effects.iter().all(|e| e.direction == invoice_type.direction()));

            let reversal: Vec<_> = effects.iter().map(|e| e.reversed()).collect();
            effects.extend(reversal);
            prop_assert!(net_effects(&effects).is_empty());
        }

        /// Percentages that split 100 across inputs are accepted
        #[test]
        fn prop_full_mix_accepted(first in 0i64..=10_000i64) {
            let a = Decimal::new(first, 2);
            let lines = vec![
                MixLine { quantity: dec("1"), percentage: Some(a), unit_cost: None },
                MixLine { quantity: dec("1"), percentage: Some(Decimal::ONE_HUNDRED - a), unit_cost: None },
            ];
            prop_assert!(validate_mix_percentages(&lines).is_ok());
        }
    }
}
