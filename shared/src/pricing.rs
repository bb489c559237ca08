//! Invoice totals and numbering

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{InvoiceLine, InvoiceType, MixLine};

/// Tolerance when checking that mix percentages add up
const PERCENTAGE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Value of one invoice line. Lines with a weight are priced by weight.
pub fn line_value(quantity: Decimal, weight: Decimal, price: Decimal) -> Decimal {
    if weight > Decimal::ZERO {
        weight * price
    } else {
        quantity * price
    }
}

/// Stored totals of an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub total_items: Decimal,
    pub total_expenses: Decimal,
    pub net_total: Decimal,
}

/// Totals for a trade invoice.
///
/// Expenses raise the landed cost of a purchase and reduce the proceeds of a sale.
pub fn compute_totals(
    invoice_type: InvoiceType,
    items: &[InvoiceLine],
    expenses: &[Decimal],
) -> InvoiceTotals {
    let total_items: Decimal = items
        .iter()
        .map(|l| line_value(l.quantity, l.weight, l.price))
        .sum();
    let total_expenses: Decimal = expenses.iter().sum();
    let net_total = match invoice_type {
        InvoiceType::Buy => total_items + total_expenses,
        InvoiceType::Sell => total_items - total_expenses,
    };

    InvoiceTotals {
        total_items,
        total_expenses,
        net_total,
    }
}

/// Per-unit cost of a manufacturing run
pub fn manufacturing_unit_cost(
    total_input_value: Decimal,
    total_expenses: Decimal,
    output_quantity: Decimal,
) -> Option<Decimal> {
    if output_quantity <= Decimal::ZERO {
        return None;
    }
    Some(((total_input_value + total_expenses) / output_quantity).round_dp(4))
}

/// Value of the inputs of a manufacturing run at their known unit costs
pub fn mix_input_value(lines: &[MixLine]) -> Decimal {
    lines
        .iter()
        .filter_map(|l| l.unit_cost.map(|c| c * l.quantity))
        .sum()
}

/// When any input carries a percentage, all must, and they must add up to 100
pub fn validate_mix_percentages(lines: &[MixLine]) -> Result<(), &'static str> {
    let given = lines.iter().filter(|l| l.percentage.is_some()).count();
    if given == 0 {
        return Ok(());
    }
    if given != lines.len() {
        return Err("Either every input has a percentage or none does");
    }

    let mut total = Decimal::ZERO;
    for pct in lines.iter().filter_map(|l| l.percentage) {
        if pct < Decimal::ZERO {
            return Err("Mix percentages cannot be negative");
        }
        total += pct;
    }

    if (total - Decimal::ONE_HUNDRED).abs() > PERCENTAGE_TOLERANCE {
        return Err("Mix percentages must sum to 100");
    }
    Ok(())
}

/// Sequence part of a document number carrying `prefix`
pub fn invoice_sequence(prefix: &str, number: &str) -> Option<u64> {
    number
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<u64>().ok())
}

/// The highest-numbered document for `prefix`, compared by sequence rather
/// than as text, since numbers past 999999 grow wider than the padding.
pub fn latest_invoice_number<'a, I>(prefix: &str, numbers: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    numbers
        .into_iter()
        .filter_map(|number| invoice_sequence(prefix, number).map(|seq| (seq, number)))
        .max_by_key(|(seq, _)| *seq)
        .map(|(_, number)| number)
}

/// Next sequential document number, e.g. `BUY-000042`
pub fn next_invoice_number(prefix: &str, last: Option<&str>) -> String {
    let next = last
        .and_then(|n| invoice_sequence(prefix, n))
        .map_or(1, |n| n + 1);
    format!("{}-{:06}", prefix, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(q: &str, w: &str, p: &str) -> InvoiceLine {
        InvoiceLine {
            quantity: dec(q),
            weight: dec(w),
            price: dec(p),
        }
    }

    #[test]
    fn test_line_value_by_quantity() {
        assert_eq!(line_value(dec("10"), Decimal::ZERO, dec("2.5")), dec("25"));
    }

    #[test]
    fn test_line_value_by_weight() {
        // 4 sacks weighing 200 kg at 1.2 per kg
        assert_eq!(line_value(dec("4"), dec("200"), dec("1.2")), dec("240"));
    }

    #[test]
    fn test_buy_totals_include_expenses() {
        let totals = compute_totals(
            InvoiceType::Buy,
            &[line("10", "0", "5"), line("2", "0", "20")],
            &[dec("15"), dec("5")],
        );
        assert_eq!(totals.total_items, dec("90"));
        assert_eq!(totals.total_expenses, dec("20"));
        assert_eq!(totals.net_total, dec("110"));
    }

    #[test]
    fn test_sell_totals_deduct_expenses() {
        let totals = compute_totals(InvoiceType::Sell, &[line("100", "0", "3")], &[dec("25")]);
        assert_eq!(totals.net_total, dec("275"));
    }

    #[test]
    fn test_empty_invoice() {
        let totals = compute_totals(InvoiceType::Buy, &[], &[]);
        assert_eq!(totals.net_total, Decimal::ZERO);
    }

    #[test]
    fn test_unit_cost() {
        assert_eq!(
            manufacturing_unit_cost(dec("900"), dec("100"), dec("500")),
            Some(dec("2"))
        );
        assert_eq!(manufacturing_unit_cost(dec("900"), dec("100"), Decimal::ZERO), None);
    }

    #[test]
    fn test_mix_percentages() {
        let mix = |pcts: &[Option<&str>]| -> Vec<MixLine> {
            pcts.iter()
                .map(|p| MixLine {
                    quantity: dec("1"),
                    percentage: p.map(dec),
                    unit_cost: None,
                })
                .collect()
        };

        assert!(validate_mix_percentages(&mix(&[None, None])).is_ok());
        assert!(validate_mix_percentages(&mix(&[Some("60"), Some("40")])).is_ok());
        assert!(validate_mix_percentages(&mix(&[Some("33.33"), Some("33.33"), Some("33.34")])).is_ok());
        assert!(validate_mix_percentages(&mix(&[Some("60"), Some("30")])).is_err());
        assert!(validate_mix_percentages(&mix(&[Some("100"), None])).is_err());
        assert!(validate_mix_percentages(&mix(&[Some("120"), Some("-20")])).is_err());
    }

    #[test]
    fn test_mix_input_value_skips_unknown_costs() {
        let lines = vec![
            MixLine {
                quantity: dec("10"),
                percentage: None,
                unit_cost: Some(dec("2")),
            },
            MixLine {
                quantity: dec("5"),
                percentage: None,
                unit_cost: None,
            },
        ];
        assert_eq!(mix_input_value(&lines), dec("20"));
    }

    #[test]
    fn test_next_invoice_number() {
        assert_eq!(next_invoice_number("BUY", None), "BUY-000001");
        assert_eq!(next_invoice_number("BUY", Some("BUY-000041")), "BUY-000042");
        assert_eq!(next_invoice_number("SEL", Some("garbage")), "SEL-000001");
        assert_eq!(next_invoice_number("MFG", Some("MFG-999999")), "MFG-1000000");
    }

    #[test]
    fn test_latest_invoice_number_compares_sequences() {
        let numbers = ["BUY-999999", "BUY-1000000", "BUY-000007", "SEL-2000000"];
        assert_eq!(latest_invoice_number("BUY", numbers), Some("BUY-1000000"));
        assert_eq!(latest_invoice_number("MED", numbers), None);
        assert_eq!(invoice_sequence("BUY", "BUY-12a"), None);
        assert_eq!(invoice_sequence("BUY", "BUY-"), None);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The number allocated after the latest one was never issued before
            #[test]
            fn prop_next_number_is_fresh(sequences in prop::collection::vec(1u64..5_000_000u64, 1..20)) {
                let issued: Vec<String> = sequences.iter().map(|n| format!("BUY-{:06}", n)).collect();
                let last = latest_invoice_number("BUY", issued.iter().map(String::as_str));
                let next = next_invoice_number("BUY", last);
                prop_assert!(!issued.contains(&next));
            }
        }
    }
}
