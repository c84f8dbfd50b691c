//! Pure invoice arithmetic.
//!
//! Every function here is stateless and deterministic. Monetary values are
//! plain `f64`; the crate makes no fixed-point guarantees, matching the
//! contract the rest of the system is built on. Non-finite inputs (the
//! typed equivalent of unparseable user input) coerce to zero rather than
//! erroring, so these functions never panic.
//!
//! Percent inputs are deliberately not clamped: out-of-range discount or tax
//! rates flow through arithmetically. Range enforcement belongs at the input
//! boundary, not here.

use chrono::{Days, NaiveDate};

use crate::models::{InvoiceDocument, LineItem};

/// Default payment term applied when an issue date is chosen.
pub const DEFAULT_TERM_DAYS: u64 = 30;

fn coerce(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Amount for a single line: `quantity * rate`.
pub fn item_amount(quantity: f64, rate: f64) -> f64 {
    coerce(quantity) * coerce(rate)
}

/// Sum of item amounts. A malformed (non-finite) amount counts as zero.
pub fn subtotal(items: &[LineItem]) -> f64 {
    items.iter().map(|item| coerce(item.amount)).sum()
}

/// Discount amount: `subtotal * percent / 100`.
pub fn discount(subtotal: f64, percent: f64) -> f64 {
    subtotal * coerce(percent) / 100.0
}

/// Tax amount. The taxable base is the post-discount subtotal.
pub fn tax(subtotal: f64, discount_amount: f64, rate: f64) -> f64 {
    let taxable = subtotal - discount_amount;
    taxable * coerce(rate) / 100.0
}

/// Final total: subtotal less discount, plus tax.
pub fn total(subtotal: f64, discount_amount: f64, tax_amount: f64) -> f64 {
    subtotal - discount_amount + tax_amount
}

/// Human-readable invoice number: prefix plus the sequence zero-padded to
/// four digits. Larger sequences are never truncated.
pub fn invoice_number(prefix: &str, sequence: i64) -> String {
    format!("{}-{:04}", prefix, sequence)
}

/// Due date: issue date plus `term_days` calendar days.
pub fn due_date(issue_date: NaiveDate, term_days: u64) -> NaiveDate {
    issue_date
        .checked_add_days(Days::new(term_days))
        .unwrap_or(issue_date)
}

/// Format an amount for display in the given currency, `$` fallback.
pub fn format_currency(amount: f64, currency: &str) -> String {
    let symbol = match currency {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "ZAR" => "R",
        "INR" => "₹",
        _ => "$",
    };
    format!("{}{:.2}", symbol, amount)
}

/// Full recompute pass over a document: each item's amount, then subtotal,
/// discount amount, tax amount, and total, in that order.
///
/// Always a complete pass over current state, never an incremental patch, so
/// no derived field can drift from its inputs regardless of mutation order.
/// Idempotent: running it twice on an unchanged document changes nothing.
pub fn compute_totals(doc: &mut InvoiceDocument) {
    for item in &mut doc.items {
        item.amount = item_amount(item.quantity, item.rate);
    }
    doc.subtotal = subtotal(&doc.items);
    doc.discount_amount = discount(doc.subtotal, doc.discount_percent);
    doc.tax_amount = tax(doc.subtotal, doc.discount_amount, doc.tax_rate);
    doc.total = total(doc.subtotal, doc.discount_amount, doc.tax_amount);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;

    const EPS: f64 = 1e-9;

    fn item(quantity: f64, rate: f64) -> LineItem {
        let mut it = LineItem::blank();
        it.quantity = quantity;
        it.rate = rate;
        it.amount = item_amount(quantity, rate);
        it
    }

    #[test]
    fn item_amount_is_quantity_times_rate() {
        assert_eq!(item_amount(2.0, 50.0), 100.0);
        assert_eq!(item_amount(0.0, 99.0), 0.0);
        assert_eq!(item_amount(3.0, 0.0), 0.0);
    }

    #[test]
    fn item_amount_coerces_non_numeric_input_to_zero() {
        assert_eq!(item_amount(f64::NAN, 50.0), 0.0);
        assert_eq!(item_amount(2.0, f64::INFINITY), 0.0);
        assert_eq!(item_amount(f64::NAN, f64::NAN), 0.0);
    }

    #[test]
    fn subtotal_sums_item_amounts() {
        let items = vec![item(2.0, 50.0), item(1.0, 30.0)];
        assert_eq!(subtotal(&items), 130.0);
    }

    #[test]
    fn subtotal_treats_malformed_amount_as_zero() {
        let mut bad = item(1.0, 10.0);
        bad.amount = f64::NAN;
        let items = vec![item(2.0, 50.0), bad];
        assert_eq!(subtotal(&items), 100.0);
    }

    #[test]
    fn tax_base_is_post_discount() {
        let sub = 130.0;
        let disc = discount(sub, 10.0);
        assert_eq!(disc, 13.0);
        assert_eq!(tax(sub, disc, 8.0), 9.36);
    }

    #[test]
    fn percent_inputs_are_not_clamped() {
        // Out-of-range percentages propagate arithmetically; range checks
        // belong to the input boundary.
        assert_eq!(discount(100.0, 150.0), 150.0);
        assert_eq!(discount(100.0, -10.0), -10.0);
        assert_eq!(tax(100.0, 0.0, 200.0), 200.0);
    }

    #[test]
    fn invoice_number_pads_to_four_digits() {
        assert_eq!(invoice_number("INV", 1), "INV-0001");
        assert_eq!(invoice_number("INV", 42), "INV-0042");
        assert_eq!(invoice_number("INV", 7), "INV-0007");
    }

    #[test]
    fn invoice_number_never_truncates_long_sequences() {
        assert_eq!(invoice_number("A", 12345), "A-12345");
    }

    #[test]
    fn due_date_adds_calendar_days() {
        let issue = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
        let due = due_date(issue, DEFAULT_TERM_DAYS);
        assert_eq!(due, NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
    }

    #[test]
    fn format_currency_uses_known_symbols() {
        assert_eq!(format_currency(126.36, "USD"), "$126.36");
        assert_eq!(format_currency(9.5, "EUR"), "€9.50");
        assert_eq!(format_currency(100.0, "ZAR"), "R100.00");
        assert_eq!(format_currency(1.0, "XYZ"), "$1.00");
    }

    #[test]
    fn compute_totals_scenario_two_items_discount_and_tax() {
        let mut doc = InvoiceDocument::blank();
        doc.items = vec![item(2.0, 50.0), item(1.0, 30.0)];
        doc.discount_percent = 10.0;
        doc.tax_rate = 8.0;

        compute_totals(&mut doc);

        assert_eq!(doc.subtotal, 130.0);
        assert_eq!(doc.discount_amount, 13.0);
        assert!((doc.tax_amount - 9.36).abs() < EPS);
        assert!((doc.total - 126.36).abs() < EPS);
    }

    #[test]
    fn compute_totals_is_idempotent() {
        let mut doc = InvoiceDocument::blank();
        doc.items = vec![item(3.0, 19.99), item(2.0, 7.5)];
        doc.discount_percent = 12.5;
        doc.tax_rate = 15.0;

        compute_totals(&mut doc);
        let first = doc.clone();
        compute_totals(&mut doc);

        assert_eq!(doc, first);
    }

    #[test]
    fn compute_totals_repairs_a_drifted_item_amount() {
        let mut doc = InvoiceDocument::blank();
        let mut drifted = item(2.0, 50.0);
        drifted.amount = 999.0;
        doc.items = vec![drifted];

        compute_totals(&mut doc);

        assert_eq!(doc.items[0].amount, 100.0);
        assert_eq!(doc.subtotal, 100.0);
    }
}
