//! Pre-save validation and invoice numbering.

use crate::calc;
use crate::models::{Account, InvoiceDocument};

/// Check a document for completeness before a save is allowed to proceed.
///
/// Every rule runs independently; one failure never hides another. An empty
/// list means the document is save-ready.
pub fn validate(document: &InvoiceDocument) -> Vec<String> {
    let mut errors = Vec::new();

    if document.client_id.is_none() {
        errors.push("Please select a client".to_string());
    }

    if document.items.is_empty() {
        errors.push("Add at least one item".to_string());
    }

    if document.items.iter().any(|item| item.description.is_empty()) {
        errors.push("All items must have a description".to_string());
    }

    if document.items.iter().any(|item| !(item.amount > 0.0)) {
        errors.push("All items must have a quantity and rate".to_string());
    }

    if document.invoice_number.is_empty() {
        errors.push("Invoice number is required".to_string());
    }

    if document.issue_date.is_none() {
        errors.push("Issue date is required".to_string());
    }

    if document.due_date.is_none() {
        errors.push("Due date is required".to_string());
    }

    errors
}

/// The number the account's next invoice will receive. Pure read; the
/// sequence counter only advances when a save actually commits.
pub fn next_number(account: &Account) -> String {
    calc::invoice_number(&account.invoice_prefix, account.next_invoice_number)
}
