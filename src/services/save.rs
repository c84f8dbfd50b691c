//! Validate-then-persist workflow.
//!
//! The gateway itself never validates or checks quota; those gates live
//! here, between the editing session and the database. On any failure the
//! in-memory document is untouched, so the caller can fix the input and
//! retry without losing work.

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Account, InvoiceDocument};
use crate::services::metrics::ERRORS_TOTAL;
use crate::services::{validation, Database};

/// Save a finished draft as a new record. Checks the account's monthly quota,
/// then completeness; a validation failure carries every violated rule.
/// Numbering advances only when the commit succeeds.
#[instrument(skip(db, account, document), fields(account_id = %account.account_id))]
pub async fn save_draft(
    db: &Database,
    account: &Account,
    document: &InvoiceDocument,
) -> Result<Uuid, AppError> {
    if !account.has_capacity() {
        warn!(account_id = %account.account_id, "Monthly invoice limit reached");
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Monthly invoice limit reached for the {} plan",
            account.plan
        )));
    }

    let errors = validation::validate(document);
    if !errors.is_empty() {
        ERRORS_TOTAL.with_label_values(&["validation"]).inc();
        return Err(AppError::Validation(errors));
    }

    let invoice_id = db.create_invoice(account.account_id, document).await?;
    info!(invoice_id = %invoice_id, "Draft saved");
    Ok(invoice_id)
}

/// Overwrite an already persisted invoice with the edited document. Runs the
/// same completeness checks; never re-triggers numbering.
#[instrument(skip(db, document), fields(invoice_id = %invoice_id))]
pub async fn update_draft(
    db: &Database,
    invoice_id: Uuid,
    document: &InvoiceDocument,
) -> Result<(), AppError> {
    let errors = validation::validate(document);
    if !errors.is_empty() {
        ERRORS_TOTAL.with_label_values(&["validation"]).inc();
        return Err(AppError::Validation(errors));
    }

    db.update_invoice(invoice_id, document).await
}
