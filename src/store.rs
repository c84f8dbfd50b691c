//! Session-scoped draft store.
//!
//! One `DraftStore` owns exactly one [`InvoiceDocument`] for the lifetime of
//! an editing session. It is an explicitly owned value the caller injects
//! where it is needed, not a process-wide singleton, and it is not built for
//! multi-writer access.
//!
//! Every mutation that can affect a derived field ends with the full
//! recompute pass from [`crate::calc::compute_totals`]. Recomputing is O(items)
//! and item counts are small, so simplicity wins over incremental diffing.

use chrono::Utc;
use uuid::Uuid;

use crate::calc;
use crate::models::{Account, Client, DetailsPatch, InvoiceDocument, LineItem, TemplateId};

/// A single field change on one line item. Field identity is checked at
/// compile time; there is no stringly-typed field dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEdit {
    Description(String),
    Quantity(f64),
    Rate(f64),
}

/// Holds the one invoice draft being edited.
#[derive(Debug, Clone)]
pub struct DraftStore {
    document: InvoiceDocument,
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftStore {
    /// A store holding a fresh blank draft.
    pub fn new() -> Self {
        DraftStore {
            document: InvoiceDocument::blank(),
        }
    }

    /// A fresh draft pre-seeded from the account: invoice number from the
    /// current sequence, due date thirty days out, default tax rate and notes.
    pub fn new_for_account(account: &Account) -> Self {
        let mut store = Self::new();
        let today = Utc::now().date_naive();
        store.set_details(DetailsPatch {
            invoice_number: Some(calc::invoice_number(
                &account.invoice_prefix,
                account.next_invoice_number,
            )),
            due_date: Some(calc::due_date(today, calc::DEFAULT_TERM_DAYS)),
            tax_rate: Some(account.tax_rate),
            notes: Some(account.default_notes.clone()),
            ..DetailsPatch::default()
        });
        store
    }

    /// Read access to the current document.
    pub fn document(&self) -> &InvoiceDocument {
        &self.document
    }

    /// Replace the client fields atomically. Items and totals are untouched.
    pub fn set_client(&mut self, client: &Client) {
        self.document.client_id = Some(client.id);
        self.document.client_name = client.name.clone();
        self.document.client_email = client.email.clone();
        self.document.client_address = client.address.clone();
    }

    /// Merge any subset of top-level non-derived fields into the draft.
    pub fn set_details(&mut self, patch: DetailsPatch) {
        if let Some(number) = patch.invoice_number {
            self.document.invoice_number = number;
        }
        if let Some(date) = patch.issue_date {
            self.document.issue_date = Some(date);
        }
        if let Some(date) = patch.due_date {
            self.document.due_date = Some(date);
        }
        if let Some(rate) = patch.tax_rate {
            self.document.tax_rate = rate;
        }
        if let Some(notes) = patch.notes {
            self.document.notes = notes;
        }
        if let Some(template) = patch.template_id {
            self.document.template_id = template;
        }
        calc::compute_totals(&mut self.document);
    }

    /// Append a blank line item and return its id. A blank item has amount
    /// zero, but the recompute pass still runs for consistency.
    pub fn add_item(&mut self) -> Uuid {
        let item = LineItem::blank();
        let id = item.id;
        self.document.items.push(item);
        calc::compute_totals(&mut self.document);
        id
    }

    /// Apply one field edit to the item with the given id, then recompute
    /// the whole document. Unknown id is a no-op.
    pub fn update_item(&mut self, id: Uuid, edit: ItemEdit) {
        let Some(item) = self.document.items.iter_mut().find(|item| item.id == id) else {
            return;
        };
        match edit {
            ItemEdit::Description(description) => item.description = description,
            ItemEdit::Quantity(quantity) => item.quantity = quantity,
            ItemEdit::Rate(rate) => item.rate = rate,
        }
        calc::compute_totals(&mut self.document);
    }

    /// Remove the item with the given id, unless it is the last one left;
    /// an invoice always keeps at least one line.
    pub fn remove_item(&mut self, id: Uuid) {
        if self.document.items.len() == 1 {
            return;
        }
        self.document.items.retain(|item| item.id != id);
        calc::compute_totals(&mut self.document);
    }

    pub fn set_discount_percent(&mut self, percent: f64) {
        self.document.discount_percent = percent;
        calc::compute_totals(&mut self.document);
    }

    pub fn set_tax_rate(&mut self, rate: f64) {
        self.document.tax_rate = rate;
        calc::compute_totals(&mut self.document);
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.document.notes = notes.into();
    }

    pub fn set_template(&mut self, template: TemplateId) {
        self.document.template_id = template;
    }

    /// Replace the draft with a fresh blank one.
    pub fn reset(&mut self) {
        self.document = InvoiceDocument::blank();
    }

    /// Replace the draft with a persisted document, for editing an existing
    /// record. Totals are recomputed so a stale record cannot carry drifted
    /// derived fields into the session.
    pub fn load(&mut self, document: InvoiceDocument) {
        self.document = document;
        calc::compute_totals(&mut self.document);
    }
}
