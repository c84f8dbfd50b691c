//! Domain models for invoice-core.

mod account;
mod invoice;
mod line_item;

pub use account::{Account, Plan};
pub use invoice::{Client, DetailsPatch, InvoiceDocument, InvoiceRecord, InvoiceStatus, TemplateId};
pub use line_item::LineItem;
