//! Invoice model for invoice-core.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::LineItem;

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Viewed,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Viewed => "viewed",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "sent" => InvoiceStatus::Sent,
            "viewed" => InvoiceStatus::Viewed,
            "paid" => InvoiceStatus::Paid,
            "overdue" => InvoiceStatus::Overdue,
            _ => InvoiceStatus::Draft,
        }
    }
}

/// Visual template applied when the invoice is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    Professional,
    Modern,
    Minimal,
}

impl TemplateId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Professional => "professional",
            TemplateId::Modern => "modern",
            TemplateId::Minimal => "minimal",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "modern" => TemplateId::Modern,
            "minimal" => TemplateId::Minimal,
            _ => TemplateId::Professional,
        }
    }

    /// Modern and Minimal are reserved for paid accounts.
    pub fn requires_pro(&self) -> bool {
        !matches!(self, TemplateId::Professional)
    }
}

/// Client fields copied onto a draft when one is selected.
#[derive(Debug, Clone, Default)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub address: String,
}

/// The invoice being edited. Derived fields (`subtotal`, `discount_amount`,
/// `tax_amount`, `total`, each item's `amount`) are owned by the recompute
/// pass in [`crate::calc::compute_totals`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub client_email: String,
    pub client_address: String,
    pub invoice_number: String,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub discount_percent: f64,
    pub discount_amount: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub notes: String,
    pub template_id: TemplateId,
    pub status: InvoiceStatus,
}

impl InvoiceDocument {
    /// A fresh blank document: one blank item, today's issue date, all
    /// derived fields zeroed.
    pub fn blank() -> Self {
        InvoiceDocument {
            client_id: None,
            client_name: String::new(),
            client_email: String::new(),
            client_address: String::new(),
            invoice_number: String::new(),
            issue_date: Some(Utc::now().date_naive()),
            due_date: None,
            items: vec![LineItem::blank()],
            subtotal: 0.0,
            discount_percent: 0.0,
            discount_amount: 0.0,
            tax_rate: 0.0,
            tax_amount: 0.0,
            total: 0.0,
            notes: String::new(),
            template_id: TemplateId::Professional,
            status: InvoiceStatus::Draft,
        }
    }
}

/// Partial update for top-level non-derived fields of a draft.
#[derive(Debug, Clone, Default)]
pub struct DetailsPatch {
    pub invoice_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub tax_rate: Option<f64>,
    pub notes: Option<String>,
    pub template_id: Option<TemplateId>,
}

/// A persisted invoice row. Items are stored inline as JSONB.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceRecord {
    pub invoice_id: Uuid,
    pub user_id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub client_address: String,
    pub invoice_number: String,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub items: Json<Vec<LineItem>>,
    pub subtotal: f64,
    pub discount_percent: f64,
    pub discount_amount: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub notes: String,
    pub template_id: String,
    pub status: String,
    pub view_count: i64,
    pub viewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InvoiceRecord {
    /// Rebuild an editable document from this record, for update-in-place
    /// editing of an already persisted invoice.
    pub fn into_document(self) -> InvoiceDocument {
        InvoiceDocument {
            client_id: Some(self.client_id),
            client_name: self.client_name,
            client_email: self.client_email,
            client_address: self.client_address,
            invoice_number: self.invoice_number,
            issue_date: self.issue_date,
            due_date: self.due_date,
            items: self.items.0,
            subtotal: self.subtotal,
            discount_percent: self.discount_percent,
            discount_amount: self.discount_amount,
            tax_rate: self.tax_rate,
            tax_amount: self.tax_amount,
            total: self.total,
            notes: self.notes,
            template_id: TemplateId::from_string(&self.template_id),
            status: InvoiceStatus::from_string(&self.status),
        }
    }
}
