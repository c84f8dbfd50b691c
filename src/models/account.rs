//! Business account model for invoice-core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription tier for a business account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Pro,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "pro" => Plan::Pro,
            _ => Plan::Free,
        }
    }

    /// Monthly invoice cap, `None` for unlimited.
    pub fn monthly_limit(&self) -> Option<i64> {
        match self {
            Plan::Free => Some(5),
            Plan::Pro => None,
        }
    }
}

/// A business account row. Owns the invoice numbering sequence: the
/// `next_invoice_number` counter is only ever advanced by the persistence
/// gateway, as part of committing a new invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub account_id: Uuid,
    pub business_name: String,
    pub business_email: String,
    pub business_phone: Option<String>,
    pub business_address: Option<String>,
    pub invoice_prefix: String,
    pub currency: String,
    pub tax_rate: f64,
    pub default_notes: String,
    pub plan: String,
    pub invoices_this_month: i64,
    pub next_invoice_number: i64,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn plan(&self) -> Plan {
        Plan::from_string(&self.plan)
    }

    /// Whether the account may create another invoice this month. Quota is
    /// the caller's responsibility; the persistence gateway does not check it.
    pub fn has_capacity(&self) -> bool {
        match self.plan().monthly_limit() {
            Some(limit) => self.invoices_this_month < limit,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_with(plan: &str, invoices_this_month: i64) -> Account {
        Account {
            account_id: Uuid::new_v4(),
            business_name: "Acme Studio".to_string(),
            business_email: "billing@acme.test".to_string(),
            business_phone: None,
            business_address: None,
            invoice_prefix: "INV".to_string(),
            currency: "USD".to_string(),
            tax_rate: 0.0,
            default_notes: "Thank you for your business!".to_string(),
            plan: plan.to_string(),
            invoices_this_month,
            next_invoice_number: 1,
            logo_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn free_plan_caps_at_five_per_month() {
        assert!(account_with("free", 0).has_capacity());
        assert!(account_with("free", 4).has_capacity());
        assert!(!account_with("free", 5).has_capacity());
        assert!(!account_with("free", 6).has_capacity());
    }

    #[test]
    fn pro_plan_is_unlimited() {
        assert!(account_with("pro", 100_000).has_capacity());
        assert_eq!(Plan::Pro.monthly_limit(), None);
    }

    #[test]
    fn unknown_plan_string_falls_back_to_free() {
        assert_eq!(Plan::from_string("enterprise"), Plan::Free);
    }
}
