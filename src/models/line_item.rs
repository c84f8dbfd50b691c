//! Line item model for invoice-core.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single billable entry on an invoice.
///
/// `amount` is derived and always equals `quantity * rate` at rest; it is
/// only ever written by the recompute pass, never set directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: Uuid,
    pub description: String,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
}

impl LineItem {
    /// A fresh blank item: quantity 1, rate 0, amount 0.
    pub fn blank() -> Self {
        LineItem {
            id: Uuid::new_v4(),
            description: String::new(),
            quantity: 1.0,
            rate: 0.0,
            amount: 0.0,
        }
    }
}
