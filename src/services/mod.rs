//! Services module for invoice-core.

pub mod database;
pub mod metrics;
pub mod save;
pub mod validation;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
