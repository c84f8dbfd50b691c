//! Invoice computation, drafting, and persistence core.
//!
//! The crate is split the same way the data flows: [`calc`] holds the pure
//! arithmetic, [`store`] keeps a single in-progress draft consistent while it
//! is edited, and [`services`] validates a finished document and commits it
//! to Postgres while advancing the owning account's invoice sequence.

pub mod calc;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod services;
pub mod store;

pub use error::AppError;
