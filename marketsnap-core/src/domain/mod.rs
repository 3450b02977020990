//! Domain types for marketsnap

pub mod record;
pub mod row;

pub use record::{change_pct, Category, Outcome, Record};
pub use row::{Batch, Row, COLUMNS};
