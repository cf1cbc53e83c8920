//! `dentaldash-conciliation` — pairs clinical encounters with sales.
//!
//! Pure engine crate: receives pre-loaded records, returns consolidated
//! records and statistics. No CLI dependencies; the CSV loader takes
//! already-read strings.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod model;
pub mod patient;
pub mod stats;
pub mod timeutil;

pub use config::ConciliationConfig;
pub use engine::run;
pub use error::ConciliationError;
pub use matcher::consolidate;
pub use model::{
    ConciliationInput, ConciliationStats, ConciliationStatus, ConsolidatedRecord,
    ConsolidatedResponse, EncounterRecord, PatientAge, RecordSides, SaleRecord,
};
pub use stats::compute_stats;
