//! Storage Layer - SQLite-backed persistence
//!
//! The system of record is one SQLite file holding a single table:
//! - dermatologists(id, name, city, status, specialties)
//!
//! `provision` creates that file once; `sqlite` reads it.

pub mod schema;
pub mod provision;
pub mod sqlite;

pub use provision::{DatabaseProvisioner, ProvisionOutcome, ProvisionPlan, ProvisioningError};
pub use sqlite::{DermatologistStore, QueryOutput, DbStats};
