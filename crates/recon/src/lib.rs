//! `devrecon-recon`: device inventory reconciliation engine.
//!
//! Pure engine crate: receives decoded records and a reference id set,
//! returns the unmatched projections plus counters. No file IO.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;

pub use config::ReconConfig;
pub use engine::{find_unmatched, try_find_unmatched};
pub use error::ReconError;
pub use model::{
    DeviceRecord, ReconMeta, ReconSummary, Reconciliation, ReferenceIdSet, UnmatchedRecord,
};
