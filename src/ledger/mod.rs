//! Local ledger - contact rows and the paths that queue remote changes.
//!
//! - `ContactSaver`: the enqueue path (validate, write row, enqueue change)
//! - `LinkBackfill`: queues link-only changes for every linked contact
//! - `Cadence`, `Scores`: contact scoring and follow-up rules

mod backfill;
mod cadence;
mod contact;
mod error;
mod saver;
mod scoring;

pub use backfill::{BackfillProgress, LinkBackfill};
pub use cadence::{Cadence, NextContactStatus};
pub use contact::{Contact, Ledger};
pub use error::SaveError;
pub use saver::{ContactSaver, SaveOutcome, SaveRequest};
pub use scoring::Scores;
