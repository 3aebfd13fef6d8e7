//! # Video Ledger
//!
//! Durable record of the videos that have gone through a complete
//! fetch/analyze/notify cycle.
//!
//! The ledger is a flat, newline-delimited UTF-8 file with one video identifier
//! per line. It is only ever appended to; every append is synced to disk before
//! returning, which makes a single append the commit point of a processed video.

mod datastore;
mod domain;

pub use datastore::file::FileLedger;
pub use datastore::{HistorySet, Ledger, LedgerError};
pub use domain::VideoRecord;
