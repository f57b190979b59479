//! Pipeline entry points.
//!
//! - `detect_new`: keyed set difference between a fetch and the store
//! - `Tracker`: one full check, from fetch to notification

pub mod diff;
pub mod tracker;

pub use diff::{collapse_duplicates, detect_new};
pub use tracker::{RunOutcome, RunReport, Tracker};
