//! Core domain types and the gap-analytics computation.

pub mod bar;
pub mod numeric;
pub mod binning;
pub mod gap_event;
pub mod aggregation;
pub mod intraday;
pub mod report;
pub mod analysis;
pub mod error;
