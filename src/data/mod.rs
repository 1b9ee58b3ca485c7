//! Data ingestion
//!
//! Page fetching, the per-page scrapers, and the per-team / league-wide
//! extraction drivers built on top of them.

pub mod batch;
pub mod extractor;
pub mod opponents;
pub mod scrapers;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchRunner, CancelFlag, LeagueReport, TeamReport};
pub use extractor::TeamExtractor;
pub use opponents::OpponentTable;
pub use source::{Clock, FixedClock, HttpSource, PageSource, SystemClock};
