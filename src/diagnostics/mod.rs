//! Structured diagnostics shared by the measurement stages.
//!
//! Warnings that the pipeline tolerates (skewed grid, implausible object
//! size, empty refinement ROI, ...) are both logged through `log::warn!` and
//! collected as [`Warning`] values on the returned structures, so callers and
//! tests can inspect them without scraping console output.

pub mod timing;
pub mod warnings;

pub use timing::{StageTimer, StageTiming, TimingBreakdown};
pub use warnings::{Warning, WarningLog};
