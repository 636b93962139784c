//! Straight grid-line segments from binary edge masks.
//!
//! - [`hough`]: Hough accumulator plus a deterministic probabilistic-style
//!   segment walk along each accumulator peak. Several (min length, max gap)
//!   combinations can share one accumulator.
//! - [`types`]: integer segments and their axis classification.

pub mod hough;
pub mod types;

pub use hough::{find_segments, find_segments_multi, HoughOptions, SegmentSearch};
pub use types::{classify_segments, Classified, LineSegment, Orientation};
