//! Edge extraction: Sobel gradients and Canny-style edge masks.
//!
//! - [`grad`]: 3×3 Sobel derivatives with replicated borders.
//! - [`canny`]: direction-aligned non-maximum suppression, hysteresis, and a
//!   multi-threshold variant that unions several (low, high) pairs while
//!   computing gradients and suppression only once.

pub mod canny;
pub mod grad;

pub use canny::{canny, multi_canny, CannyThresholds};
pub use grad::{sobel_gradients, Grad};
