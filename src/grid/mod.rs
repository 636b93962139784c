//! Grid-line bookkeeping in rectified space.
//!
//! - [`cluster1d`]: merge the endpoint coordinates of classified segments into
//!   one representative coordinate per printed grid line.
//! - [`spacing`]: turn clustered line positions into a px-per-cm estimate and
//!   count lines crossing a box.

pub mod cluster1d;
pub mod spacing;

pub use cluster1d::{adaptive_tolerance, cluster_coords, ClusterOptions};
pub use spacing::{filtered_gaps, lines_inside, median, median_spacing};
