//! Image containers and the low-level filters the measurement stages share.
//!
//! Colour frames travel as `image::RgbImage`; every numeric stage works on
//! the single-channel buffers defined here:
//!
//! - [`ImageU8`]: borrowed 8-bit view with stride.
//! - [`GrayImageU8`]: owned 8-bit buffer (also used for binary masks, 0/255).
//! - [`ImageF32`]: owned float buffer for gradients and accumulators.
//!
//! Filters mirror the classic toolbox the calibration and refinement stages
//! need: CLAHE, bilateral smoothing, rectangular-kernel morphology and
//! perspective warping.

pub mod bilateral;
pub mod clahe;
pub mod f32;
pub mod io;
pub mod morph;
pub mod traits;
pub mod u8;
pub mod warp;

pub use self::f32::ImageF32;
pub use self::traits::{ImageView, ImageViewMut, Rows};
pub use self::u8::{GrayImageU8, ImageU8};
