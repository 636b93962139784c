//! Staging of captured JPEG bytes for measurement.
//!
//! Camera uploads sometimes carry trailing garbage after the JPEG
//! end-of-image marker; [`fix_jpeg_bytes`] cuts it off. [`StagedImage`] holds
//! the bytes in a named temp file that is removed when the last handle to it
//! drops, on every exit path.
use crate::error::MeasureResult;
use crate::orchestrator::{KeepAlive, MeasurementOrchestrator, MeasurementResult};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

const EOI: [u8; 2] = [0xFF, 0xD9];

/// Truncate after the last `FF D9` marker; bytes without one are returned
/// unchanged.
pub fn fix_jpeg_bytes(bytes: &[u8]) -> &[u8] {
    match bytes.windows(2).rposition(|w| w == EOI) {
        Some(pos) => &bytes[..pos + 2],
        None => bytes,
    }
}

/// Captured image written to a temporary `.jpg` file.
#[derive(Debug)]
pub struct StagedImage {
    file: Arc<NamedTempFile>,
}

impl StagedImage {
    pub fn new(bytes: &[u8], label: &str) -> MeasureResult<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("capture_{label}_"))
            .suffix(".jpg")
            .tempfile()?;
        file.write_all(fix_jpeg_bytes(bytes))?;
        file.flush()?;
        log::debug!("StagedImage::new {} ({} bytes)", file.path().display(), bytes.len());
        Ok(Self {
            file: Arc::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Handle that keeps the file on disk while any clone of it is alive.
    pub fn share(&self) -> Arc<NamedTempFile> {
        Arc::clone(&self.file)
    }
}

/// Stage a front (bottom-view) and side capture and measure them. Both temp
/// files are removed once this returns and no timed-out worker still reads
/// them.
pub fn measure_captured(
    orchestrator: &MeasurementOrchestrator,
    front: &[u8],
    side: &[u8],
) -> MeasureResult<MeasurementResult> {
    let front = StagedImage::new(front, "front")?;
    let side = StagedImage::new(side, "side")?;
    let keep_alive: KeepAlive = Arc::new((front.share(), side.share()));
    orchestrator.measure_holding(front.path(), side.path(), keep_alive)
}
