//! Runs the width, height and depth procedures for one piece and aggregates
//! their values.
//!
//! Width and height are measured on the bottom (top-down) image, depth on the
//! side image. Each procedure runs on its own worker thread and the request
//! waits at most `timeout` for all of them; an axis that fails, panics, times
//! out or reports no value becomes `null` with an entry in `errors`, and the
//! other axes are unaffected. Only a missing input image aborts the request.
//!
//! A timed-out worker is left running detached. [`KeepAlive`] handles passed
//! to [`MeasurementOrchestrator::measure_holding`] are released only once
//! every worker has finished with its image.

pub mod extract;
pub mod result;

pub use extract::extract_value;
pub use result::{
    weight_kg, AggregateStatus, AxisFailure, AxisState, MeasurementResult, STEEL_DENSITY_G_CM3,
};

use crate::error::{ExecutionError, MeasureError, MeasureResult};
use crate::procedure::{AxisMeasurers, ProcedureOutput};
use crate::types::{cm_to_mm, MeasurementKind};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const TARGET: &str = "MeasurementOrchestrator";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

type Outcome = MeasureResult<ProcedureOutput>;

/// Resource that must outlive every worker reading the input images.
pub type KeepAlive = Arc<dyn Any + Send + Sync>;

pub struct MeasurementOrchestrator {
    measurers: AxisMeasurers,
    timeout: Duration,
}

fn index(kind: MeasurementKind) -> usize {
    match kind {
        MeasurementKind::Width => 0,
        MeasurementKind::Height => 1,
        MeasurementKind::Depth => 2,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

impl MeasurementOrchestrator {
    pub fn new(measurers: AxisMeasurers) -> Self {
        Self {
            measurers,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Measure a piece from its bottom and side photos.
    pub fn measure(&self, bottom: &Path, side: &Path) -> MeasureResult<MeasurementResult> {
        self.measure_holding(bottom, side, Arc::new(()))
    }

    /// Like [`measure`](Self::measure); each worker holds a clone of
    /// `keep_alive` until its procedure returns, even past the timeout.
    pub fn measure_holding(
        &self,
        bottom: &Path,
        side: &Path,
        keep_alive: KeepAlive,
    ) -> MeasureResult<MeasurementResult> {
        for path in [bottom, side] {
            if !path.is_file() {
                return Err(MeasureError::missing_input(path));
            }
        }

        let mut states = [AxisState::NotStarted, AxisState::NotStarted, AxisState::NotStarted];
        let mut outcomes: [Option<Outcome>; 3] = [None, None, None];
        let (tx, rx) = mpsc::channel::<(MeasurementKind, Outcome)>();

        for kind in MeasurementKind::ALL {
            let image: PathBuf = match kind {
                MeasurementKind::Depth => side.to_path_buf(),
                _ => bottom.to_path_buf(),
            };
            log::debug!("{TARGET}: starting {kind} on {}", image.display());
            let measurer = Arc::clone(self.measurers.get(kind));
            let tx = tx.clone();
            let held = Arc::clone(&keep_alive);
            let spawned = thread::Builder::new()
                .name(format!("measure-{}", kind.to_string().to_lowercase()))
                .spawn(move || {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| measurer.measure(&image)))
                        .unwrap_or_else(|p| Err(ExecutionError::Crashed(panic_message(p)).into()));
                    // Released before reporting so a collected axis holds nothing.
                    drop(held);
                    let _ = tx.send((kind, outcome));
                });
            match spawned {
                Ok(_) => states[index(kind)] = AxisState::Running,
                Err(e) => {
                    let err = ExecutionError::Crashed(e.to_string());
                    outcomes[index(kind)] = Some(Err(err.into()));
                }
            }
        }
        drop(tx);

        let deadline = Instant::now() + self.timeout;
        let mut timed_out = false;
        while outcomes.iter().any(Option::is_none) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((kind, outcome)) => outcomes[index(kind)] = Some(outcome),
                Err(RecvTimeoutError::Timeout) => {
                    timed_out = true;
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let mut errors = Vec::new();
        let mut failures = Vec::new();
        for kind in MeasurementKind::ALL {
            let i = index(kind);
            let measurer = self.measurers.get(kind);
            let outcome = outcomes[i].take().unwrap_or_else(|| {
                let err = if timed_out {
                    ExecutionError::Timeout(self.timeout)
                } else {
                    ExecutionError::Crashed("worker exited without a result".into())
                };
                Err(err.into())
            });
            let resolved = outcome.and_then(|output| {
                output.value_cm(kind).ok_or_else(|| {
                    MeasureError::parse(format!(
                        "Failed to extract {} measurement from {} output",
                        kind.to_string().to_lowercase(),
                        measurer.name()
                    ))
                })
            });
            states[i] = match resolved {
                Ok(cm) => {
                    log::info!("{TARGET}: {kind} measured: {cm} cm");
                    AxisState::Succeeded(cm_to_mm(cm))
                }
                Err(e) => {
                    let message = match &e {
                        MeasureError::Parse(msg) => msg.clone(),
                        other => format!("{kind} measurement failed: {other}"),
                    };
                    log::warn!("{TARGET}: {message}");
                    failures.push(AxisFailure {
                        axis: kind,
                        kind: e.kind(),
                    });
                    errors.push(message.clone());
                    AxisState::Failed(message)
                }
            };
        }

        let [width, height, depth] = &states;
        let result = MeasurementResult::from_states(width, height, depth, errors, failures);
        log::debug!("{TARGET}::measure status {:?}", result.status);
        Ok(result)
    }
}
