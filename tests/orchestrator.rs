mod common;

use approx::assert_relative_eq;
use common::synthetic_image::init_logging;
use grid_gauge::capture::measure_captured;
use grid_gauge::error::{CalibrationError, FailureKind, MeasureError, MeasureResult};
use grid_gauge::orchestrator::{AggregateStatus, MeasurementOrchestrator};
use grid_gauge::procedure::{AxisMeasurers, Measurer, ProcedureOutput};
use grid_gauge::types::MeasurementKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

enum Behaviour {
    Print(&'static str),
    Sleep(Duration, &'static str),
    FailCalibration,
    Panic,
}

struct StubMeasurer {
    name: &'static str,
    behaviour: Behaviour,
    calls: AtomicUsize,
    seen: Mutex<Vec<(PathBuf, bool)>>,
}

impl StubMeasurer {
    fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name,
            behaviour,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }
}

impl Measurer for StubMeasurer {
    fn name(&self) -> &str {
        self.name
    }

    fn measure(&self, image: &Path) -> MeasureResult<ProcedureOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((image.to_path_buf(), image.is_file()));
        match &self.behaviour {
            Behaviour::Print(text) => Ok(ProcedureOutput::Transcript(text.to_string())),
            Behaviour::Sleep(d, text) => {
                thread::sleep(*d);
                Ok(ProcedureOutput::Transcript(text.to_string()))
            }
            Behaviour::FailCalibration => Err(CalibrationError::NoGridLines.into()),
            Behaviour::Panic => panic!("stub procedure blew up"),
        }
    }
}

fn measurers(
    width: &Arc<StubMeasurer>,
    height: &Arc<StubMeasurer>,
    depth: &Arc<StubMeasurer>,
) -> AxisMeasurers {
    AxisMeasurers {
        width: width.clone(),
        height: height.clone(),
        depth: depth.clone(),
    }
}

struct Inputs {
    _dir: tempfile::TempDir,
    bottom: PathBuf,
    side: PathBuf,
}

fn inputs() -> Inputs {
    let dir = tempfile::tempdir().unwrap();
    let bottom = dir.path().join("bottom.jpg");
    let side = dir.path().join("side.jpg");
    std::fs::write(&bottom, b"bottom").unwrap();
    std::fs::write(&side, b"side").unwrap();
    Inputs {
        _dir: dir,
        bottom,
        side,
    }
}

const WIDTH_OUT: &str = "Kalibrierung X-Richtung: 41.20 px/cm\n\n=== Objekt 1 ===\n\
                         Finale Unterseiten-Breite: 4.52 cm\n";
const HEIGHT_OUT: &str = "=== Objekt 1 ===\nFinale Höhe: 7.83 cm\n";
const DEPTH_OUT: &str = "Finale Tiefe: 2.31 cm\n";

#[test]
fn all_axes_give_volume_and_weight() {
    init_logging();
    let io = inputs();
    let width = StubMeasurer::new("width.py", Behaviour::Print(WIDTH_OUT));
    let height = StubMeasurer::new("height.py", Behaviour::Print(HEIGHT_OUT));
    let depth = StubMeasurer::new("side.py", Behaviour::Print(DEPTH_OUT));
    let orchestrator = MeasurementOrchestrator::new(measurers(&width, &height, &depth));

    let result = orchestrator.measure(&io.bottom, &io.side).unwrap();

    assert_relative_eq!(result.width_mm.unwrap(), 45.2, epsilon = 1e-9);
    assert_relative_eq!(result.height_mm.unwrap(), 78.3, epsilon = 1e-9);
    assert_relative_eq!(result.depth_mm.unwrap(), 23.1, epsilon = 1e-9);
    assert_relative_eq!(result.volume_mm3.unwrap(), 81754.596, max_relative = 1e-9);
    assert_relative_eq!(
        result.calculated_weight_kg.unwrap(),
        0.6417735786,
        max_relative = 1e-8
    );
    assert!(result.errors.is_empty());
    assert!(result.processing_successful);
    assert_eq!(result.status, AggregateStatus::Success);

    // Width and height see the bottom photo, depth the side photo.
    assert_eq!(width.seen.lock().unwrap()[0].0, io.bottom);
    assert_eq!(height.seen.lock().unwrap()[0].0, io.bottom);
    assert_eq!(depth.seen.lock().unwrap()[0].0, io.side);
}

#[test]
fn missing_depth_line_is_a_partial_result() {
    init_logging();
    let io = inputs();
    let width = StubMeasurer::new("width.py", Behaviour::Print(WIDTH_OUT));
    let height = StubMeasurer::new("height.py", Behaviour::Print("Finale HÃ¶he: 7.5 cm"));
    let depth = StubMeasurer::new(
        "side.py",
        Behaviour::Print("Kalibrierung X-Richtung: 40.00 px/cm\n"),
    );
    let orchestrator = MeasurementOrchestrator::new(measurers(&width, &height, &depth));

    let result = orchestrator.measure(&io.bottom, &io.side).unwrap();

    assert_relative_eq!(result.height_mm.unwrap(), 75.0, epsilon = 1e-9);
    assert!(result.width_mm.is_some());
    assert_eq!(result.depth_mm, None);
    assert_eq!(result.volume_mm3, None);
    assert_eq!(result.calculated_weight_kg, None);
    assert_eq!(
        result.errors,
        vec!["Failed to extract depth measurement from side.py output".to_string()]
    );
    assert!(!result.processing_successful);
    assert_eq!(result.status, AggregateStatus::PartialSuccess);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].axis, MeasurementKind::Depth);
    assert_eq!(result.failures[0].kind, FailureKind::Parse);
}

#[test]
fn procedure_errors_and_panics_stay_on_their_axis() {
    init_logging();
    let io = inputs();
    let width = StubMeasurer::new("width.py", Behaviour::FailCalibration);
    let height = StubMeasurer::new("height.py", Behaviour::Panic);
    let depth = StubMeasurer::new("side.py", Behaviour::Print(DEPTH_OUT));
    let orchestrator = MeasurementOrchestrator::new(measurers(&width, &height, &depth));

    let result = orchestrator.measure(&io.bottom, &io.side).unwrap();

    assert_eq!(result.width_mm, None);
    assert_eq!(result.height_mm, None);
    assert!(result.depth_mm.is_some());
    assert_eq!(result.status, AggregateStatus::PartialSuccess);
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors[0].starts_with("Width measurement failed:"));
    assert!(result.errors[0].contains("no grid lines found"));
    assert!(result.errors[1].starts_with("Height measurement failed:"));
    assert!(result.errors[1].contains("stub procedure blew up"));

    let kinds: Vec<_> = result.failures.iter().map(|f| (f.axis, f.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (MeasurementKind::Width, FailureKind::Calibration),
            (MeasurementKind::Height, FailureKind::Execution),
        ]
    );
}

#[test]
fn slow_axis_times_out_without_holding_the_others() {
    init_logging();
    let io = inputs();
    let width = StubMeasurer::new("width.py", Behaviour::Print(WIDTH_OUT));
    let height = StubMeasurer::new(
        "height.py",
        Behaviour::Sleep(Duration::from_secs(3), HEIGHT_OUT),
    );
    let depth = StubMeasurer::new("side.py", Behaviour::Print(DEPTH_OUT));
    let orchestrator = MeasurementOrchestrator::new(measurers(&width, &height, &depth))
        .with_timeout(Duration::from_millis(200));

    let started = Instant::now();
    let result = orchestrator.measure(&io.bottom, &io.side).unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));

    assert!(result.width_mm.is_some());
    assert_eq!(result.height_mm, None);
    assert!(result.depth_mm.is_some());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Height measurement failed:"));
    assert!(result.errors[0].contains("timed out"));
    assert_eq!(result.failures[0].kind, FailureKind::Execution);
}

#[test]
fn all_axes_failing_is_a_failure_not_an_error() {
    init_logging();
    let io = inputs();
    let width = StubMeasurer::new("width.py", Behaviour::Print(""));
    let height = StubMeasurer::new("height.py", Behaviour::Print(""));
    let depth = StubMeasurer::new("side.py", Behaviour::FailCalibration);
    let orchestrator = MeasurementOrchestrator::new(measurers(&width, &height, &depth));

    let result = orchestrator.measure(&io.bottom, &io.side).unwrap();
    assert_eq!(result.status, AggregateStatus::Failure);
    assert_eq!(result.errors.len(), 3);
    assert!(!result.processing_successful);
}

#[test]
fn missing_image_aborts_before_any_procedure_runs() {
    init_logging();
    let io = inputs();
    let width = StubMeasurer::new("width.py", Behaviour::Print(WIDTH_OUT));
    let height = StubMeasurer::new("height.py", Behaviour::Print(HEIGHT_OUT));
    let depth = StubMeasurer::new("side.py", Behaviour::Print(DEPTH_OUT));
    let orchestrator = MeasurementOrchestrator::new(measurers(&width, &height, &depth));

    let missing = io.bottom.with_file_name("nope.jpg");
    let err = orchestrator.measure(&io.bottom, &missing).unwrap_err();
    match err {
        MeasureError::MissingInput { path } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(total_calls(&[&width, &height, &depth]), 0);
}

fn total_calls(stubs: &[&Arc<StubMeasurer>]) -> usize {
    stubs.iter().map(|s| s.calls.load(Ordering::SeqCst)).sum()
}

#[test]
fn captured_bytes_are_staged_and_cleaned_up() {
    init_logging();
    let width = StubMeasurer::new("width.py", Behaviour::Print(WIDTH_OUT));
    let height = StubMeasurer::new("height.py", Behaviour::Print(HEIGHT_OUT));
    let depth = StubMeasurer::new("side.py", Behaviour::Print(DEPTH_OUT));
    let orchestrator = MeasurementOrchestrator::new(measurers(&width, &height, &depth));

    let front = [0xFF, 0xD8, 1, 2, 0xFF, 0xD9, 0, 0];
    let side = [0xFF, 0xD8, 3, 0xFF, 0xD9];
    let result = measure_captured(&orchestrator, &front, &side).unwrap();
    assert_eq!(result.status, AggregateStatus::Success);

    let (front_path, existed) = width.seen.lock().unwrap()[0].clone();
    assert!(existed, "staged file must exist while measuring");
    assert!(!front_path.exists(), "staged file must be removed afterwards");
    let (side_path, _) = depth.seen.lock().unwrap()[0].clone();
    assert_ne!(front_path, side_path);
    assert!(!side_path.exists());
}

#[test]
fn timed_out_worker_keeps_staged_capture_alive() {
    init_logging();
    let width = StubMeasurer::new("width.py", Behaviour::Print(WIDTH_OUT));
    let height = StubMeasurer::new(
        "height.py",
        Behaviour::Sleep(Duration::from_millis(800), HEIGHT_OUT),
    );
    let depth = StubMeasurer::new("side.py", Behaviour::Print(DEPTH_OUT));
    let orchestrator = MeasurementOrchestrator::new(measurers(&width, &height, &depth))
        .with_timeout(Duration::from_millis(100));

    let jpeg = [0xFF, 0xD8, 0xFF, 0xD9];
    let result = measure_captured(&orchestrator, &jpeg, &jpeg).unwrap();
    assert_eq!(result.height_mm, None);
    assert!(result.width_mm.is_some());

    let (front_path, _) = width.seen.lock().unwrap()[0].clone();
    let (side_path, _) = depth.seen.lock().unwrap()[0].clone();
    assert!(front_path.exists(), "slow height worker still reads the front capture");
    assert!(side_path.exists());

    let deadline = Instant::now() + Duration::from_secs(5);
    while (front_path.exists() || side_path.exists()) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert!(!front_path.exists(), "capture must be removed once the worker is done");
    assert!(!side_path.exists());
    let (height_path, existed) = height.seen.lock().unwrap()[0].clone();
    assert_eq!(height_path, front_path);
    assert!(existed);
}

#[cfg(unix)]
#[test]
fn external_scripts_are_parsed_from_stdout() {
    use grid_gauge::procedure::ScriptMeasurer;

    init_logging();
    let io = inputs();
    let script = |line: &str| -> Arc<dyn Measurer> {
        Arc::new(ScriptMeasurer::new(
            "sh",
            vec!["-c".into(), format!("echo '{line}'"), "procedure".into()],
        ))
    };
    let orchestrator = MeasurementOrchestrator::new(AxisMeasurers {
        width: script("Finale Unterseiten-Breite: 4.8 cm"),
        height: script("Finale Höhe: 5.0 cm"),
        depth: script("Finale Tiefe: 2.0 cm"),
    });

    let result = orchestrator.measure(&io.bottom, &io.side).unwrap();
    assert_eq!(result.status, AggregateStatus::Success);
    assert_relative_eq!(result.volume_mm3.unwrap(), 48.0 * 50.0 * 20.0, epsilon = 1e-6);
}
