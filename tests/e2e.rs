mod common;

use common::synthetic_image::{bottom_view, init_logging, save_png, side_view};
use grid_gauge::calibrate::GridCalibrator;
use grid_gauge::correction::{CorrectionEngine, CorrectionProfile};
use grid_gauge::detector::SilhouetteDetector;
use grid_gauge::orchestrator::{extract_value, AggregateStatus, MeasurementOrchestrator};
use grid_gauge::procedure::{MeasurementProcedure, ProcedureSet};
use grid_gauge::refine::{EdgeRefiner, RefineOptions};
use grid_gauge::types::{MeasurementKind, RefineAxis};
use std::sync::Arc;

fn in_range(label: &str, v: Option<f64>, lo: f64, hi: f64) -> f64 {
    let v = v.unwrap_or_else(|| panic!("{label} missing"));
    assert!((lo..=hi).contains(&v), "{label} = {v:.1} mm, expected {lo}..={hi}");
    v
}

#[test]
fn synthetic_piece_is_measured_end_to_end() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let bottom = save_png(dir.path(), "bottom.png", &bottom_view());
    let side = save_png(dir.path(), "side.png", &side_view());

    let orchestrator = MeasurementOrchestrator::new(ProcedureSet::default().into_measurers().unwrap());
    let result = orchestrator.measure(&bottom, &side).expect("measurement");

    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert_eq!(result.status, AggregateStatus::Success);
    // 5 × 5 cm footprint, 3 cm wide in the side view.
    let w = in_range("width", result.width_mm, 45.0, 55.0);
    let h = in_range("height", result.height_mm, 45.0, 55.0);
    let d = in_range("depth", result.depth_mm, 25.0, 35.0);
    let volume = result.volume_mm3.unwrap();
    assert!((volume - w * h * d).abs() < 1e-6);
    assert!(result.calculated_weight_kg.unwrap() > 0.0);
}

#[test]
fn width_procedure_writes_report_and_debug_artifacts() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let bottom = save_png(dir.path(), "bottom.png", &bottom_view());
    let debug_dir = dir.path().join("debug");

    let procedure = MeasurementProcedure::new(
        MeasurementKind::Width,
        GridCalibrator::default(),
        Arc::new(SilhouetteDetector::default()),
        EdgeRefiner::new(RefineOptions::for_axis(RefineAxis::BottomEdge)),
        CorrectionEngine::new(CorrectionProfile::width()),
    )
    .with_debug_dir(&debug_dir);
    let report = procedure.run(&bottom).expect("width procedure");

    assert_eq!(report.objects.len(), 1);
    let primary = report.primary().unwrap();
    assert!(!primary.measurement.box_fallback);
    assert!(primary.endpoints.is_some());
    assert!((primary.measurement.raw_px - 200.0).abs() <= 8.0);

    let transcript = report.transcript();
    assert!(transcript.contains("Kalibrierung X-Richtung:"));
    assert!(transcript.contains("=== Objekt 1 ==="));
    assert!(transcript.contains("Finale Unterseiten-Breite:"));
    assert_eq!(
        extract_value(MeasurementKind::Width, &transcript),
        report.final_cm()
    );

    for name in ["width_rectified.png", "width_object_1_edges.png", "width_report.json"] {
        assert!(debug_dir.join(name).is_file(), "{name} not written");
    }
}

#[test]
fn precomputed_boxes_drive_the_height_procedure() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let bottom = save_png(dir.path(), "bottom.png", &bottom_view());
    let side = save_png(dir.path(), "side.png", &side_view());

    // Rectified frame starts at the paper edge, about 40 px into the photo.
    let boxes = dir.path().join("boxes.json");
    std::fs::write(
        &boxes,
        r#"[{"x1": 117, "y1": 157, "x2": 325, "y2": 365, "confidence": 0.9},
            {"x1": 0, "y1": 0, "x2": 20, "y2": 20, "confidence": 0.05}]"#,
    )
    .unwrap();
    let config = format!(
        r#"{{ "height": {{ "detector": {{ "type": "precomputed", "path": {:?} }} }} }}"#,
        boxes.display().to_string()
    );
    let set: ProcedureSet = serde_json::from_str(&config).unwrap();

    let result = MeasurementOrchestrator::new(set.into_measurers().unwrap())
        .measure(&bottom, &side)
        .unwrap();
    assert_eq!(result.status, AggregateStatus::Success, "{:?}", result.errors);
    in_range("height", result.height_mm, 45.0, 55.0);
}
