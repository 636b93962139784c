mod common;

use common::synthetic_image::{
    bottom_view, clipped_sheet, init_logging, keystoned_sheet, save_png, PITCH, TABLE,
};
use grid_gauge::calibrate::GridCalibrator;
use grid_gauge::diagnostics::Warning;
use grid_gauge::error::{CalibrationError, MeasureError};
use image::{Rgb, RgbImage};
use nalgebra::Matrix3;
use std::path::Path;

#[test]
fn top_down_sheet_calibrates_to_grid_pitch() {
    init_logging();
    let frame = GridCalibrator::default()
        .calibrate_image(bottom_view())
        .expect("calibration");

    let pitch = PITCH as f64;
    assert!(
        (frame.px_per_cm_x - pitch).abs() <= 1.5,
        "px/cm x = {:.2}",
        frame.px_per_cm_x
    );
    assert!(
        (frame.px_per_cm_y - pitch).abs() <= 1.5,
        "px/cm y = {:.2}",
        frame.px_per_cm_y
    );
    assert!((0.9..=1.1).contains(&frame.grid_ratio()));
    assert!(frame.boundary.is_some(), "paper outline should be found");
    assert!(!frame
        .warnings
        .contains(|w| matches!(w, Warning::GridDistorted { .. } | Warning::NoGridBoundary { .. })));

    // Rectified view is the 560 px sheet, give or take the edge pixels.
    assert!((frame.rectified.width() as i32 - 560).abs() <= 4);
    assert!((frame.rectified.height() as i32 - 560).abs() <= 4);
    assert!(frame.xs.len() >= 10 && frame.ys.len() >= 10);
}

#[test]
fn keystoned_sheet_is_rectified_before_scaling() {
    init_logging();
    let frame = GridCalibrator::default()
        .calibrate_image(keystoned_sheet())
        .expect("calibration");

    assert!(frame.boundary.is_some());
    assert!(
        (0.9..=1.1).contains(&frame.grid_ratio()),
        "ratio {:.3}",
        frame.grid_ratio()
    );
    // The paper spans roughly 500 px of the frame for 14 cm.
    assert!(
        (30.0..=42.0).contains(&frame.px_per_cm),
        "px/cm {:.2}",
        frame.px_per_cm
    );
}

#[test]
fn non_quadrilateral_sheet_keeps_source_geometry() {
    init_logging();
    let frame = GridCalibrator::default()
        .calibrate_image(clipped_sheet())
        .expect("calibration");

    assert!(frame.boundary.is_none());
    assert_eq!(frame.homography, Matrix3::identity());
    assert_eq!(frame.rectified.dimensions(), (640, 640));
    assert!(frame
        .warnings
        .contains(|w| matches!(w, Warning::NoGridBoundary { vertices } if *vertices != 4)));

    let pitch = PITCH as f64;
    assert!((frame.px_per_cm_x - pitch).abs() <= 1.5, "px/cm x = {:.2}", frame.px_per_cm_x);
    assert!((frame.px_per_cm_y - pitch).abs() <= 1.5, "px/cm y = {:.2}", frame.px_per_cm_y);
}

#[test]
fn blank_table_has_no_grid_lines() {
    init_logging();
    let blank = RgbImage::from_pixel(320, 240, Rgb([TABLE; 3]));
    let err = GridCalibrator::default().calibrate_image(blank).unwrap_err();
    assert!(matches!(
        err,
        MeasureError::Calibration(CalibrationError::NoGridLines)
    ));
}

#[test]
fn calibrate_path_loads_png_and_reports_missing_files() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = save_png(dir.path(), "bottom.png", &bottom_view());
    let frame = GridCalibrator::default().calibrate_path(&path).unwrap();
    let summary = frame.summary();
    assert_eq!(summary.source_size, [640, 640]);

    let err = GridCalibrator::default()
        .calibrate_path(Path::new("/definitely/not/here.jpg"))
        .unwrap_err();
    assert!(matches!(err, MeasureError::MissingInput { .. }));
}
