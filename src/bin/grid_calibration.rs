use grid_gauge::calibrate::{CalibrationFrame, GridCalibrator};
use grid_gauge::config::grid_calibration;
use grid_gauge::error::{MeasureError, MeasureResult};
use grid_gauge::image::io::{save_rgb, write_json_file};
use std::env;
use std::path::{Path, PathBuf};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> MeasureResult<()> {
    let mut args = env::args();
    let program = args
        .next()
        .unwrap_or_else(|| "grid_calibration".to_string());
    let config_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| MeasureError::config(format!("Usage: {program} <config.json>")))?;
    let config = grid_calibration::load_config(&config_path)?;

    let calibrator = GridCalibrator::new(config.calibration.clone());
    let frame = calibrator.calibrate_path(&config.input_path)?;
    print_text_summary(&frame);

    let summary = frame.summary();
    if let Some(path) = &config.output.json_out {
        write_json_file(path, &summary)?;
        println!("\nJSON report written to {}", path.display());
    } else {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| MeasureError::config(format!("Failed to serialize JSON: {e}")))?;
        println!("\nJSON report:\n{json}");
    }

    if let Some(dir) = &config.output.debug_dir {
        save_debug_artifacts(dir, &frame)?;
        println!("Debug artifacts written to {}", dir.display());
    }
    Ok(())
}

fn print_text_summary(frame: &CalibrationFrame) {
    println!("Calibration summary");
    println!("  px_per_cm_x: {:.2}", frame.px_per_cm_x);
    println!("  px_per_cm_y: {:.2}", frame.px_per_cm_y);
    println!("  px_per_cm:   {:.2}", frame.px_per_cm);
    println!("  grid ratio:  {:.3}", frame.grid_ratio());
    println!(
        "  rectified:   {}x{} ({} x-lines, {} y-lines)",
        frame.rectified.width(),
        frame.rectified.height(),
        frame.xs.len(),
        frame.ys.len()
    );
    let h = &frame.homography;
    println!(
        "  homography:\n    [{:.4} {:.4} {:.4}]\n    [{:.4} {:.4} {:.4}]\n    [{:.4} {:.4} {:.4}]",
        h[(0, 0)],
        h[(0, 1)],
        h[(0, 2)],
        h[(1, 0)],
        h[(1, 1)],
        h[(1, 2)],
        h[(2, 0)],
        h[(2, 1)],
        h[(2, 2)]
    );
    for w in frame.warnings.iter() {
        println!("  warning: {w}");
    }
}

fn save_debug_artifacts(dir: &Path, frame: &CalibrationFrame) -> MeasureResult<()> {
    save_rgb(&frame.rectified, &dir.join("rectified.png"))?;
    let mut lines = frame.rectified.clone();
    let (w, h) = (lines.width(), lines.height());
    let red = image::Rgb([255, 0, 0]);
    for &x in &frame.xs {
        if (0..w as i32).contains(&x) {
            for y in 0..h {
                lines.put_pixel(x as u32, y, red);
            }
        }
    }
    for &y in &frame.ys {
        if (0..h as i32).contains(&y) {
            for x in 0..w {
                lines.put_pixel(x, y as u32, red);
            }
        }
    }
    save_rgb(&lines, &dir.join("grid_lines.png"))?;
    Ok(())
}
