use grid_gauge::config::measure_piece;
use grid_gauge::error::{MeasureError, MeasureResult};
use grid_gauge::image::io::write_json_file;
use grid_gauge::orchestrator::MeasurementResult;
use std::env;
use std::path::PathBuf;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn usage(program: &str) -> String {
    format!("Usage: {program} <config.json>")
}

fn run() -> MeasureResult<()> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "measure_piece".to_string());
    let Some(config_path) = args.next().map(PathBuf::from) else {
        return Err(MeasureError::config(usage(&program)));
    };
    let config = measure_piece::load_config(&config_path)?;

    let orchestrator = config.orchestrator()?;
    let result = orchestrator.measure(&config.bottom_image, &config.side_image)?;
    print_text_summary(&result);

    match &config.output.json_out {
        Some(path) => {
            write_json_file(path, &result)?;
            println!("\nJSON result written to {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| MeasureError::config(format!("Failed to serialize JSON: {e}")))?;
            println!("\n{json}");
        }
    }
    if let Some(dir) = &config.output.debug_dir {
        println!("Debug artifacts written to {}", dir.display());
    }
    Ok(())
}

fn print_text_summary(result: &MeasurementResult) {
    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}"));
    println!("Measurement summary");
    println!("  width_mm:  {}", fmt(result.width_mm));
    println!("  height_mm: {}", fmt(result.height_mm));
    println!("  depth_mm:  {}", fmt(result.depth_mm));
    if let (Some(volume), Some(weight)) = (result.volume_mm3, result.calculated_weight_kg) {
        println!("  volume_mm3: {volume:.1}");
        println!("  weight_kg:  {weight:.4}");
    }
    println!("  status: {:?}", result.status);
    for err in &result.errors {
        println!("  error: {err}");
    }
}
