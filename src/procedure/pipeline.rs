//! In-process axis procedure: calibrate → detect → refine → correct.
use super::report::{ObjectReport, ProcedureReport};
use super::{Measurer, ProcedureOutput};
use crate::calibrate::GridCalibrator;
use crate::correction::{CorrectionEngine, GridLines};
use crate::detector::{detect_objects, ObjectDetector};
use crate::diagnostics::StageTimer;
use crate::error::MeasureResult;
use crate::image::io::{save_rgb, write_json_file};
use crate::refine::EdgeRefiner;
use crate::types::MeasurementKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct MeasurementProcedure {
    pub kind: MeasurementKind,
    pub calibrator: GridCalibrator,
    pub detector: Arc<dyn ObjectDetector>,
    pub confidence: f32,
    pub refiner: EdgeRefiner,
    pub engine: CorrectionEngine,
    /// Rectified frame, per-object overlays and the report land here.
    pub debug_dir: Option<PathBuf>,
    name: String,
}

impl MeasurementProcedure {
    pub fn new(
        kind: MeasurementKind,
        calibrator: GridCalibrator,
        detector: Arc<dyn ObjectDetector>,
        refiner: EdgeRefiner,
        engine: CorrectionEngine,
    ) -> Self {
        Self {
            kind,
            calibrator,
            detector,
            confidence: kind.default_confidence(),
            refiner,
            engine,
            debug_dir: None,
            name: format!("{} procedure", kind.to_string().to_lowercase()),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    pub fn run(&self, image: &Path) -> MeasureResult<ProcedureReport> {
        let frame = self.calibrator.calibrate_path(image)?;
        let mut timer = StageTimer::start();
        let mut warnings = frame.warnings.clone();

        let objects = detect_objects(self.detector.as_ref(), &frame.rectified, self.confidence)?;
        timer.lap("detect");
        log::debug!(
            "MeasurementProcedure::run {} objects in {}",
            objects.len(),
            image.display()
        );

        let grid = GridLines::from(&frame);
        let debug = self.debug_dir.is_some();
        let axis = self.kind.refine_axis();
        let mut reports = Vec::with_capacity(objects.len());
        let mut overlays = Vec::new();
        for object in objects {
            let edge = self
                .refiner
                .refine(&frame.rectified, &object.bbox, axis, frame.px_per_cm, debug);
            warnings.extend(edge.warnings);
            let measurement = self.engine.measure(
                self.kind,
                &object,
                edge.raw_px,
                edge.box_fallback,
                &grid,
                &mut warnings,
            );
            if let Some(overlay) = edge.overlay {
                overlays.push(overlay);
            }
            reports.push(ObjectReport {
                object,
                endpoints: edge.endpoints,
                measurement,
            });
        }
        timer.lap("measure");

        let mut timing = frame.timing.clone();
        let tail = timer.finish();
        timing.total_ms += tail.total_ms;
        timing.stages.extend(tail.stages);

        let report = ProcedureReport {
            kind: self.kind,
            image: image.to_path_buf(),
            calibration: frame.summary(),
            objects: reports,
            warnings,
            timing,
        };

        if let Some(dir) = &self.debug_dir {
            let prefix = self.kind.to_string().to_lowercase();
            save_rgb(&frame.rectified, &dir.join(format!("{prefix}_rectified.png")))?;
            for (i, overlay) in overlays.iter().enumerate() {
                save_rgb(overlay, &dir.join(format!("{prefix}_object_{}_edges.png", i + 1)))?;
            }
            write_json_file(&dir.join(format!("{prefix}_report.json")), &report)?;
        }
        if let Some(v) = report.final_cm() {
            log::info!("{}: {} = {v:.1} cm", self.name, self.kind.label());
        }
        Ok(report)
    }
}

impl Measurer for MeasurementProcedure {
    fn name(&self) -> &str {
        &self.name
    }

    fn measure(&self, image: &Path) -> MeasureResult<ProcedureOutput> {
        self.run(image).map(|r| ProcedureOutput::Report(Box::new(r)))
    }
}
