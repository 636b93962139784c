use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Timing entry describing a single stage of a measurement procedure.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

/// Aggregated timing trace for one procedure run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.stages.push(StageTiming::new(label, elapsed_ms));
    }

    pub fn stage_ms(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.elapsed_ms)
    }
}

/// Records consecutive stage durations into a [`TimingBreakdown`].
pub struct StageTimer {
    started: Instant,
    lap: Instant,
    breakdown: TimingBreakdown,
}

impl StageTimer {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            lap: now,
            breakdown: TimingBreakdown::default(),
        }
    }

    /// Close the current stage under `label` and start the next one.
    pub fn lap(&mut self, label: &str) {
        let now = Instant::now();
        let ms = now.duration_since(self.lap).as_secs_f64() * 1000.0;
        self.breakdown.push(label, ms);
        self.lap = now;
    }

    pub fn finish(mut self) -> TimingBreakdown {
        self.breakdown.total_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        self.breakdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_records_stages_in_order() {
        let mut timer = StageTimer::start();
        timer.lap("calibrate");
        timer.lap("detect");
        let t = timer.finish();
        let labels: Vec<_> = t.stages.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["calibrate", "detect"]);
        assert!(t.total_ms >= t.stages.iter().map(|s| s.elapsed_ms).sum::<f64>() - 1e-9);
        assert!(t.stage_ms("detect").is_some());
        assert!(t.stage_ms("refine").is_none());
    }
}
