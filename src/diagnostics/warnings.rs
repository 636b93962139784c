use serde::Serialize;
use std::fmt;

/// Non-fatal conditions raised while measuring.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Warning {
    /// Largest contour did not simplify to four corners; the source image is
    /// used unrectified.
    NoGridBoundary { vertices: usize },
    /// Rectified grid aspect outside [0.8, 1.2].
    SkewedGrid { aspect: f64 },
    /// Four-point solve was singular; identity used instead.
    DegenerateHomography,
    /// px/cm X/Y ratio outside [0.9, 1.1].
    GridDistorted { ratio: f64 },
    /// Estimated reference size outside the plausible range.
    ImplausibleObjectSize { estimated_cm: f64, fallback_cm: f64 },
    /// Refinement ROI had no pixels; box extent used.
    EmptyRoi,
    /// Refinement found no boundary points; box extent used.
    NoBoundaryPoints,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoGridBoundary { vertices } => write!(
                f,
                "no 4-corner grid boundary found ({vertices} vertices), using source image"
            ),
            Self::SkewedGrid { aspect } => {
                write!(f, "unusual rectified aspect ratio {aspect:.2}, check homography")
            }
            Self::DegenerateHomography => f.write_str("degenerate homography, using identity"),
            Self::GridDistorted { ratio } => {
                write!(f, "grid may be distorted, X/Y ratio {ratio:.2}")
            }
            Self::ImplausibleObjectSize {
                estimated_cm,
                fallback_cm,
            } => write!(
                f,
                "implausible object size ({estimated_cm:.2} cm), using {fallback_cm:.1} cm"
            ),
            Self::EmptyRoi => f.write_str("empty refinement ROI, using box extent"),
            Self::NoBoundaryPoints => f.write_str("no boundary contours found, using box extent"),
        }
    }
}

/// Collects warnings and mirrors each one to the `log` facade.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct WarningLog {
    entries: Vec<Warning>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `warning`, logging it under `target` (e.g. "GridCalibrator").
    pub fn raise(&mut self, target: &str, warning: Warning) {
        log::warn!("{target}: {warning}");
        self.entries.push(warning);
    }

    pub fn extend(&mut self, other: WarningLog) {
        self.entries.extend(other.entries);
    }

    pub fn contains(&self, pred: impl Fn(&Warning) -> bool) -> bool {
        self.entries.iter().any(pred)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_keeps_entries_inspectable() {
        let mut log = WarningLog::new();
        log.raise("test", Warning::GridDistorted { ratio: 1.25 });
        log.raise("test", Warning::EmptyRoi);
        assert_eq!(log.len(), 2);
        assert!(log.contains(|w| matches!(w, Warning::GridDistorted { .. })));
        assert!(!log.contains(|w| matches!(w, Warning::SkewedGrid { .. })));
        assert!(Warning::GridDistorted { ratio: 1.25 }
            .to_string()
            .contains("1.25"));
    }
}
