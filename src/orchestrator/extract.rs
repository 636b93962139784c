//! Result extraction from legacy procedure transcripts.
//!
//! Patterns are tried in order and the first one whose number parses wins. Matching
//! is case-insensitive and tolerates `Höhe`, `Hohe` and the mojibake `HÃ¶he`
//! produced by mis-decoded UTF-8.
use crate::types::MeasurementKind;
use regex::Regex;
use std::sync::OnceLock;

const WIDTH_PATTERNS: &[&str] = &[
    r"Finale Unterseiten-Breite:\s*(?P<v>[0-9.]+)",
    r"Finale Breite unten:\s*(?P<v>[0-9.]+)",
    r"Breite:\s*(?P<v>[0-9.]+)\s*cm",
];

const HEIGHT_PATTERNS: &[&str] = &[
    r"Finale H(?:ö|o|Ã¶)he:\s*(?P<v>[0-9.]+)",
    r"H(?:ö|o|Ã¶)he:\s*(?P<v>[0-9.]+)\s*cm",
];

const DEPTH_PATTERNS: &[&str] = &[
    r"Finale Tiefe:\s*(?P<v>[0-9.]+)",
    r"Tiefe:\s*(?P<v>[0-9.]+)\s*cm",
    r"Depth:\s*(?P<v>[0-9.]+)",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(&format!("(?im){p}")).ok())
        .collect()
}

fn patterns(kind: MeasurementKind) -> &'static [Regex] {
    static WIDTH: OnceLock<Vec<Regex>> = OnceLock::new();
    static HEIGHT: OnceLock<Vec<Regex>> = OnceLock::new();
    static DEPTH: OnceLock<Vec<Regex>> = OnceLock::new();
    match kind {
        MeasurementKind::Width => WIDTH.get_or_init(|| compile(WIDTH_PATTERNS)),
        MeasurementKind::Height => HEIGHT.get_or_init(|| compile(HEIGHT_PATTERNS)),
        MeasurementKind::Depth => DEPTH.get_or_init(|| compile(DEPTH_PATTERNS)),
    }
}

/// First value in cm reported for `kind`, if any pattern matches.
pub fn extract_value(kind: MeasurementKind, text: &str) -> Option<f64> {
    patterns(kind).iter().find_map(|re| {
        let caps = re.captures(text)?;
        caps.name("v")?.as_str().parse().ok()
    })
}
