use crate::matcher::{MatchCriteria, OverlapResult};
use crate::search::TimeWindow;
use crate::search_area::GeoPoint;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Serde adapter storing a `TimeDelta` as fractional minutes.
pub mod minutes {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(delta: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(delta.num_milliseconds() as f64 / 60_000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let minutes = f64::deserialize(deserializer)?;
        Ok(TimeDelta::milliseconds((minutes * 60_000.0).round() as i64))
    }
}

/// Everything a run produced, in a form that can be saved as JSON.
#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct OverlapReport {
    pub location: GeoPoint,
    pub window: TimeWindow,
    pub criteria: MatchCriteria,
    pub matches: Vec<OverlapResult>,
}

impl OverlapReport {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let report: Self = serde_json::from_str(&content)?;
        Ok(report)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Prints the human readable summary to stdout.
    pub fn print(&self) {
        println!(
            "\nFound {} overlapping acquisitions between {} and {}",
            self.matches.len(),
            self.window.start.format("%d-%b-%Y"),
            self.window.end.format("%d-%b-%Y")
        );
        println!("Location: {}", self.location);
        println!(
            "Max time difference: {} mins | Min overlap: {}% | Max cloud cover: {}%",
            self.criteria.max_time_delta.num_minutes(),
            self.criteria.min_overlap_percent,
            self.criteria.max_cloud_cover
        );

        for (idx, overlap) in self.matches.iter().enumerate() {
            println!("\nOverlap {}:", idx + 1);
            println!("{overlap}");
        }
    }
}

impl fmt::Display for OverlapResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let delta_minutes = self.time_delta.num_milliseconds() as f64 / 60_000.0;
        writeln!(
            f,
            "  Sentinel-1: {} ({})",
            self.first_timestamp.format("%Y-%m-%d %H:%M UTC"),
            self.first_id
        )?;
        writeln!(
            f,
            "  Sentinel-2: {} ({})",
            self.second_timestamp.format("%Y-%m-%d %H:%M UTC"),
            self.second_id
        )?;
        writeln!(f, "  Δ Time: {:.1} minutes", delta_minutes)?;
        writeln!(f, "  Overlap Percentage: {}%", self.overlap_percent)?;
        write!(f, "  Cloud Cover: {}%", self.cloud_cover)
    }
}
