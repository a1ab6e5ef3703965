use crate::catalog::{Collection, OrbitDirection};
use crate::config::CatalogConfig;
use crate::error::InputError;
use crate::matcher::MatchCriteria;
use crate::search::{OverlapRequest, TimeWindow};
use crate::search_area::GeoPoint;
use anyhow::Result;
use chrono::{NaiveDate, TimeDelta};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    about = "Find Sentinel-1 / Sentinel-2 acquisition overlaps",
    allow_negative_numbers = true
)]
pub struct Cli {
    /// Latitude (decimal degrees)
    pub latitude: f64,
    /// Longitude (decimal degrees)
    pub longitude: f64,
    /// Start date (dd:mm:yy)
    #[arg(value_parser = parse_date)]
    pub start_date: NaiveDate,
    /// End date (dd:mm:yy)
    #[arg(value_parser = parse_date)]
    pub end_date: NaiveDate,
    /// Max time difference in minutes
    #[arg(long, default_value_t = 180)]
    pub max_diff: i64,
    /// Search buffer in degrees (0.5° ≈ 55km)
    #[arg(long, default_value_t = 0.5)]
    pub buffer: f64,
    /// Minimum spatial overlap percentage
    #[arg(long, default_value_t = 1.0)]
    pub min_overlap: f64,
    /// Sentinel-2 scenes at or above this cloud cover percentage are ignored
    #[arg(long, default_value_t = 80.0)]
    pub max_cloud_cover: f64,
    /// Only consider Sentinel-1 passes in this orbit direction
    #[arg(long, value_enum)]
    pub orbit: Option<OrbitDirection>,
    #[arg(long, value_enum, default_value_t = Sentinel2Level::L2a)]
    pub s2_level: Sentinel2Level,
    /// Catalog configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, env = "SH_CLIENT_ID")]
    pub client_id: Option<String>,
    #[arg(long, env = "SH_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,
    /// Also write the matches as JSON to this path
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sentinel2Level {
    L2a,
    L1c,
}

pub fn parse_date(value: &str) -> Result<NaiveDate, InputError> {
    NaiveDate::parse_from_str(value, "%d:%m:%y").map_err(|_| InputError::Date(value.to_string()))
}

impl Cli {
    /// Validates the arguments into a search request.
    pub fn request(&self) -> Result<OverlapRequest, InputError> {
        let max_time_delta = TimeDelta::try_minutes(self.max_diff)
            .filter(|delta| *delta >= TimeDelta::zero())
            .ok_or(InputError::MaxTimeDelta(self.max_diff))?;
        if !self.buffer.is_finite() || self.buffer <= 0.0 {
            return Err(InputError::Buffer(self.buffer));
        }
        let second = match self.s2_level {
            Sentinel2Level::L2a => Collection::Sentinel2L2a,
            Sentinel2Level::L1c => Collection::Sentinel2L1c,
        };

        Ok(OverlapRequest {
            location: GeoPoint::new(self.longitude, self.latitude)?,
            buffer_degrees: self.buffer,
            window: TimeWindow::from_dates(self.start_date, self.end_date)?,
            first: Collection::Sentinel1Iw { orbit: self.orbit },
            second,
            criteria: MatchCriteria {
                max_time_delta,
                min_overlap_percent: self.min_overlap,
                max_cloud_cover: self.max_cloud_cover,
            },
        })
    }

    pub fn catalog_config(&self) -> Result<CatalogConfig> {
        let config = match &self.config {
            Some(path) => CatalogConfig::read(path)?,
            None => CatalogConfig::default(),
        };
        Ok(config.with_credentials(self.client_id.clone(), self.client_secret.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["sentinel-overlap"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("04:05:24"), Ok(NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()));
        assert_eq!(parse_date("2024-05-04"), Err(InputError::Date("2024-05-04".to_string())));
        assert!(parse_date("31:02:24").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["60.72", "-135.06", "01:05:24", "10:05:24"]);
        let request = cli.request().unwrap();
        assert_eq!(request.location, GeoPoint { lon: -135.06, lat: 60.72 });
        assert_eq!(request.buffer_degrees, 0.5);
        assert_eq!(request.criteria, MatchCriteria::default());
        assert_eq!(request.first, Collection::Sentinel1Iw { orbit: None });
        assert_eq!(request.second, Collection::Sentinel2L2a);
    }

    #[test]
    fn test_options() {
        let cli = parse(&[
            "-33.9",
            "18.4",
            "01:01:24",
            "15:01:24",
            "--max-diff",
            "60",
            "--min-overlap",
            "25",
            "--max-cloud-cover",
            "30",
            "--orbit",
            "descending",
            "--s2-level",
            "l1c",
        ]);
        let request = cli.request().unwrap();
        assert_eq!(request.criteria.max_time_delta, TimeDelta::minutes(60));
        assert_eq!(request.criteria.min_overlap_percent, 25.0);
        assert_eq!(request.criteria.max_cloud_cover, 30.0);
        assert_eq!(
            request.first,
            Collection::Sentinel1Iw {
                orbit: Some(OrbitDirection::Descending)
            }
        );
        assert_eq!(request.second, Collection::Sentinel2L1c);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let cli = parse(&["95.0", "10.0", "01:05:24", "10:05:24"]);
        assert_eq!(cli.request().unwrap_err(), InputError::Latitude(95.0));

        let cli = parse(&["45.0", "10.0", "10:05:24", "01:05:24"]);
        assert!(matches!(cli.request(), Err(InputError::DateOrder { .. })));

        let cli = parse(&["45.0", "10.0", "01:05:24", "10:05:24", "--buffer", "0"]);
        assert_eq!(cli.request().unwrap_err(), InputError::Buffer(0.0));

        let cli = parse(&["45.0", "10.0", "01:05:24", "10:05:24", "--max-diff", "-5"]);
        assert_eq!(cli.request().unwrap_err(), InputError::MaxTimeDelta(-5));

        let argv = ["sentinel-overlap", "45.0", "10.0", "2024-05-01", "10:05:24"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
