use crate::acquisition::Acquisition;
use crate::search::TimeWindow;
use anyhow::Result;
use clap::ValueEnum;
use geo::Polygon;

pub mod sentinel_hub;
pub use sentinel_hub::SentinelHub;

/// Source of acquisition records.
///
/// Implementations own retries and authentication; callers only see the
/// final list of records or the error that ended the search.
pub trait Catalog {
    async fn search(
        &self,
        collection: &Collection,
        region: &Polygon<f64>,
        window: &TimeWindow,
    ) -> Result<Vec<Acquisition>>;
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrbitDirection {
    Ascending,
    Descending,
}

impl OrbitDirection {
    fn key(&self) -> &str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collection {
    /// Sentinel-1 GRD in Interferometric Wide swath mode.
    Sentinel1Iw { orbit: Option<OrbitDirection> },
    Sentinel2L2a,
    Sentinel2L1c,
}

impl Collection {
    pub fn key(&self) -> &str {
        match self {
            Self::Sentinel1Iw { .. } => "sentinel-1-grd",
            Self::Sentinel2L2a => "sentinel-2-l2a",
            Self::Sentinel2L1c => "sentinel-2-l1c",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Sentinel1Iw { .. } => "Sentinel-1 IW",
            Self::Sentinel2L2a => "Sentinel-2 L2A",
            Self::Sentinel2L1c => "Sentinel-2 L1C",
        }
    }

    /// CQL2 text filter narrowing the collection, if any.
    pub fn filter(&self) -> Option<String> {
        match self {
            Self::Sentinel1Iw { orbit: None } => Some("sar:instrument_mode = 'IW'".to_string()),
            Self::Sentinel1Iw { orbit: Some(orbit) } => Some(format!(
                "sar:instrument_mode = 'IW' and sat:orbit_state = '{}'",
                orbit.key()
            )),
            Self::Sentinel2L2a | Self::Sentinel2L1c => None,
        }
    }
}
