#![allow(async_fn_in_trait)]
pub mod acquisition;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod matcher;
pub mod overlap;
pub mod projection;
pub mod report;
pub mod search;
pub mod search_area;

pub use acquisition::Acquisition;
pub use matcher::{find_overlaps, match_acquisitions, MatchCriteria, MatchReport, OverlapResult};
pub use overlap::{overlap_percent, try_overlap_percent};
pub use search::{find_sentinel_overlaps, OverlapRequest, TimeWindow};
pub use search_area::{build_search_region, GeoPoint};
