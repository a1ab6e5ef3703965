use crate::catalog::{Catalog, Collection};
use crate::error::InputError;
use crate::matcher::{match_acquisitions, MatchCriteria, MatchReport};
use crate::search_area::{build_search_region, GeoPoint};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::future::try_join;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InputError> {
        if start > end {
            return Err(InputError::DateOrder {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Window from midnight UTC of `start` to midnight UTC of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, InputError> {
        let midnight = |d: NaiveDate| d.and_time(chrono::NaiveTime::MIN).and_utc();
        Self::new(midnight(start), midnight(end))
    }

    /// RFC 3339 interval as used by STAC `datetime` queries.
    pub fn to_interval(&self) -> String {
        format!(
            "{}/{}",
            self.start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        )
    }
}

#[derive(Clone, Debug)]
pub struct OverlapRequest {
    pub location: GeoPoint,
    pub buffer_degrees: f64,
    pub window: TimeWindow,
    pub first: Collection,
    pub second: Collection,
    pub criteria: MatchCriteria,
}

/// Fetches both collections around the request location and matches them.
pub async fn find_sentinel_overlaps(
    catalog: &impl Catalog,
    request: &OverlapRequest,
) -> Result<MatchReport> {
    let region = build_search_region(request.location, request.buffer_degrees)?;

    log::info!(
        "Searching {} and {} from {} to {}",
        request.first.name(),
        request.second.name(),
        request.window.start,
        request.window.end
    );
    let (first, second) = try_join(
        catalog.search(&request.first, &region, &request.window),
        catalog.search(&request.second, &region, &request.window),
    )
    .await?;
    log::info!("{} acquisitions: {}", request.first.name(), first.len());
    log::info!("{} acquisitions: {}", request.second.name(), second.len());

    let report = match_acquisitions(&first, &second, &request.criteria);
    if !report.failures.is_empty() {
        log::warn!(
            "Overlap could not be computed for {} pairs",
            report.failures.len()
        );
    }
    Ok(report)
}
