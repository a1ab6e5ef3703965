//! Pairwise matching of two acquisition sets.
use crate::acquisition::Acquisition;
use crate::error::OverlapError;
use crate::overlap::try_overlap_percent;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Thresholds a pair of acquisitions has to satisfy to be reported.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct MatchCriteria {
    #[serde(with = "crate::report::minutes")]
    pub max_time_delta: TimeDelta,
    pub min_overlap_percent: f64,
    /// Exclusive upper bound on the second acquisition's cloud cover.
    pub max_cloud_cover: f64,
}

impl Default for MatchCriteria {
    fn default() -> Self {
        Self {
            max_time_delta: TimeDelta::minutes(180),
            min_overlap_percent: 1.0,
            max_cloud_cover: 80.0,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct OverlapResult {
    pub first_id: String,
    pub second_id: String,
    pub first_timestamp: DateTime<Utc>,
    pub second_timestamp: DateTime<Utc>,
    #[serde(with = "crate::report::minutes")]
    pub time_delta: TimeDelta,
    pub overlap_percent: f64,
    pub cloud_cover: f64,
}

/// A pair whose overlap could not be computed.
#[derive(Clone, Debug, PartialEq)]
pub struct PairFailure {
    pub first_id: String,
    pub second_id: String,
    pub error: OverlapError,
}

impl fmt::Display for PairFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}: {}", self.first_id, self.second_id, self.error)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchReport {
    pub matches: Vec<OverlapResult>,
    pub failures: Vec<PairFailure>,
}

/// Compares every acquisition of `first` with every acquisition of `second`.
///
/// Results keep the traversal order: first-set major, second-set minor.
pub fn match_acquisitions(
    first: &[Acquisition],
    second: &[Acquisition],
    criteria: &MatchCriteria,
) -> MatchReport {
    let mut report = MatchReport::default();

    for a in first {
        for b in second {
            let time_delta = (a.timestamp - b.timestamp).abs();
            if time_delta > criteria.max_time_delta {
                continue;
            }

            let overlap_percent = match try_overlap_percent(&a.footprint, &b.footprint) {
                Ok(percent) => percent,
                Err(error) => {
                    log::warn!("Skipping pair {} x {}: {}", a.id, b.id, error);
                    report.failures.push(PairFailure {
                        first_id: a.id.clone(),
                        second_id: b.id.clone(),
                        error,
                    });
                    continue;
                }
            };
            if overlap_percent < criteria.min_overlap_percent {
                continue;
            }
            if b.cloud_cover >= criteria.max_cloud_cover {
                log::debug!("Rejecting {}: cloud cover {}%", b.id, b.cloud_cover);
                continue;
            }

            report.matches.push(OverlapResult {
                first_id: a.id.clone(),
                second_id: b.id.clone(),
                first_timestamp: a.timestamp,
                second_timestamp: b.timestamp,
                time_delta,
                overlap_percent,
                cloud_cover: b.cloud_cover,
            });
        }
    }

    report
}

pub fn find_overlaps(
    first: &[Acquisition],
    second: &[Acquisition],
    criteria: &MatchCriteria,
) -> Vec<OverlapResult> {
    match_acquisitions(first, second, criteria).matches
}
