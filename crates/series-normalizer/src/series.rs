//! Series building: parse, normalize, bucket, sort

use crate::kind::VariableKind;
use crate::moving_average::moving_average;
use crate::normalizer::{normalize_value, RawPair};
use crate::error::SeriesError;
use crate::timestamp::parse_timestamp;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A normalized `{date, value}` point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationPoint {
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Whether raw pairs still need grouping by calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucketing {
    /// One value per record; rows are already daily (server-filtered path)
    #[default]
    AlreadyDaily,
    /// Sub-daily samples averaged per UTC calendar day (CSV path)
    DailyMean,
}

impl Bucketing {
    /// Map the "already daily" flag onto a bucketing mode
    pub fn from_already_daily(already_daily: bool) -> Self {
        if already_daily {
            Bucketing::AlreadyDaily
        } else {
            Bucketing::DailyMean
        }
    }
}

/// Normalized series with its aligned trailing moving average
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesWithMovingAverage {
    pub original: Vec<ObservationPoint>,
    pub moving_avg: Vec<ObservationPoint>,
    /// Input records rejected during normalization
    #[serde(skip)]
    pub dropped: usize,
}

impl SeriesWithMovingAverage {
    /// Build the series and its moving average in one pass
    pub fn build(pairs: &[RawPair], kind: VariableKind, bucketing: Bucketing, window: usize) -> Self {
        let (original, dropped) = collect_series(pairs, kind, bucketing);
        let moving_avg = moving_average(&original, window);
        Self {
            original,
            moving_avg,
            dropped,
        }
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

fn normalize_pair(pair: &RawPair, kind: VariableKind) -> Result<ObservationPoint, SeriesError> {
    let timestamp = parse_timestamp(&pair.date)?;
    let raw = pair.value.as_ref().ok_or(SeriesError::MissingValue)?;
    let value = normalize_value(raw, kind)?;
    Ok(ObservationPoint { timestamp, value })
}

/// Parse and normalize every pair, drop failures, optionally bucket by day,
/// and sort ascending by timestamp.
///
/// The result does not depend on input order: ties on timestamp are broken by
/// value, and day means are summed in sorted order.
pub fn build_series(pairs: &[RawPair], kind: VariableKind, bucketing: Bucketing) -> Vec<ObservationPoint> {
    collect_series(pairs, kind, bucketing).0
}

/// [`build_series`] plus the number of rejected input records
fn collect_series(
    pairs: &[RawPair],
    kind: VariableKind,
    bucketing: Bucketing,
) -> (Vec<ObservationPoint>, usize) {
    let mut points = Vec::with_capacity(pairs.len());
    let mut dropped = 0usize;

    for pair in pairs {
        match normalize_pair(pair, kind) {
            Ok(point) => points.push(point),
            Err(e) => {
                dropped += 1;
                debug!("Dropping record {:?}: {}", pair.date, e);
            }
        }
    }

    if bucketing == Bucketing::DailyMean {
        points = daily_means(points);
    }

    points.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.value.total_cmp(&b.value))
    });

    debug!(
        "Built {} series: {} input, {} kept, {} dropped ({:?})",
        kind,
        pairs.len(),
        points.len(),
        dropped,
        bucketing
    );

    (points, dropped)
}

fn daily_means(points: Vec<ObservationPoint>) -> Vec<ObservationPoint> {
    let mut days: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for p in points {
        days.entry(p.timestamp.date_naive()).or_default().push(p.value);
    }

    days.into_iter()
        .filter_map(|(day, mut values)| {
            values.sort_by(f64::total_cmp);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let midnight = day.and_hms_opt(0, 0, 0)?.and_utc();
            Some(ObservationPoint {
                timestamp: midnight,
                value: mean,
            })
        })
        .collect()
}
