//! Slice queries over the dataset snapshot

use crate::city::CityTable;
use crate::snapshot::{Dataset, IndexedRecord};
use crate::QueryError;
use series_normalizer::{RawPair, RawValue, VariableKind};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Query parameters exactly as they arrive on the query string.
///
/// Empty strings count as absent; the dashboard sends `month=` when no month
/// is selected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IrradianceQuery {
    pub city: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub target: Option<String>,
}

/// Validated slice parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SliceParams {
    /// Dataset city id
    pub city: Option<String>,
    pub year: i32,
    /// 1-12
    pub month: Option<u32>,
    pub target: VariableKind,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl IrradianceQuery {
    /// Check required parameters and resolve the city through `cities`
    pub fn resolve(&self, cities: &CityTable) -> Result<SliceParams, QueryError> {
        let year = present(&self.year).ok_or(QueryError::MissingParameter("year"))?;
        let target = present(&self.target).ok_or(QueryError::MissingParameter("target"))?;

        let year = year
            .parse::<i32>()
            .map_err(|_| QueryError::InvalidParameter {
                name: "year",
                value: year.to_string(),
                reason: "expected an integer year".to_string(),
            })?;

        let target = target
            .parse::<VariableKind>()
            .map_err(|e| QueryError::InvalidParameter {
                name: "target",
                value: target.to_string(),
                reason: e.to_string(),
            })?;

        let month = present(&self.month)
            .map(|m| {
                m.parse::<u32>()
                    .ok()
                    .filter(|m| (1..=12).contains(m))
                    .ok_or_else(|| QueryError::InvalidParameter {
                        name: "month",
                        value: m.to_string(),
                        reason: "expected a month number 1-12".to_string(),
                    })
            })
            .transpose()?;

        Ok(SliceParams {
            city: present(&self.city).map(|c| cities.resolve(c)),
            year,
            month,
            target,
        })
    }
}

impl SliceParams {
    /// Whether an indexed record survives the city → year → month filters
    pub fn matches(&self, indexed: &IndexedRecord) -> bool {
        if let Some(city) = &self.city {
            if indexed.record.city_id != *city {
                return false;
            }
        }
        if indexed.year != Some(self.year) {
            return false;
        }
        match self.month {
            Some(month) => indexed.month == Some(month),
            None => true,
        }
    }

    /// Project a record to `{date, value}` for the target field
    pub fn project(&self, indexed: &IndexedRecord) -> RawPair {
        RawPair {
            date: indexed.record.period_end.clone(),
            value: indexed
                .record
                .values
                .get(&self.target)
                .map(|v| RawValue::Text(v.clone())),
        }
    }
}

/// Ingestion/filter service over an explicit dataset snapshot
#[derive(Debug, Clone)]
pub struct FilterService {
    dataset: Arc<Dataset>,
    cities: CityTable,
}

impl FilterService {
    /// Create a service owning a shared snapshot
    pub fn new(dataset: Arc<Dataset>, cities: CityTable) -> Self {
        Self { dataset, cities }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn cities(&self) -> &CityTable {
        &self.cities
    }

    /// Filter and project in the dataset's original order.
    ///
    /// Sorting is left to the series normalizer.
    pub fn query(&self, query: &IrradianceQuery) -> Result<Vec<RawPair>, QueryError> {
        let params = query.resolve(&self.cities)?;
        Ok(self.slice(&params))
    }

    /// Filter and project with already validated parameters
    pub fn slice(&self, params: &SliceParams) -> Vec<RawPair> {
        let rows: Vec<RawPair> = self
            .dataset
            .records()
            .iter()
            .filter(|r| params.matches(r))
            .map(|r| params.project(r))
            .collect();

        debug!(
            "Query city={:?} year={} month={:?} target={}: {} rows",
            params.city,
            params.year,
            params.month,
            params.target,
            rows.len()
        );
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
period_end,city_id,ghi,dni,dhi,pv
2023-03-02T00:30:00Z,1,410,600,100,900
2022-03-01T00:30:00Z,1,400,610,110,910
2023-03-01T00:30:00Z,1,420,620,120,920
2023-04-01T00:30:00Z,1,430,630,130,930
2023-03-01T00:30:00Z,2,440,640,140,940
garbage,1,450,650,150,950
";

    fn service() -> FilterService {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        FilterService::new(Arc::new(dataset), CityTable::default())
    }

    fn query(city: Option<&str>, year: Option<&str>, month: Option<&str>, target: Option<&str>) -> IrradianceQuery {
        IrradianceQuery {
            city: city.map(String::from),
            year: year.map(String::from),
            month: month.map(String::from),
            target: target.map(String::from),
        }
    }

    #[test]
    fn test_city_and_year_filter_keeps_original_order() {
        let rows = service()
            .query(&query(Some("Indore"), Some("2023"), None, Some("ghi")))
            .unwrap();

        let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(
            dates,
            vec!["2023-03-02T00:30:00Z", "2023-03-01T00:30:00Z", "2023-04-01T00:30:00Z"]
        );
        assert_eq!(rows[0].value, Some(RawValue::Text("410".into())));
    }

    #[test]
    fn test_month_filter_and_target_projection() {
        let rows = service()
            .query(&query(None, Some("2023"), Some("3"), Some("DNI")))
            .unwrap();
        let values: Vec<_> = rows.iter().map(|r| r.value.clone().unwrap()).collect();
        assert_eq!(
            values,
            vec![
                RawValue::from("600"),
                RawValue::from("620"),
                RawValue::from("640"),
            ]
        );
    }

    #[test]
    fn test_city_id_passes_through() {
        let rows = service()
            .query(&query(Some("2"), Some("2023"), None, Some("pv")))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, Some(RawValue::from("940")));
    }

    #[test]
    fn test_missing_required_parameters() {
        let svc = service();
        assert_eq!(
            svc.query(&query(Some("Indore"), None, None, Some("ghi"))).unwrap_err(),
            QueryError::MissingParameter("year")
        );
        assert_eq!(
            svc.query(&query(None, Some("2023"), None, None)).unwrap_err(),
            QueryError::MissingParameter("target")
        );
        // empty strings are absent
        assert_eq!(
            svc.query(&query(None, Some(""), Some(""), Some("ghi"))).unwrap_err(),
            QueryError::MissingParameter("year")
        );
    }

    #[test]
    fn test_empty_month_means_no_month_filter() {
        let rows = service()
            .query(&query(Some("Indore"), Some("2023"), Some(""), Some("ghi")))
            .unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_invalid_parameters() {
        let svc = service();
        for q in [
            query(None, Some("twenty"), None, Some("ghi")),
            query(None, Some("2023"), Some("13"), Some("ghi")),
            query(None, Some("2023"), Some("0"), Some("ghi")),
            query(None, Some("2023"), None, Some("temperature")),
        ] {
            assert!(matches!(
                svc.query(&q),
                Err(QueryError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_unknown_city_matches_nothing() {
        let rows = service()
            .query(&query(Some("Mumbai"), Some("2023"), None, Some("ghi")))
            .unwrap();
        assert!(rows.is_empty());
    }
}
