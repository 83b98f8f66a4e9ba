// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::dataset::CrmDataset;
use crate::error::{utils, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y", "%m/%d/%Y"];
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    Day,
    Week,
    #[default]
    Month,
}
impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => {
                date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Granularity::Month => {
                NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
            }
        }
    }
    pub fn label(&self, bucket_start: NaiveDate) -> String {
        match self {
            Granularity::Day => bucket_start.format("%Y-%m-%d").to_string(),
            Granularity::Week => format!(
                "{}-W{:02}",
                bucket_start.iso_week().year(),
                bucket_start.iso_week().week()
            ),
            Granularity::Month => bucket_start.format("%Y-%m").to_string(),
        }
    }
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendRequest {
    pub column: String,
    pub granularity: Granularity,
    pub strict: bool,
}
impl TrendRequest {
    pub fn new(column: impl Into<String>, granularity: Granularity) -> Self {
        Self {
            column: column.into(),
            granularity,
            strict: true,
        }
    }
    /// Unparseable timestamps are skipped instead of failing the request.
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub bucket_start: NaiveDate,
    pub label: String,
    pub count: usize,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub column: String,
    pub granularity: Granularity,
    pub points: Vec<TrendPoint>,
}
impl TrendSeries {
    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| p.label.clone()).collect()
    }
    pub fn counts(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.count).collect()
    }
    pub fn total(&self) -> usize {
        self.points.iter().map(|p| p.count).sum()
    }
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
pub fn bucket_counts(dataset: &CrmDataset, request: &TrendRequest) -> Result<TrendSeries> {
    let series = dataset.require_column(&request.column)?;
    let dates = if request.strict {
        date_values(&series, &request.column)?
    } else {
        date_values_lenient(&series, &request.column)?
    };
    let mut buckets: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in dates.into_iter().flatten() {
        *buckets
            .entry(request.granularity.bucket_start(date))
            .or_insert(0) += 1;
    }
    if buckets.is_empty() {
        return Err(utils::empty_result(&request.column));
    }
    let points = buckets
        .into_iter()
        .map(|(bucket_start, count)| TrendPoint {
            label: request.granularity.label(bucket_start),
            bucket_start,
            count,
        })
        .collect();
    Ok(TrendSeries {
        column: request.column.clone(),
        granularity: request.granularity,
        points,
    })
}
/// Missing and blank cells come back as `None`; any other unparseable value is an error.
pub(crate) fn date_values(series: &Series, column: &str) -> Result<Vec<Option<NaiveDate>>> {
    let casted = series
        .cast(&DataType::String)
        .map_err(|e| utils::column_statistics(column, e))?;
    let chunked = casted
        .str()
        .map_err(|e| utils::column_statistics(column, e))?;
    let mut dates = Vec::with_capacity(chunked.len());
    for value in chunked.into_iter() {
        match value {
            None => dates.push(None),
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    dates.push(None);
                } else if let Some(date) = parse_date_value(trimmed) {
                    dates.push(Some(date));
                } else {
                    return Err(utils::date_parse(column, trimmed));
                }
            }
        }
    }
    Ok(dates)
}
pub(crate) fn date_values_lenient(series: &Series, column: &str) -> Result<Vec<Option<NaiveDate>>> {
    let casted = series
        .cast(&DataType::String)
        .map_err(|e| utils::column_statistics(column, e))?;
    let chunked = casted
        .str()
        .map_err(|e| utils::column_statistics(column, e))?;
    Ok(chunked
        .into_iter()
        .map(|value| value.and_then(|raw| parse_date_value(raw.trim())))
        .collect())
}
pub(crate) fn parse_date_value(value: &str) -> Option<NaiveDate> {
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, format) {
            return Some(parsed);
        }
    }
    None
}
