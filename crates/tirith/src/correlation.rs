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
use crate::error::{Result, ValidationError, ValidationResult};
use crate::funnel::success_mask;
use crate::time_series::date_values;
use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealScope {
    #[default]
    All,
    SuccessfulOnly,
}
impl DealScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealScope::All => "all deals",
            DealScope::SuccessfulOnly => "successful deals",
        }
    }
}
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationRequest {
    pub left_column: String,
    pub right_column: String,
    pub scope: DealScope,
    pub success_column: Option<String>,
}
impl CorrelationRequest {
    pub fn new(left_column: impl Into<String>, right_column: impl Into<String>) -> Self {
        Self {
            left_column: left_column.into(),
            right_column: right_column.into(),
            scope: DealScope::default(),
            success_column: None,
        }
    }
    pub fn validate(&self) -> ValidationResult<()> {
        if self.left_column.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "left_column".to_string(),
            });
        }
        if self.right_column.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "right_column".to_string(),
            });
        }
        if self.scope == DealScope::SuccessfulOnly && self.success_column.is_none() {
            return Err(ValidationError::EmptyField {
                field: "success_column".to_string(),
            });
        }
        Ok(())
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub scope: DealScope,
    pub months: Vec<NaiveDate>,
    pub left_counts: Vec<u32>,
    pub right_counts: Vec<u32>,
    pub coefficient: Option<f64>,
}
impl CorrelationResult {
    pub fn month_labels(&self) -> Vec<String> {
        self.months
            .iter()
            .map(|m| m.format("%Y-%m").to_string())
            .collect()
    }
    pub fn len(&self) -> usize {
        self.months.len()
    }
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}
/// Rows bucket under the last day of their month.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}
pub fn monthly_counts(dataset: &CrmDataset, column: &str) -> Result<BTreeMap<NaiveDate, u32>> {
    monthly_counts_masked(dataset, column, None)
}
fn monthly_counts_masked(
    dataset: &CrmDataset,
    column: &str,
    mask: Option<&[bool]>,
) -> Result<BTreeMap<NaiveDate, u32>> {
    let series = dataset.require_column(column)?;
    let dates = date_values(&series, column)?;
    let mut counts = BTreeMap::new();
    for (index, date) in dates.iter().enumerate() {
        if let Some(mask) = mask {
            if !mask[index] {
                continue;
            }
        }
        if let Some(date) = date {
            *counts.entry(month_end(*date)).or_insert(0u32) += 1;
        }
    }
    Ok(counts)
}
/// Pearson correlation between two monthly activity series. The two
/// sides outer-join on month with unmatched months counted as zero.
/// Fewer than two joined months, or a flat series on either side,
/// yields `coefficient: None` rather than an error.
pub fn correlate(
    left: &CrmDataset,
    right: &CrmDataset,
    request: &CorrelationRequest,
) -> Result<CorrelationResult> {
    request.validate()?;
    let left_map = match (request.scope, request.success_column.as_deref()) {
        (DealScope::SuccessfulOnly, Some(success_column)) => {
            let mask = success_mask(left, success_column)?;
            monthly_counts_masked(left, &request.left_column, Some(&mask))?
        }
        _ => monthly_counts_masked(left, &request.left_column, None)?,
    };
    let right_map = monthly_counts_masked(right, &request.right_column, None)?;
    let months: Vec<NaiveDate> = left_map
        .keys()
        .chain(right_map.keys())
        .copied()
        .sorted()
        .dedup()
        .collect();
    let left_counts: Vec<u32> = months
        .iter()
        .map(|m| left_map.get(m).copied().unwrap_or(0))
        .collect();
    let right_counts: Vec<u32> = months
        .iter()
        .map(|m| right_map.get(m).copied().unwrap_or(0))
        .collect();
    let xs: Vec<f64> = left_counts.iter().map(|&c| f64::from(c)).collect();
    let ys: Vec<f64> = right_counts.iter().map(|&c| f64::from(c)).collect();
    Ok(CorrelationResult {
        scope: request.scope,
        months,
        left_counts,
        right_counts,
        coefficient: pearson(&xs, &ys),
    })
}
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(round2(covariance / (var_x * var_y).sqrt()))
}
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
