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
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescribeRequest {
    pub columns: Vec<String>,
}
impl DescribeRequest {
    pub fn all() -> Self {
        Self::default()
    }
    pub fn for_columns(columns: Vec<String>) -> Self {
        Self { columns }
    }
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: Option<usize>,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub mode: Option<f64>,
    pub range: Option<f64>,
}
impl fmt::Display for NumericSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: mean {}, median {}, mode {}, range {}",
            self.column,
            fmt_value(self.mean),
            fmt_value(self.median),
            self.mode
                .map_or_else(|| "no mode".to_string(), |v| format!("{v:.2}")),
            fmt_value(self.range)
        )
    }
}
pub fn describe(dataset: &CrmDataset, request: &DescribeRequest) -> Result<Vec<ColumnSummary>> {
    let targets = if request.columns.is_empty() {
        dataset.column_names()
    } else {
        request.columns.clone()
    };
    let frame = dataset.frame();
    let selected: Vec<&Series> = targets
        .iter()
        .filter_map(|name| frame.column(name).ok())
        .map(|column| column.as_materialized_series())
        .collect();
    selected.into_par_iter().map(summarize_column).collect()
}
pub fn numeric_summary(dataset: &CrmDataset, column: &str) -> Result<NumericSummary> {
    let series = dataset.require_column(column)?;
    let casted = series
        .cast(&DataType::Float64)
        .map_err(|e| utils::column_statistics(column, e))?;
    let values: Vec<f64> = casted
        .f64()
        .map_err(|e| utils::column_statistics(column, e))?
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() {
        return Ok(NumericSummary {
            column: column.to_string(),
            mean: None,
            median: None,
            mode: None,
            range: None,
        });
    }
    let mode = modal_value(&values);
    let clean = Float64Chunked::from_vec(column.into(), values);
    let range = match (clean.min(), clean.max()) {
        (Some(lo), Some(hi)) => Some(round2(hi - lo)),
        _ => None,
    };
    Ok(NumericSummary {
        column: column.to_string(),
        mean: clean.mean().map(round2),
        median: clean.median().map(round2),
        mode: mode.map(round2),
        range,
    })
}
pub fn numeric_summaries(dataset: &CrmDataset, columns: &[String]) -> Result<Vec<NumericSummary>> {
    columns
        .iter()
        .map(|column| numeric_summary(dataset, column))
        .collect()
}
pub fn summary_table(rows: &[ColumnSummary]) -> String {
    let mut output = String::from("Column | Count | Unique | Top | Freq\n");
    for row in rows {
        output.push_str(&format!(
            "{} | {} | {} | {} | {}\n",
            row.column,
            row.count,
            row.unique,
            row.top.as_deref().unwrap_or("-"),
            row.freq.map_or_else(|| "-".to_string(), |v| v.to_string())
        ));
    }
    output
}
fn summarize_column(series: &Series) -> Result<ColumnSummary> {
    let column = series.name().to_string();
    let count = series.len() - series.null_count();
    let distinct = series
        .n_unique()
        .map_err(|e| utils::column_statistics(&column, e))?;
    let unique = if series.null_count() > 0 {
        distinct.saturating_sub(1)
    } else {
        distinct
    };
    let (top, freq) = top_value(series, &column)?;
    Ok(ColumnSummary {
        column,
        count,
        unique,
        top,
        freq,
    })
}
fn top_value(series: &Series, column: &str) -> Result<(Option<String>, Option<usize>)> {
    let casted = series
        .cast(&DataType::String)
        .map_err(|e| utils::column_statistics(column, e))?;
    let chunked = casted
        .str()
        .map_err(|e| utils::column_statistics(column, e))?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in chunked.into_iter().flatten() {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    Ok(counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map_or((None, None), |(value, count)| (Some(value), Some(count))))
}
/// Ties resolve to the smallest value, a run scan over the sorted sample.
fn modal_value(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mut best = (sorted[0], 1usize);
    let mut current = (sorted[0], 1usize);
    for &value in &sorted[1..] {
        if value.to_bits() == current.0.to_bits() {
            current.1 += 1;
        } else {
            current = (value, 1);
        }
        if current.1 > best.1 {
            best = current;
        }
    }
    Some(best.0)
}
fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
