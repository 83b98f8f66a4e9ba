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

use crate::catalog::{ColumnRole, DatasetPolicy};
use crate::dataset::CrmDataset;
use crate::error::{utils, Result, ValidationError, ValidationResult};
use crate::time_series::date_values;
use itertools::Itertools;
use polars::prelude::AnyValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
/// A deal counts as successful when its study-duration cell is present.
pub fn is_successful_deal(value: &AnyValue) -> bool {
    !matches!(value, AnyValue::Null)
}
pub fn success_mask(dataset: &CrmDataset, success_column: &str) -> Result<Vec<bool>> {
    let series = dataset.require_column(success_column)?.rechunk();
    Ok(series.iter().map(|value| is_successful_deal(&value)).collect())
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetQuality {
    High,
    Medium,
    NonTarget,
}
impl TargetQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetQuality::High => "High",
            TargetQuality::Medium => "Medium",
            TargetQuality::NonTarget => "Non-Target",
        }
    }
}
impl fmt::Display for TargetQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
pub fn target_quality(raw: &str) -> TargetQuality {
    match raw {
        "A - High" => TargetQuality::High,
        "B - Medium" => TargetQuality::Medium,
        _ => TargetQuality::NonTarget,
    }
}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunnelSort {
    #[default]
    TotalThenConversion,
    TotalDesc,
    ConversionDesc,
    MonetaryDesc,
}
#[derive(Debug, Clone, PartialEq)]
pub struct FunnelRequest {
    pub group_by: String,
    pub success_column: String,
    pub monetary_column: Option<String>,
    pub required_columns: Vec<String>,
    pub sort: FunnelSort,
    pub min_successful: usize,
    pub min_conversion: f64,
    pub top_n: Option<usize>,
}
impl FunnelRequest {
    pub fn new(group_by: impl Into<String>, success_column: impl Into<String>) -> Self {
        Self {
            group_by: group_by.into(),
            success_column: success_column.into(),
            monetary_column: None,
            required_columns: Vec::new(),
            sort: FunnelSort::default(),
            min_successful: 0,
            min_conversion: 0.0,
            top_n: None,
        }
    }
    pub fn validate(&self) -> ValidationResult<()> {
        if self.group_by.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "group_by".to_string(),
            });
        }
        if self.success_column.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "success_column".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&self.min_conversion) {
            return Err(ValidationError::InvalidPercentage {
                value: self.min_conversion,
            });
        }
        if self.top_n == Some(0) {
            return Err(ValidationError::InvalidTopN { value: 0 });
        }
        Ok(())
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelRow {
    pub group: String,
    pub total: usize,
    pub successful: usize,
    pub conversion_rate: f64,
    pub monetary_total: Option<f64>,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelReport {
    pub group_by: String,
    pub rows: Vec<FunnelRow>,
}
impl FunnelReport {
    pub fn groups(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.group.clone()).collect()
    }
    pub fn totals(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.total).collect()
    }
    pub fn successes(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.successful).collect()
    }
    pub fn conversions(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.conversion_rate).collect()
    }
    pub fn monetary_totals(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| r.monetary_total.unwrap_or(0.0))
            .collect()
    }
    pub fn filter_min_successful(&self, min: usize) -> FunnelReport {
        FunnelReport {
            group_by: self.group_by.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| r.successful >= min)
                .cloned()
                .collect(),
        }
    }
    pub fn filter_min_conversion(&self, min: f64) -> FunnelReport {
        FunnelReport {
            group_by: self.group_by.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| r.conversion_rate >= min)
                .cloned()
                .collect(),
        }
    }
    pub fn top(&self, n: usize) -> FunnelReport {
        FunnelReport {
            group_by: self.group_by.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn table(&self) -> String {
        let mut output = format!("{} | Total | Successful | Conversion % | Sales\n", self.group_by);
        for row in &self.rows {
            output.push_str(&format!(
                "{} | {} | {} | {:.2} | {}\n",
                row.group,
                row.total,
                row.successful,
                row.conversion_rate,
                row.monetary_total
                    .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
            ));
        }
        output
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FunnelMeans {
    pub mean_total: f64,
    pub mean_successful: f64,
    pub mean_conversion: f64,
}
#[derive(Debug, Default)]
struct FunnelAcc {
    total: usize,
    successful: usize,
    monetary: f64,
}
pub fn aggregate(dataset: &CrmDataset, request: &FunnelRequest) -> Result<FunnelReport> {
    request.validate()?;
    let labels = dataset.string_values(&request.group_by)?;
    let success = success_mask(dataset, &request.success_column)?;
    let mut keep = vec![true; dataset.height()];
    for column in &request.required_columns {
        let series = dataset.require_column(column)?.rechunk();
        for (flag, value) in keep.iter_mut().zip(series.iter()) {
            if matches!(value, AnyValue::Null) {
                *flag = false;
            }
        }
    }
    let monetary = match &request.monetary_column {
        Some(column) => Some(dataset.numeric_values(column)?),
        None => None,
    };
    let mut groups: HashMap<String, FunnelAcc> = HashMap::new();
    for index in 0..dataset.height() {
        if !keep[index] {
            continue;
        }
        let Some(label) = labels[index].as_ref() else {
            continue;
        };
        let entry = groups.entry(label.clone()).or_default();
        entry.total += 1;
        if success[index] {
            entry.successful += 1;
            if let Some(values) = &monetary {
                entry.monetary += values[index].unwrap_or(0.0);
            }
        }
    }
    if groups.is_empty() {
        return Err(utils::empty_result(&request.group_by));
    }
    let mut rows: Vec<FunnelRow> = groups
        .into_iter()
        .map(|(group, acc)| FunnelRow {
            group,
            total: acc.total,
            successful: acc.successful,
            conversion_rate: conversion_rate(acc.successful, acc.total),
            monetary_total: request.monetary_column.as_ref().map(|_| round2(acc.monetary)),
        })
        .collect();
    rows.retain(|row| {
        row.successful >= request.min_successful && row.conversion_rate >= request.min_conversion
    });
    sort_rows(&mut rows, request.sort);
    if let Some(limit) = request.top_n {
        rows.truncate(limit);
    }
    if rows.is_empty() {
        return Err(utils::empty_result(&request.group_by));
    }
    Ok(FunnelReport {
        group_by: request.group_by.clone(),
        rows,
    })
}
pub fn report_means(report: &FunnelReport) -> FunnelMeans {
    let n = report.rows.len();
    if n == 0 {
        return FunnelMeans {
            mean_total: 0.0,
            mean_successful: 0.0,
            mean_conversion: 0.0,
        };
    }
    let count = n as f64;
    FunnelMeans {
        mean_total: round2(report.rows.iter().map(|r| r.total as f64).sum::<f64>() / count),
        mean_successful: round2(
            report.rows.iter().map(|r| r.successful as f64).sum::<f64>() / count,
        ),
        mean_conversion: round2(
            report.rows.iter().map(|r| r.conversion_rate).sum::<f64>() / count,
        ),
    }
}
pub fn conversion_rate(successful: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(successful as f64 / total as f64 * 100.0)
    }
}
fn sort_rows(rows: &mut [FunnelRow], sort: FunnelSort) {
    match sort {
        FunnelSort::TotalThenConversion => rows.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then(compare_f64(b.conversion_rate, a.conversion_rate))
                .then_with(|| a.group.cmp(&b.group))
        }),
        FunnelSort::TotalDesc => rows.sort_by(|a, b| {
            b.total.cmp(&a.total).then_with(|| a.group.cmp(&b.group))
        }),
        FunnelSort::ConversionDesc => rows.sort_by(|a, b| {
            compare_f64(b.conversion_rate, a.conversion_rate).then_with(|| a.group.cmp(&b.group))
        }),
        FunnelSort::MonetaryDesc => rows.sort_by(|a, b| {
            compare_f64(
                b.monetary_total.unwrap_or(0.0),
                a.monetary_total.unwrap_or(0.0),
            )
            .then_with(|| a.group.cmp(&b.group))
        }),
    }
}
fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceQualityRow {
    pub source: String,
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub high_pct: f64,
    pub medium_pct: f64,
    pub successful: usize,
    pub conversion_rate: f64,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceQualityReport {
    pub rows: Vec<SourceQualityRow>,
}
impl SourceQualityReport {
    pub fn table(&self) -> String {
        let mut output = String::from(
            "Source | Total | High | Medium | High % | Medium % | Closed Won | Conversion %\n",
        );
        for row in &self.rows {
            output.push_str(&format!(
                "{} | {} | {} | {} | {:.2} | {:.2} | {} | {:.2}\n",
                row.source,
                row.total,
                row.high,
                row.medium,
                row.high_pct,
                row.medium_pct,
                row.successful,
                row.conversion_rate
            ));
        }
        output
    }
}
#[derive(Debug, Default)]
struct SourceAcc {
    total: usize,
    high: usize,
    medium: usize,
    successful: usize,
}
pub fn source_quality(
    dataset: &CrmDataset,
    source_column: &str,
    quality_column: &str,
    success_column: &str,
) -> Result<SourceQualityReport> {
    let sources = dataset.string_values(source_column)?;
    let qualities = dataset.string_values(quality_column)?;
    let success = success_mask(dataset, success_column)?;
    let mut accs: HashMap<String, SourceAcc> = HashMap::new();
    for index in 0..dataset.height() {
        let Some(source) = sources[index].as_ref() else {
            continue;
        };
        let entry = accs.entry(source.clone()).or_default();
        entry.total += 1;
        if let Some(quality) = qualities[index].as_ref() {
            match target_quality(quality) {
                TargetQuality::High => entry.high += 1,
                TargetQuality::Medium => entry.medium += 1,
                TargetQuality::NonTarget => {}
            }
        }
        if success[index] {
            entry.successful += 1;
        }
    }
    if accs.is_empty() {
        return Err(utils::empty_result(source_column));
    }
    let rows = accs
        .into_iter()
        .map(|(source, acc)| SourceQualityRow {
            source,
            total: acc.total,
            high: acc.high,
            medium: acc.medium,
            high_pct: conversion_rate(acc.high, acc.total),
            medium_pct: conversion_rate(acc.medium, acc.total),
            successful: acc.successful,
            conversion_rate: conversion_rate(acc.successful, acc.total),
        })
        .sorted_by(|a, b| {
            compare_f64(b.conversion_rate, a.conversion_rate).then_with(|| a.source.cmp(&b.source))
        })
        .collect();
    Ok(SourceQualityReport { rows })
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTypeRow {
    pub payment_type: String,
    pub total: usize,
    pub successful: usize,
    pub conversion_rate: f64,
    pub avg_initial_amount: Option<f64>,
    pub avg_offer_amount: Option<f64>,
    pub avg_study_months: Option<f64>,
    pub avg_days_to_close: Option<f64>,
    pub median_days_to_close: Option<f64>,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReport {
    pub rows: Vec<PaymentTypeRow>,
}
impl PaymentReport {
    pub fn table(&self) -> String {
        let mut output = String::from(
            "Payment Type | Total | Successful | Conversion % | Avg Initial | Avg Offer | Avg Months | Avg Days | Median Days\n",
        );
        for row in &self.rows {
            output.push_str(&format!(
                "{} | {} | {} | {:.2} | {} | {} | {} | {} | {}\n",
                row.payment_type,
                row.total,
                row.successful,
                row.conversion_rate,
                fmt_cell(row.avg_initial_amount),
                fmt_cell(row.avg_offer_amount),
                fmt_cell(row.avg_study_months),
                fmt_cell(row.avg_days_to_close),
                fmt_cell(row.median_days_to_close)
            ));
        }
        output
    }
}
fn fmt_cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}
#[derive(Debug, Default)]
struct PaymentAcc {
    total: usize,
    successful: usize,
    initial: MeanAcc,
    offer: MeanAcc,
    months: MeanAcc,
    days: Vec<f64>,
}
#[derive(Debug, Default)]
struct MeanAcc {
    sum: f64,
    count: usize,
}
impl MeanAcc {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }
    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(round2(self.sum / self.count as f64))
        }
    }
}
pub fn payment_breakdown(dataset: &CrmDataset, policy: &DatasetPolicy) -> Result<PaymentReport> {
    let payment_column = policy.role(ColumnRole::Payment)?;
    let success_column = policy.role(ColumnRole::Success)?;
    let labels = dataset.string_values(payment_column)?;
    let success = success_mask(dataset, success_column)?;
    let initial = dataset.numeric_values(policy.role(ColumnRole::Monetary)?)?;
    let offer = dataset.numeric_values(policy.role(ColumnRole::Offer)?)?;
    let months = dataset.numeric_values(success_column)?;
    let created_column = policy.role(ColumnRole::Created)?;
    let closed_column = policy.role(ColumnRole::Closed)?;
    let created = date_values(&dataset.require_column(created_column)?, created_column)?;
    let closed = date_values(&dataset.require_column(closed_column)?, closed_column)?;
    let mut accs: HashMap<String, PaymentAcc> = HashMap::new();
    for index in 0..dataset.height() {
        let Some(label) = labels[index].as_ref() else {
            continue;
        };
        let entry = accs.entry(label.clone()).or_default();
        entry.total += 1;
        if success[index] {
            entry.successful += 1;
        }
        entry.initial.push(initial[index]);
        entry.offer.push(offer[index]);
        entry.months.push(months[index]);
        if let (Some(start), Some(end)) = (created[index], closed[index]) {
            entry.days.push((end - start).num_days() as f64);
        }
    }
    if accs.is_empty() {
        return Err(utils::empty_result(payment_column));
    }
    let rows = accs
        .into_iter()
        .map(|(payment_type, acc)| {
            let days_mean = if acc.days.is_empty() {
                None
            } else {
                Some(round2(acc.days.iter().sum::<f64>() / acc.days.len() as f64))
            };
            PaymentTypeRow {
                payment_type,
                total: acc.total,
                successful: acc.successful,
                conversion_rate: conversion_rate(acc.successful, acc.total),
                avg_initial_amount: acc.initial.mean(),
                avg_offer_amount: acc.offer.mean(),
                avg_study_months: acc.months.mean(),
                avg_days_to_close: days_mean,
                median_days_to_close: median(&acc.days).map(round2),
            }
        })
        .sorted_by(|a, b| a.payment_type.cmp(&b.payment_type))
        .collect();
    Ok(PaymentReport { rows })
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTabMatrix {
    pub row_key: String,
    pub col_key: String,
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}
pub fn cross_tab(
    dataset: &CrmDataset,
    row_key: &str,
    col_key: &str,
    success_column: &str,
) -> Result<CrossTabMatrix> {
    let row_labels = dataset.string_values(row_key)?;
    let col_labels = dataset.string_values(col_key)?;
    let success = success_mask(dataset, success_column)?;
    let mut combos: HashMap<(String, String), (usize, usize)> = HashMap::new();
    let mut row_totals: HashMap<String, usize> = HashMap::new();
    let mut col_totals: HashMap<String, usize> = HashMap::new();
    for index in 0..dataset.height() {
        let (Some(row), Some(col)) = (row_labels[index].as_ref(), col_labels[index].as_ref())
        else {
            continue;
        };
        let combo = combos.entry((row.clone(), col.clone())).or_insert((0, 0));
        combo.0 += 1;
        if success[index] {
            combo.1 += 1;
        }
        *row_totals.entry(row.clone()).or_insert(0) += 1;
        *col_totals.entry(col.clone()).or_insert(0) += 1;
    }
    if combos.is_empty() {
        return Err(utils::empty_result(row_key));
    }
    let rows: Vec<String> = row_totals
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)))
        .map(|(label, _)| label.clone())
        .collect();
    let cols: Vec<String> = col_totals
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)))
        .map(|(label, _)| label.clone())
        .collect();
    let cells = rows
        .iter()
        .map(|row| {
            cols.iter()
                .map(|col| {
                    combos
                        .get(&(row.clone(), col.clone()))
                        .map(|(total, successful)| conversion_rate(*successful, *total))
                })
                .collect()
        })
        .collect();
    Ok(CrossTabMatrix {
        row_key: row_key.to_string(),
        col_key: col_key.to_string(),
        rows,
        cols,
        cells,
    })
}
fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
