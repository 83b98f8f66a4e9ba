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
use crate::error::Result;
use crate::funnel::success_mask;
use crate::time_series::date_values;
use serde::{Deserialize, Serialize};
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealDurationStats {
    pub successful_days: Vec<f64>,
    pub lost_days: Vec<f64>,
    pub mean_successful: Option<f64>,
    pub mean_lost: Option<f64>,
}
impl DealDurationStats {
    pub fn len(&self) -> usize {
        self.successful_days.len() + self.lost_days.len()
    }
    pub fn is_empty(&self) -> bool {
        self.successful_days.is_empty() && self.lost_days.is_empty()
    }
    pub fn summary(&self) -> String {
        format!(
            "Closing durations: {} successful (mean {}), {} lost (mean {})",
            self.successful_days.len(),
            fmt_mean(self.mean_successful),
            self.lost_days.len(),
            fmt_mean(self.mean_lost)
        )
    }
}
/// Days between creation and closing, split by outcome. Rows missing
/// either timestamp are skipped and negative spans are dropped.
pub fn closing_durations(dataset: &CrmDataset, policy: &DatasetPolicy) -> Result<DealDurationStats> {
    let created_column = policy.role(ColumnRole::Created)?;
    let closed_column = policy.role(ColumnRole::Closed)?;
    let created = date_values(&dataset.require_column(created_column)?, created_column)?;
    let closed = date_values(&dataset.require_column(closed_column)?, closed_column)?;
    let success = success_mask(dataset, policy.role(ColumnRole::Success)?)?;
    let mut successful_days = Vec::new();
    let mut lost_days = Vec::new();
    for index in 0..dataset.height() {
        let (Some(start), Some(end)) = (created[index], closed[index]) else {
            continue;
        };
        let days = (end - start).num_days();
        if days < 0 {
            continue;
        }
        if success[index] {
            successful_days.push(days as f64);
        } else {
            lost_days.push(days as f64);
        }
    }
    Ok(DealDurationStats {
        mean_successful: mean(&successful_days),
        mean_lost: mean(&lost_days),
        successful_days,
        lost_days,
    })
}
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(round2(values.iter().sum::<f64>() / values.len() as f64))
    }
}
fn fmt_mean(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2} days"))
}
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
