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

use super::{
    category_panel, panel, trend_panel, trend_title_prefix, CallsSelection, DashboardConfig,
    DashboardReport, PanelContent,
};
use crate::catalog::DatasetPolicy;
use crate::dataset::{CrmDataset, DatasetKind};
use crate::descriptive::{describe, numeric_summaries, DescribeRequest};
use crate::error::{DataError, Result};
use polars::prelude::{NamedFrom, Series};
use tracing::debug;
pub fn build(
    dataset: &CrmDataset,
    selection: &CallsSelection,
    policy: &DatasetPolicy,
    config: &DashboardConfig,
) -> Result<DashboardReport> {
    debug!(dataset = %dataset.name(), "building calls dashboard");
    let prepared = remap_flags(dataset, policy)?;
    let mut panels = Vec::new();
    let targets = policy.describe_targets(&prepared.column_names());
    panels.push(panel(
        "Dataset overview",
        describe(&prepared, &DescribeRequest::for_columns(targets)).map(PanelContent::Summary),
    ));
    panels.push(panel(
        "Call duration",
        numeric_summaries(&prepared, &policy.numeric_columns).map(PanelContent::Numeric),
    ));
    panels.push(category_panel(
        &prepared,
        &selection.category_column,
        selection.chart,
        selection.nan_policy,
        None,
    ));
    let title = format!("{} trend of calls", trend_title_prefix(selection.granularity));
    panels.push(trend_panel(
        &prepared,
        &selection.trend_column,
        selection.granularity,
        config.strict_dates,
        &title,
    ));
    Ok(DashboardReport {
        kind: DatasetKind::Calls,
        dataset_name: dataset.name().to_string(),
        panels,
    })
}
/// CRM exports store the scheduled flag as 0/1; readers expect words.
fn remap_flags(dataset: &CrmDataset, policy: &DatasetPolicy) -> Result<CrmDataset> {
    let mut frame = dataset.frame().clone();
    for column in &policy.boolean_flag_columns {
        if !dataset.has_column(column) {
            continue;
        }
        let mapped: Vec<Option<String>> = dataset
            .string_values(column)?
            .into_iter()
            .map(|value| value.map(|v| remap_flag_value(&v)))
            .collect();
        let series = Series::new(column.as_str().into(), mapped);
        frame.with_column(series).map_err(DataError::from)?;
    }
    Ok(CrmDataset::from_dataframe(
        frame,
        dataset.kind(),
        dataset.name(),
    ))
}
fn remap_flag_value(value: &str) -> String {
    match value.trim() {
        "0" | "0.0" | "false" => "False".to_string(),
        "1" | "1.0" | "true" => "True".to_string(),
        other => other.to_string(),
    }
}
