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
    category_panel, panel, trend_panel, trend_title_prefix, DashboardConfig, DashboardReport,
    PanelContent, SpendSelection,
};
use crate::catalog::DatasetPolicy;
use crate::dataset::{CrmDataset, DatasetKind};
use crate::descriptive::{describe, numeric_summaries, DescribeRequest};
use crate::error::Result;
use tracing::debug;
pub fn build(
    dataset: &CrmDataset,
    selection: &SpendSelection,
    policy: &DatasetPolicy,
    config: &DashboardConfig,
) -> Result<DashboardReport> {
    debug!(dataset = %dataset.name(), "building spend dashboard");
    let mut panels = Vec::new();
    let targets = policy.describe_targets(&dataset.column_names());
    panels.push(panel(
        "Dataset overview",
        describe(dataset, &DescribeRequest::for_columns(targets)).map(PanelContent::Summary),
    ));
    panels.push(panel(
        "Spend metrics",
        numeric_summaries(dataset, &policy.numeric_columns).map(PanelContent::Numeric),
    ));
    panels.push(category_panel(
        dataset,
        &selection.category_column,
        selection.chart,
        selection.nan_policy,
        None,
    ));
    let title = format!(
        "{} trend of ad spend records",
        trend_title_prefix(selection.granularity)
    );
    panels.push(trend_panel(
        dataset,
        &selection.trend_column,
        selection.granularity,
        config.strict_dates,
        &title,
    ));
    Ok(DashboardReport {
        kind: DatasetKind::Spend,
        dataset_name: dataset.name().to_string(),
        panels,
    })
}
