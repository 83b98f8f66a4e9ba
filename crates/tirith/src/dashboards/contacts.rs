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
    category_panel, panel, trend_panel, ContactsSelection, DashboardConfig, DashboardReport,
    PanelContent,
};
use crate::catalog::DatasetPolicy;
use crate::dataset::{CrmDataset, DatasetKind};
use crate::descriptive::{describe, DescribeRequest};
use crate::error::Result;
use crate::time_series::Granularity;
use tracing::debug;
pub fn build(
    dataset: &CrmDataset,
    selection: &ContactsSelection,
    policy: &DatasetPolicy,
    config: &DashboardConfig,
) -> Result<DashboardReport> {
    debug!(dataset = %dataset.name(), "building contacts dashboard");
    let mut panels = Vec::new();
    let targets = policy.describe_targets(&dataset.column_names());
    panels.push(panel(
        "Dataset overview",
        describe(dataset, &DescribeRequest::for_columns(targets)).map(PanelContent::Summary),
    ));
    panels.push(category_panel(
        dataset,
        &selection.category_column,
        selection.chart,
        selection.nan_policy,
        None,
    ));
    let title = trend_title(&selection.trend_column, selection.granularity);
    panels.push(trend_panel(
        dataset,
        &selection.trend_column,
        selection.granularity,
        config.strict_dates,
        &title,
    ));
    Ok(DashboardReport {
        kind: DatasetKind::Contacts,
        dataset_name: dataset.name().to_string(),
        panels,
    })
}
fn trend_title(column: &str, granularity: Granularity) -> String {
    let action = match column {
        "Created Time" => "contact creation",
        "Modified Time" => "contact updates",
        _ => "changes",
    };
    format!("{} trend of {action}", super::trend_title_prefix(granularity))
}
