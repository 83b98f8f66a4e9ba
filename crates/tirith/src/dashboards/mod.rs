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

pub mod calls;
pub mod contacts;
pub mod deals;
pub mod spend;
use crate::catalog::DatasetCatalog;
use crate::category::{count_categories, CategoryRequest, NanPolicy};
use crate::chart_spec::{self, ChartSpec, ChartStyle, Orientation};
use crate::correlation::{CorrelationResult, DealScope};
use crate::dataset::{CrmDataset, DatasetKind};
use crate::descriptive::{ColumnSummary, NumericSummary};
use crate::error::{ConfigError, ConfigResult, Result};
use crate::funnel::{CrossTabMatrix, FunnelReport};
use crate::session::DashboardSession;
use crate::time_series::{bucket_counts, Granularity, TrendRequest};
use serde::{Deserialize, Serialize};
use tracing::warn;
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub top_n_categories: usize,
    pub min_campaign_conversion: f64,
    pub default_excluded_country: Option<String>,
    pub strict_dates: bool,
}
impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_n_categories: 10,
            min_campaign_conversion: 2.0,
            default_excluded_country: Some("Germany".to_string()),
            strict_dates: true,
        }
    }
}
impl DashboardConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.top_n_categories == 0 {
            return Err(ConfigError::InvalidDashboardConfig {
                field: "top_n_categories".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&self.min_campaign_conversion) {
            return Err(ConfigError::InvalidDashboardConfig {
                field: "min_campaign_conversion".to_string(),
            });
        }
        Ok(())
    }
    pub fn for_quick_look() -> Self {
        Self {
            top_n_categories: 5,
            strict_dates: false,
            ..Default::default()
        }
    }
    pub fn for_full_report() -> Self {
        Self {
            top_n_categories: 20,
            min_campaign_conversion: 0.0,
            ..Default::default()
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub title: String,
    pub content: PanelContent,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PanelContent {
    Chart(ChartSpec),
    Summary(Vec<ColumnSummary>),
    Numeric(Vec<NumericSummary>),
    Funnel(FunnelReport),
    CrossTab(CrossTabMatrix),
    Correlation(CorrelationResult),
    /// Preformatted text or embedded markup, shown verbatim.
    Markup(String),
    Notice(String),
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub kind: DatasetKind,
    pub dataset_name: String,
    pub panels: Vec<Panel>,
}
impl DashboardReport {
    pub fn len(&self) -> usize {
        self.panels.len()
    }
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
    pub fn chart_count(&self) -> usize {
        self.panels
            .iter()
            .filter(|p| matches!(p.content, PanelContent::Chart(_)))
            .count()
    }
    pub fn notice_count(&self) -> usize {
        self.panels
            .iter()
            .filter(|p| matches!(p.content, PanelContent::Notice(_)))
            .count()
    }
    pub fn summary(&self) -> String {
        format!(
            "Dashboard Summary:\n\
             - Dataset: {} ({})\n\
             - Panels: {}\n\
             - Charts: {}\n\
             - Notices: {}",
            self.dataset_name,
            self.kind,
            self.panels.len(),
            self.chart_count(),
            self.notice_count()
        )
    }
}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryChartKind {
    #[default]
    Bar,
    HorizontalBar,
    Pie,
}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelSort {
    #[default]
    TotalDeals,
    SuccessRate,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealsTab {
    Overview,
    Correlation,
    Durations,
    Campaigns,
    Sources,
    Owners,
    Payments,
    Products,
    Geography,
    Languages,
}
impl DealsTab {
    pub fn all() -> Vec<DealsTab> {
        vec![
            DealsTab::Overview,
            DealsTab::Correlation,
            DealsTab::Durations,
            DealsTab::Campaigns,
            DealsTab::Sources,
            DealsTab::Owners,
            DealsTab::Payments,
            DealsTab::Products,
            DealsTab::Geography,
            DealsTab::Languages,
        ]
    }
}
#[derive(Debug, Clone, PartialEq)]
pub struct ContactsSelection {
    pub category_column: String,
    pub chart: CategoryChartKind,
    pub nan_policy: NanPolicy,
    pub trend_column: String,
    pub granularity: Granularity,
}
impl Default for ContactsSelection {
    fn default() -> Self {
        Self {
            category_column: "Contact Owner Name".to_string(),
            chart: CategoryChartKind::default(),
            nan_policy: NanPolicy::default(),
            trend_column: "Created Time".to_string(),
            granularity: Granularity::default(),
        }
    }
}
#[derive(Debug, Clone, PartialEq)]
pub struct CallsSelection {
    pub category_column: String,
    pub chart: CategoryChartKind,
    pub nan_policy: NanPolicy,
    pub trend_column: String,
    pub granularity: Granularity,
}
impl Default for CallsSelection {
    fn default() -> Self {
        Self {
            category_column: "Call Type".to_string(),
            chart: CategoryChartKind::default(),
            nan_policy: NanPolicy::default(),
            trend_column: "Call Start Time".to_string(),
            granularity: Granularity::default(),
        }
    }
}
#[derive(Debug, Clone, PartialEq)]
pub struct SpendSelection {
    pub category_column: String,
    pub chart: CategoryChartKind,
    pub nan_policy: NanPolicy,
    pub trend_column: String,
    pub granularity: Granularity,
}
impl Default for SpendSelection {
    fn default() -> Self {
        Self {
            category_column: "Campaign Name".to_string(),
            chart: CategoryChartKind::default(),
            nan_policy: NanPolicy::default(),
            trend_column: "Date".to_string(),
            granularity: Granularity::default(),
        }
    }
}
#[derive(Debug, Clone, PartialEq)]
pub struct DealsSelection {
    pub category_column: String,
    pub chart: CategoryChartKind,
    pub nan_policy: NanPolicy,
    pub trend_column: String,
    pub granularity: Granularity,
    pub scope: DealScope,
    pub exclude_default_country: bool,
    pub level_sort: LevelSort,
    pub tabs: Vec<DealsTab>,
}
impl Default for DealsSelection {
    fn default() -> Self {
        Self {
            category_column: "Stage".to_string(),
            chart: CategoryChartKind::default(),
            nan_policy: NanPolicy::default(),
            trend_column: "Created Time".to_string(),
            granularity: Granularity::default(),
            scope: DealScope::default(),
            exclude_default_country: false,
            level_sort: LevelSort::default(),
            tabs: DealsTab::all(),
        }
    }
}
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSelections {
    pub contacts: ContactsSelection,
    pub calls: CallsSelection,
    pub spend: SpendSelection,
    pub deals: DealsSelection,
}
pub fn build_dashboard(
    session: &DashboardSession,
    kind: DatasetKind,
    selections: &DashboardSelections,
    catalog: &DatasetCatalog,
    config: &DashboardConfig,
) -> Result<DashboardReport> {
    config.validate()?;
    let dataset = session.dataset(kind)?;
    let policy = catalog.policy(kind);
    match kind {
        DatasetKind::Contacts => contacts::build(&dataset, &selections.contacts, policy, config),
        DatasetKind::Calls => calls::build(&dataset, &selections.calls, policy, config),
        DatasetKind::Spend => spend::build(&dataset, &selections.spend, policy, config),
        DatasetKind::Deals => {
            let companion = session.companion_calls();
            let markup = session.map_markup();
            deals::build(
                &dataset,
                &selections.deals,
                policy,
                config,
                companion.as_ref(),
                markup,
            )
        }
    }
}
pub(crate) fn trend_title_prefix(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Day => "Daily",
        Granularity::Week => "Weekly",
        Granularity::Month => "Monthly",
    }
}
/// Panel-level failures degrade to notices so one bad selection cannot
/// take down the rest of the dashboard.
pub(crate) fn panel(title: impl Into<String>, result: Result<PanelContent>) -> Panel {
    let title = title.into();
    match result {
        Ok(content) => Panel { title, content },
        Err(error) => {
            warn!(panel = %title, %error, "panel downgraded to notice");
            Panel {
                title,
                content: PanelContent::Notice(error.user_message()),
            }
        }
    }
}
pub(crate) fn category_panel(
    dataset: &CrmDataset,
    column: &str,
    chart: CategoryChartKind,
    nan_policy: NanPolicy,
    top_n: Option<usize>,
) -> Panel {
    let title = format!("{column} distribution");
    let content: Result<PanelContent> = (|| {
        let mut request = CategoryRequest::new(column);
        request.nan_policy = nan_policy;
        request.top_n = top_n;
        let counts = count_categories(dataset, &request)?;
        let style = ChartStyle::for_category_bars();
        let spec = match chart {
            CategoryChartKind::Bar => {
                chart_spec::category_bar(&title, &counts, Orientation::Vertical, &style)?
            }
            CategoryChartKind::HorizontalBar => {
                chart_spec::category_bar(&title, &counts, Orientation::Horizontal, &style)?
            }
            CategoryChartKind::Pie => chart_spec::category_pie(&title, &counts, &style)?,
        };
        Ok(PanelContent::Chart(spec))
    })();
    panel(title, content)
}
pub(crate) fn trend_panel(
    dataset: &CrmDataset,
    column: &str,
    granularity: Granularity,
    strict: bool,
    title: &str,
) -> Panel {
    let content: Result<PanelContent> = (|| {
        let mut request = TrendRequest::new(column, granularity);
        if !strict {
            request = request.lenient();
        }
        let series = bucket_counts(dataset, &request)?;
        let spec = chart_spec::trend_line(title, &series, &ChartStyle::for_trends())?;
        Ok(PanelContent::Chart(spec))
    })();
    panel(title, content)
}
