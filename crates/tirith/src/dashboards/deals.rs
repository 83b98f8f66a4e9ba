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
    DealsSelection, DealsTab, LevelSort, Panel, PanelContent,
};
use crate::catalog::{ColumnRole, DatasetPolicy};
use crate::chart_spec::{
    self, BubbleSeries, ChartKind, ChartSpec, ChartStyle, DualAxisSeries, FunnelValue, Trace,
};
use crate::correlation::{correlate, CorrelationRequest, DealScope};
use crate::dataset::{CrmDataset, DatasetKind};
use crate::descriptive::{describe, numeric_summaries, DescribeRequest};
use crate::duration::closing_durations;
use crate::error::{utils, AggregationError, AnalyticsError, Result};
use crate::funnel::{
    aggregate, cross_tab, payment_breakdown, report_means, source_quality, success_mask,
    FunnelMeans, FunnelReport, FunnelRequest, FunnelSort,
};
use itertools::Itertools;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;
const CAMPAIGN_COLUMN: &str = "Campaign";
const STAGE_COLUMN: &str = "Stage";
const OWNER_COLUMN: &str = "Deal Owner Name";
const SOURCE_COLUMN: &str = "Source";
const QUALITY_COLUMN: &str = "Quality";
const PRODUCT_COLUMN: &str = "Product";
const EDUCATION_COLUMN: &str = "Education Type";
const CALLS_TIMESTAMP_COLUMN: &str = "Call Start Time";
pub fn build(
    dataset: &CrmDataset,
    selection: &DealsSelection,
    policy: &DatasetPolicy,
    config: &DashboardConfig,
    companion_calls: Option<&CrmDataset>,
    map_markup: Option<String>,
) -> Result<DashboardReport> {
    debug!(dataset = %dataset.name(), tabs = selection.tabs.len(), "building deals dashboard");
    let success_column = policy.role(ColumnRole::Success)?;
    let mut panels = Vec::new();
    for tab in &selection.tabs {
        match tab {
            DealsTab::Overview => overview_panels(dataset, selection, policy, config, &mut panels),
            DealsTab::Correlation => {
                correlation_panels(dataset, policy, companion_calls, &mut panels)
            }
            DealsTab::Durations => duration_panels(dataset, policy, &mut panels),
            DealsTab::Campaigns => campaign_panels(dataset, success_column, config, &mut panels),
            DealsTab::Sources => source_panels(dataset, success_column, &mut panels),
            DealsTab::Owners => owner_panels(dataset, policy, success_column, &mut panels),
            DealsTab::Payments => payment_panels(dataset, policy, &mut panels),
            DealsTab::Products => product_panels(dataset, success_column, config, &mut panels),
            DealsTab::Geography => geography_panels(
                dataset,
                selection,
                policy,
                config,
                success_column,
                map_markup.as_deref(),
                &mut panels,
            ),
            DealsTab::Languages => {
                language_panels(dataset, selection, policy, config, success_column, &mut panels)
            }
        }
    }
    Ok(DashboardReport {
        kind: DatasetKind::Deals,
        dataset_name: dataset.name().to_string(),
        panels,
    })
}
fn overview_panels(
    dataset: &CrmDataset,
    selection: &DealsSelection,
    policy: &DatasetPolicy,
    config: &DashboardConfig,
    panels: &mut Vec<Panel>,
) {
    let targets = policy.describe_targets(&dataset.column_names());
    panels.push(panel(
        "Dataset overview",
        describe(dataset, &DescribeRequest::for_columns(targets)).map(PanelContent::Summary),
    ));
    panels.push(panel(
        "Deal metrics",
        numeric_summaries(dataset, &policy.numeric_columns).map(PanelContent::Numeric),
    ));
    panels.push(category_panel(
        dataset,
        &selection.category_column,
        selection.chart,
        selection.nan_policy,
        Some(config.top_n_categories),
    ));
    let title = format!(
        "{} trend of {}",
        trend_title_prefix(selection.granularity),
        selection.scope.as_str()
    );
    match scoped_dataset(dataset, selection.scope, policy) {
        Ok(scoped) => panels.push(trend_panel(
            &scoped,
            &selection.trend_column,
            selection.granularity,
            config.strict_dates,
            &title,
        )),
        Err(error) => panels.push(panel(title, Err(error))),
    }
}
fn scoped_dataset(
    dataset: &CrmDataset,
    scope: DealScope,
    policy: &DatasetPolicy,
) -> Result<CrmDataset> {
    match scope {
        DealScope::All => Ok(dataset.clone()),
        DealScope::SuccessfulOnly => {
            let mask = success_mask(dataset, policy.role(ColumnRole::Success)?)?;
            Ok(dataset.filter_rows(&mask)?)
        }
    }
}
fn correlation_panels(
    dataset: &CrmDataset,
    policy: &DatasetPolicy,
    companion_calls: Option<&CrmDataset>,
    panels: &mut Vec<Panel>,
) {
    let Some(calls) = companion_calls else {
        panels.push(Panel {
            title: "Calls correlation".to_string(),
            content: PanelContent::Notice(
                "Cleaned calls export not found; correlation is unavailable.".to_string(),
            ),
        });
        return;
    };
    for scope in [DealScope::All, DealScope::SuccessfulOnly] {
        let title = format!("Deals vs calls by month ({})", scope.as_str());
        let content: Result<PanelContent> = (|| {
            let created_column = policy.role(ColumnRole::Created)?;
            let mut request = CorrelationRequest::new(created_column, CALLS_TIMESTAMP_COLUMN);
            request.scope = scope;
            if scope == DealScope::SuccessfulOnly {
                request.success_column = Some(policy.role(ColumnRole::Success)?.to_string());
            }
            let result = correlate(dataset, calls, &request)?;
            if result.len() < 2 {
                let error = AnalyticsError::from(AggregationError::InsufficientOverlap {
                    months: result.len(),
                });
                return Ok(PanelContent::Notice(error.user_message()));
            }
            Ok(PanelContent::Correlation(result))
        })();
        panels.push(panel(title, content));
    }
}
fn duration_panels(dataset: &CrmDataset, policy: &DatasetPolicy, panels: &mut Vec<Panel>) {
    let title = "Time to close";
    let content: Result<PanelContent> = (|| {
        let stats = closing_durations(dataset, policy)?;
        if stats.is_empty() {
            return Err(utils::empty_result("closing duration"));
        }
        let mut spec = chart_spec::histogram_overlay(
            title,
            &stats.successful_days,
            &stats.lost_days,
            ("Successful", "Lost"),
            &ChartStyle::for_overlays(),
        )?;
        spec.options
            .insert("annotation".to_string(), Value::String(stats.summary()));
        Ok(PanelContent::Chart(spec))
    })();
    panels.push(panel(title, content));
}
fn campaign_panels(
    dataset: &CrmDataset,
    success_column: &str,
    config: &DashboardConfig,
    panels: &mut Vec<Panel>,
) {
    let result: Result<(FunnelReport, FunnelMeans)> = (|| {
        let mut request = FunnelRequest::new(CAMPAIGN_COLUMN, success_column);
        request.required_columns = vec![STAGE_COLUMN.to_string()];
        let report = aggregate(dataset, &request)?;
        let means = report_means(&report);
        Ok((report, means))
    })();
    match result {
        Ok((report, means)) => {
            panels.push(Panel {
                title: "Campaign performance".to_string(),
                content: PanelContent::Funnel(report.clone()),
            });
            panels.push(Panel {
                title: "Campaign averages".to_string(),
                content: PanelContent::Markup(format!(
                    "Average leads per campaign: {:.2}\n\
                     Average successful deals: {:.2}\n\
                     Average conversion rate: {:.2}%",
                    means.mean_total, means.mean_successful, means.mean_conversion
                )),
            });
            let filtered = report.filter_min_conversion(config.min_campaign_conversion);
            let chart_title = format!(
                "Campaigns above {:.0}% conversion",
                config.min_campaign_conversion
            );
            let chart = chart_spec::funnel_bar(
                &chart_title,
                &filtered,
                FunnelValue::Conversion,
                &ChartStyle::for_category_bars(),
            );
            panels.push(panel(
                chart_title,
                chart.map(PanelContent::Chart).map_err(AnalyticsError::from),
            ));
        }
        Err(error) => panels.push(panel("Campaign performance", Err(error))),
    }
}
fn source_panels(dataset: &CrmDataset, success_column: &str, panels: &mut Vec<Panel>) {
    let content = source_quality(dataset, SOURCE_COLUMN, QUALITY_COLUMN, success_column)
        .map(|report| PanelContent::Markup(report.table()));
    panels.push(panel("Source quality", content));
}
fn owner_panels(
    dataset: &CrmDataset,
    policy: &DatasetPolicy,
    success_column: &str,
    panels: &mut Vec<Panel>,
) {
    for (column, label) in [(OWNER_COLUMN, "Owner"), (CAMPAIGN_COLUMN, "Campaign")] {
        let result: Result<(FunnelReport, FunnelMeans)> = (|| {
            let mut request = FunnelRequest::new(column, success_column);
            request.monetary_column = Some(policy.role(ColumnRole::Monetary)?.to_string());
            request.sort = FunnelSort::MonetaryDesc;
            let report = aggregate(dataset, &request)?;
            let means = report_means(&report);
            Ok((report, means))
        })();
        match result {
            Ok((report, means)) => {
                let active = report.filter_min_successful(1);
                panels.push(Panel {
                    title: format!("{label} sales"),
                    content: PanelContent::Funnel(report),
                });
                panels.push(Panel {
                    title: format!("{label} averages"),
                    content: PanelContent::Markup(format!(
                        "Average deals: {:.2}\nAverage conversion rate: {:.2}%",
                        means.mean_total, means.mean_conversion
                    )),
                });
                let chart_title = format!("{label} total sales");
                let chart = chart_spec::funnel_bar(
                    &chart_title,
                    &active,
                    FunnelValue::Monetary,
                    &ChartStyle::for_category_bars(),
                );
                panels.push(panel(
                    chart_title,
                    chart.map(PanelContent::Chart).map_err(AnalyticsError::from),
                ));
            }
            Err(error) => panels.push(panel(format!("{label} sales"), Err(error))),
        }
    }
}
fn payment_panels(dataset: &CrmDataset, policy: &DatasetPolicy, panels: &mut Vec<Panel>) {
    match payment_breakdown(dataset, policy) {
        Ok(report) => {
            panels.push(Panel {
                title: "Payment type breakdown".to_string(),
                content: PanelContent::Markup(report.table()),
            });
            let content: Result<PanelContent> = (|| {
                let labels: Vec<String> =
                    report.rows.iter().map(|r| r.payment_type.clone()).collect();
                let values: Vec<f64> = report.rows.iter().map(|r| r.conversion_rate).collect();
                let text: Vec<String> = values.iter().map(|v| format!("{v:.2}%")).collect();
                let mut spec = ChartSpec::new("Conversion by payment type", ChartKind::Bar);
                spec.traces
                    .push(Trace::new("Conversion %", labels, values).with_text(text));
                spec.y_title = Some("Conversion %".to_string());
                spec.validate().map_err(AnalyticsError::from)?;
                Ok(PanelContent::Chart(spec))
            })();
            panels.push(panel("Conversion by payment type", content));
        }
        Err(error) => panels.push(panel("Payment type breakdown", Err(error))),
    }
}
fn product_panels(
    dataset: &CrmDataset,
    success_column: &str,
    config: &DashboardConfig,
    panels: &mut Vec<Panel>,
) {
    let mut product_request = FunnelRequest::new(PRODUCT_COLUMN, success_column);
    product_request.sort = FunnelSort::TotalDesc;
    match aggregate(dataset, &product_request) {
        Ok(report) => {
            panels.push(Panel {
                title: "Product performance".to_string(),
                content: PanelContent::Funnel(report.clone()),
            });
            let chart = chart_spec::funnel_bar(
                "Conversion by product",
                &report,
                FunnelValue::Conversion,
                &ChartStyle::for_category_bars(),
            );
            panels.push(panel(
                "Conversion by product",
                chart.map(PanelContent::Chart).map_err(AnalyticsError::from),
            ));
        }
        Err(error) => panels.push(panel("Product performance", Err(error))),
    }
    let mut education_request = FunnelRequest::new(EDUCATION_COLUMN, success_column);
    education_request.sort = FunnelSort::TotalDesc;
    match aggregate(dataset, &education_request) {
        Ok(report) => {
            panels.push(Panel {
                title: "Education type performance".to_string(),
                content: PanelContent::Funnel(report.clone()),
            });
            let chart = chart_spec::funnel_bar(
                "Deals by education type",
                &report.top(config.top_n_categories),
                FunnelValue::Totals,
                &ChartStyle::for_category_bars(),
            );
            panels.push(panel(
                "Deals by education type",
                chart.map(PanelContent::Chart).map_err(AnalyticsError::from),
            ));
        }
        Err(error) => panels.push(panel("Education type performance", Err(error))),
    }
    match cross_tab(dataset, PRODUCT_COLUMN, EDUCATION_COLUMN, success_column) {
        Ok(matrix) => {
            panels.push(Panel {
                title: "Product x education conversion".to_string(),
                content: PanelContent::CrossTab(matrix.clone()),
            });
            let chart = chart_spec::heatmap(
                "Product x education conversion",
                &matrix,
                &ChartStyle::for_category_bars(),
            );
            panels.push(panel(
                "Product x education heatmap",
                chart.map(PanelContent::Chart).map_err(AnalyticsError::from),
            ));
        }
        Err(error) => panels.push(panel("Product x education conversion", Err(error))),
    }
}
fn geography_panels(
    dataset: &CrmDataset,
    selection: &DealsSelection,
    policy: &DatasetPolicy,
    config: &DashboardConfig,
    success_column: &str,
    map_markup: Option<&str>,
    panels: &mut Vec<Panel>,
) {
    let city_result: Result<FunnelReport> = (|| {
        let city_column = policy.role(ColumnRole::City)?;
        let mut request = FunnelRequest::new(city_column, success_column);
        request.sort = FunnelSort::TotalDesc;
        request.top_n = Some(config.top_n_categories);
        aggregate(dataset, &request)
    })();
    match city_result {
        Ok(report) => {
            let chart = chart_spec::dual_axis(
                "Top cities by deals",
                &dual_axis_series(&report),
                "Deals",
                "Conversion %",
                &ChartStyle::for_category_bars(),
            );
            panels.push(panel(
                "Top cities by deals",
                chart.map(PanelContent::Chart).map_err(AnalyticsError::from),
            ));
            panels.push(Panel {
                title: "City performance".to_string(),
                content: PanelContent::Funnel(report),
            });
        }
        Err(error) => panels.push(panel("Top cities by deals", Err(error))),
    }
    let excluded = if selection.exclude_default_country {
        config.default_excluded_country.clone()
    } else {
        None
    };
    let country_title = match &excluded {
        Some(name) => format!("Deals by country (excluding {name})"),
        None => "Deals by country".to_string(),
    };
    let country_result: Result<FunnelReport> = (|| {
        let country_column = policy.role(ColumnRole::Country)?;
        let base = match &excluded {
            Some(name) => {
                let values = dataset.string_values(country_column)?;
                let mask: Vec<bool> = values
                    .iter()
                    .map(|v| v.as_deref() != Some(name.as_str()))
                    .collect();
                dataset.filter_rows(&mask)?
            }
            None => dataset.clone(),
        };
        let mut request = FunnelRequest::new(country_column, success_column);
        request.sort = FunnelSort::TotalDesc;
        aggregate(&base, &request)
    })();
    match country_result {
        Ok(report) => {
            let chart = chart_spec::dual_axis(
                &country_title,
                &dual_axis_series(&report),
                "Deals",
                "Conversion %",
                &ChartStyle::for_category_bars(),
            );
            panels.push(panel(
                country_title.clone(),
                chart.map(PanelContent::Chart).map_err(AnalyticsError::from),
            ));
            panels.push(Panel {
                title: "Country performance".to_string(),
                content: PanelContent::Funnel(report),
            });
        }
        Err(error) => panels.push(panel(country_title.clone(), Err(error))),
    }
    match map_markup {
        Some(html) => panels.push(Panel {
            title: "Deals map".to_string(),
            content: PanelContent::Markup(html.to_string()),
        }),
        None => panels.push(Panel {
            title: "Deals map".to_string(),
            content: PanelContent::Notice("Pre-rendered map file not found.".to_string()),
        }),
    }
}
fn dual_axis_series(report: &FunnelReport) -> DualAxisSeries {
    DualAxisSeries {
        categories: report.groups(),
        bar_name: "Deals".to_string(),
        bar_values: report.totals().iter().map(|&v| v as f64).collect(),
        line_name: "Conversion %".to_string(),
        line_values: report.conversions(),
        bar_text: Some(report.totals().iter().map(|v| v.to_string()).collect()),
        line_text: Some(
            report
                .conversions()
                .iter()
                .map(|v| format!("{v:.2}%"))
                .collect(),
        ),
    }
}
fn language_panels(
    dataset: &CrmDataset,
    selection: &DealsSelection,
    policy: &DatasetPolicy,
    config: &DashboardConfig,
    success_column: &str,
    panels: &mut Vec<Panel>,
) {
    let result: Result<FunnelReport> = (|| {
        let language_column = policy.role(ColumnRole::Language)?;
        let mut request = FunnelRequest::new(language_column, success_column);
        request.sort = match selection.level_sort {
            LevelSort::TotalDeals => FunnelSort::TotalDesc,
            LevelSort::SuccessRate => FunnelSort::ConversionDesc,
        };
        aggregate(dataset, &request)
    })();
    match result {
        Ok(report) => {
            let series = DualAxisSeries {
                categories: report.groups(),
                bar_name: "Successful deals".to_string(),
                bar_values: report.successes().iter().map(|&v| v as f64).collect(),
                line_name: "Deals".to_string(),
                line_values: report.totals().iter().map(|&v| v as f64).collect(),
                bar_text: Some(report.successes().iter().map(|v| v.to_string()).collect()),
                line_text: Some(report.totals().iter().map(|v| v.to_string()).collect()),
            };
            let chart = chart_spec::dual_axis(
                "Language level performance",
                &series,
                "Successful deals",
                "Deals",
                &ChartStyle::for_category_bars(),
            );
            panels.push(panel(
                "Language level performance",
                chart.map(PanelContent::Chart).map_err(AnalyticsError::from),
            ));
            panels.push(Panel {
                title: "Language levels".to_string(),
                content: PanelContent::Funnel(report),
            });
        }
        Err(error) => panels.push(panel("Language level performance", Err(error))),
    }
    let scatter_title = "Successful deals by city and language level";
    let content: Result<PanelContent> = (|| {
        let language_column = policy.role(ColumnRole::Language)?;
        let city_column = policy.role(ColumnRole::City)?;
        let levels = dataset.string_values(language_column)?;
        let cities = dataset.string_values(city_column)?;
        let success = success_mask(dataset, success_column)?;
        let mut combos: HashMap<(String, String), (usize, usize)> = HashMap::new();
        for index in 0..dataset.height() {
            let (Some(level), Some(city)) = (levels[index].as_ref(), cities[index].as_ref())
            else {
                continue;
            };
            let entry = combos.entry((level.clone(), city.clone())).or_insert((0, 0));
            entry.0 += 1;
            if success[index] {
                entry.1 += 1;
            }
        }
        if combos.is_empty() {
            return Err(utils::empty_result(language_column));
        }
        let mut per_level: HashMap<String, Vec<(String, usize, usize)>> = HashMap::new();
        for ((level, city), (total, successful)) in combos {
            per_level
                .entry(level)
                .or_default()
                .push((city, total, successful));
        }
        let series: Vec<BubbleSeries> = per_level
            .into_iter()
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .map(|(level, mut rows)| {
                rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                rows.truncate(config.top_n_categories);
                BubbleSeries {
                    name: level,
                    xs: rows.iter().map(|r| r.2 as f64).collect(),
                    labels: rows.iter().map(|r| r.0.clone()).collect(),
                    sizes: rows.iter().map(|r| r.1 as f64).collect(),
                }
            })
            .collect();
        let spec = chart_spec::scatter(scatter_title, &series, &ChartStyle::for_overlays())?;
        Ok(PanelContent::Chart(spec))
    })();
    panels.push(panel(scatter_title, content));
}
