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

use crate::category::CategoryCounts;
use crate::error::{ChartError, ChartResult, ConfigError, ConfigResult};
use crate::funnel::{CrossTabMatrix, FunnelReport};
use crate::time_series::{Granularity, TrendSeries};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Pie,
    Line,
    Histogram,
    Heatmap,
    Scatter,
}
impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::HorizontalBar => "horizontal_bar",
            ChartKind::Pie => "pie",
            ChartKind::Line => "line",
            ChartKind::Histogram => "histogram",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Scatter => "scatter",
        }
    }
}
impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuePosition {
    #[default]
    Outside,
    Inside,
    Auto,
}
impl ValuePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValuePosition::Outside => "outside",
            ValuePosition::Inside => "inside",
            ValuePosition::Auto => "auto",
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    pub color: String,
    pub secondary_color: String,
    pub orientation: Orientation,
    pub show_values: bool,
    pub value_position: ValuePosition,
    pub tick_angle: f64,
    pub show_markers: bool,
    pub opacity: f64,
}
impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            color: "skyblue".to_string(),
            secondary_color: "royalblue".to_string(),
            orientation: Orientation::Vertical,
            show_values: true,
            value_position: ValuePosition::Outside,
            tick_angle: 0.0,
            show_markers: false,
            opacity: 1.0,
        }
    }
}
impl ChartStyle {
    pub fn validate(&self) -> ConfigResult<()> {
        if !(-90.0..=90.0).contains(&self.tick_angle) {
            return Err(ConfigError::InvalidChartStyle {
                field: "tick_angle".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.opacity) || self.opacity == 0.0 {
            return Err(ConfigError::InvalidChartStyle {
                field: "opacity".to_string(),
            });
        }
        Ok(())
    }
    pub fn for_category_bars() -> Self {
        Self {
            show_values: true,
            value_position: ValuePosition::Outside,
            ..Default::default()
        }
    }
    pub fn for_trends() -> Self {
        Self {
            color: "royalblue".to_string(),
            show_markers: true,
            show_values: true,
            ..Default::default()
        }
    }
    pub fn for_overlays() -> Self {
        Self {
            color: "mediumseagreen".to_string(),
            secondary_color: "indianred".to_string(),
            opacity: 0.6,
            show_values: false,
            ..Default::default()
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValues {
    Labels(Vec<String>),
    Numbers(Vec<f64>),
}
impl AxisValues {
    pub fn len(&self) -> usize {
        match self {
            AxisValues::Labels(values) => values.len(),
            AxisValues::Numbers(values) => values.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
impl From<Vec<String>> for AxisValues {
    fn from(values: Vec<String>) -> Self {
        AxisValues::Labels(values)
    }
}
impl From<Vec<f64>> for AxisValues {
    fn from(values: Vec<f64>) -> Self {
        AxisValues::Numbers(values)
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub name: String,
    pub x: AxisValues,
    pub y: AxisValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<Vec<Vec<Option<f64>>>>,
}
impl Trace {
    pub fn new(name: impl Into<String>, x: impl Into<AxisValues>, y: impl Into<AxisValues>) -> Self {
        Self {
            name: name.into(),
            x: x.into(),
            y: y.into(),
            text: None,
            size: None,
            z: None,
        }
    }
    pub fn with_text(mut self, text: Vec<String>) -> Self {
        self.text = Some(text);
        self
    }
    pub fn with_size(mut self, size: Vec<f64>) -> Self {
        self.size = Some(size);
        self
    }
    pub fn with_matrix(mut self, z: Vec<Vec<Option<f64>>>) -> Self {
        self.z = Some(z);
        self
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub traces: Vec<Trace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_y_title: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, Value>,
}
impl ChartSpec {
    pub fn new(title: impl Into<String>, kind: ChartKind) -> Self {
        Self {
            title: title.into(),
            kind,
            traces: Vec::new(),
            x_title: None,
            y_title: None,
            secondary_y_title: None,
            options: HashMap::new(),
        }
    }
    pub fn validate(&self) -> ChartResult<()> {
        if self.traces.is_empty() {
            return Err(ChartError::EmptyTraces {
                title: self.title.clone(),
            });
        }
        if self.kind == ChartKind::Histogram {
            return Ok(());
        }
        for trace in &self.traces {
            // Heatmap axes carry independent row and column labels.
            if trace.z.is_none() && trace.x.len() != trace.y.len() {
                return Err(ChartError::AxisLengthMismatch {
                    x: trace.x.len(),
                    y: trace.y.len(),
                });
            }
        }
        Ok(())
    }
    pub fn to_json(&self) -> ChartResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
    fn option(mut self, key: &str, value: Value) -> Self {
        self.options.insert(key.to_string(), value);
        self
    }
}
pub fn category_bar(
    title: &str,
    counts: &CategoryCounts,
    orientation: Orientation,
    style: &ChartStyle,
) -> ChartResult<ChartSpec> {
    let labels = counts.labels();
    let values: Vec<f64> = counts.counts().iter().map(|&c| c as f64).collect();
    let text: Vec<String> = counts.counts().iter().map(|c| c.to_string()).collect();
    let mut trace = match orientation {
        Orientation::Vertical => Trace::new(counts.column.clone(), labels, values),
        Orientation::Horizontal => Trace::new(counts.column.clone(), values, labels),
    };
    if style.show_values {
        trace = trace.with_text(text);
    }
    let kind = match orientation {
        Orientation::Vertical => ChartKind::Bar,
        Orientation::Horizontal => ChartKind::HorizontalBar,
    };
    let mut spec = ChartSpec::new(title, kind);
    spec.traces.push(trace);
    spec.x_title = Some(match orientation {
        Orientation::Vertical => counts.column.clone(),
        Orientation::Horizontal => "Count".to_string(),
    });
    spec.y_title = Some(match orientation {
        Orientation::Vertical => "Count".to_string(),
        Orientation::Horizontal => counts.column.clone(),
    });
    spec = spec.option("color", Value::String(style.color.clone()));
    if style.show_values {
        spec = spec.option(
            "text_position",
            Value::String(style.value_position.as_str().to_string()),
        );
    }
    if orientation == Orientation::Horizontal {
        // Largest category on top, matching reversed category axes.
        spec = spec.option("y_axis_reversed", Value::Bool(true));
    }
    spec.validate()?;
    Ok(spec)
}
pub fn category_pie(title: &str, counts: &CategoryCounts, style: &ChartStyle) -> ChartResult<ChartSpec> {
    let values: Vec<f64> = counts.counts().iter().map(|&c| c as f64).collect();
    let mut spec = ChartSpec::new(title, ChartKind::Pie);
    spec.traces
        .push(Trace::new(counts.column.clone(), counts.labels(), values));
    spec = spec.option("hole", Value::from(0.0));
    spec = spec.option("color", Value::String(style.color.clone()));
    spec.validate()?;
    Ok(spec)
}
pub fn trend_line(title: &str, series: &TrendSeries, style: &ChartStyle) -> ChartResult<ChartSpec> {
    let counts: Vec<f64> = series.counts().iter().map(|&c| c as f64).collect();
    let mut trace = Trace::new(series.column.clone(), series.labels(), counts.clone());
    let mut spec = ChartSpec::new(title, ChartKind::Line);
    spec.x_title = Some("Period".to_string());
    spec.y_title = Some("Count".to_string());
    spec = spec.option("color", Value::String(style.color.clone()));
    match series.granularity {
        Granularity::Month => {
            if style.show_values {
                trace = trace.with_text(counts.iter().map(|c| format!("{c:.0}")).collect());
            }
            spec = spec.option("markers", Value::Bool(true));
        }
        Granularity::Week => {
            spec = spec.option("tick_angle", Value::from(45.0));
        }
        Granularity::Day => {}
    }
    if style.show_markers {
        spec = spec.option("markers", Value::Bool(true));
    }
    spec.traces.push(trace);
    spec.validate()?;
    Ok(spec)
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunnelValue {
    Totals,
    Conversion,
    Monetary,
}
impl FunnelValue {
    pub fn axis_title(&self) -> &'static str {
        match self {
            FunnelValue::Totals => "Deals",
            FunnelValue::Conversion => "Conversion %",
            FunnelValue::Monetary => "Total Sales",
        }
    }
}
pub fn funnel_bar(
    title: &str,
    report: &FunnelReport,
    value: FunnelValue,
    style: &ChartStyle,
) -> ChartResult<ChartSpec> {
    let values: Vec<f64> = match value {
        FunnelValue::Totals => report.totals().iter().map(|&v| v as f64).collect(),
        FunnelValue::Conversion => report.conversions(),
        FunnelValue::Monetary => report.monetary_totals(),
    };
    let text: Vec<String> = match value {
        FunnelValue::Totals => report.totals().iter().map(|v| v.to_string()).collect(),
        FunnelValue::Conversion => values.iter().map(|v| format!("{v:.2}%")).collect(),
        FunnelValue::Monetary => values.iter().map(|v| format!("{v:.2}")).collect(),
    };
    let mut trace = Trace::new(report.group_by.clone(), report.groups(), values);
    if style.show_values {
        trace = trace.with_text(text);
    }
    let mut spec = ChartSpec::new(title, ChartKind::Bar);
    spec.traces.push(trace);
    spec.x_title = Some(report.group_by.clone());
    spec.y_title = Some(value.axis_title().to_string());
    spec = spec.option("color", Value::String(style.color.clone()));
    if style.tick_angle != 0.0 {
        spec = spec.option("tick_angle", Value::from(style.tick_angle));
    }
    spec.validate()?;
    Ok(spec)
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualAxisSeries {
    pub categories: Vec<String>,
    pub bar_name: String,
    pub bar_values: Vec<f64>,
    pub line_name: String,
    pub line_values: Vec<f64>,
    pub bar_text: Option<Vec<String>>,
    pub line_text: Option<Vec<String>>,
}
/// Bar series on the primary axis with a line series on the secondary.
pub fn dual_axis(
    title: &str,
    series: &DualAxisSeries,
    y_title: &str,
    secondary_y_title: &str,
    style: &ChartStyle,
) -> ChartResult<ChartSpec> {
    let mut bar = Trace::new(
        series.bar_name.clone(),
        series.categories.clone(),
        series.bar_values.clone(),
    );
    let mut line = Trace::new(
        series.line_name.clone(),
        series.categories.clone(),
        series.line_values.clone(),
    );
    if style.show_values {
        bar = bar.with_text(series.bar_text.clone().unwrap_or_else(|| {
            series.bar_values.iter().map(|v| format!("{v:.0}")).collect()
        }));
        line = line.with_text(series.line_text.clone().unwrap_or_else(|| {
            series.line_values.iter().map(|v| format!("{v:.2}")).collect()
        }));
    }
    let mut spec = ChartSpec::new(title, ChartKind::Bar);
    spec.traces.push(bar);
    spec.traces.push(line);
    spec.y_title = Some(y_title.to_string());
    spec.secondary_y_title = Some(secondary_y_title.to_string());
    spec = spec.option("secondary_y", Value::Bool(true));
    spec = spec.option("color", Value::String(style.color.clone()));
    spec = spec.option("secondary_color", Value::String(style.secondary_color.clone()));
    spec.validate()?;
    Ok(spec)
}
/// Missing combinations serialize as nulls so renderers show blank cells.
pub fn heatmap(title: &str, matrix: &CrossTabMatrix, style: &ChartStyle) -> ChartResult<ChartSpec> {
    let trace = Trace::new(
        format!("{} x {}", matrix.row_key, matrix.col_key),
        matrix.cols.clone(),
        matrix.rows.clone(),
    )
    .with_matrix(matrix.cells.clone());
    let mut spec = ChartSpec::new(title, ChartKind::Heatmap);
    spec.traces.push(trace);
    spec.x_title = Some(matrix.col_key.clone());
    spec.y_title = Some(matrix.row_key.clone());
    spec = spec.option("color_scale", Value::String("Blues".to_string()));
    if style.show_values {
        spec = spec.option("cell_values", Value::Bool(true));
    }
    spec.validate()?;
    Ok(spec)
}
pub fn histogram_overlay(
    title: &str,
    left: &[f64],
    right: &[f64],
    names: (&str, &str),
    style: &ChartStyle,
) -> ChartResult<ChartSpec> {
    let mut spec = ChartSpec::new(title, ChartKind::Histogram);
    // Histogram traces carry their samples on the x axis only.
    spec.traces
        .push(Trace::new(names.0.to_string(), left.to_vec(), Vec::<String>::new()));
    spec.traces
        .push(Trace::new(names.1.to_string(), right.to_vec(), Vec::<String>::new()));
    spec = spec.option("bar_mode", Value::String("overlay".to_string()));
    spec = spec.option("opacity", Value::from(style.opacity));
    spec = spec.option("color", Value::String(style.color.clone()));
    spec = spec.option("secondary_color", Value::String(style.secondary_color.clone()));
    spec.validate()?;
    Ok(spec)
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleSeries {
    pub name: String,
    pub xs: Vec<f64>,
    pub labels: Vec<String>,
    pub sizes: Vec<f64>,
}
pub fn scatter(title: &str, series: &[BubbleSeries], style: &ChartStyle) -> ChartResult<ChartSpec> {
    let mut spec = ChartSpec::new(title, ChartKind::Scatter);
    for group in series {
        spec.traces.push(
            Trace::new(group.name.clone(), group.xs.clone(), group.labels.clone())
                .with_size(group.sizes.clone()),
        );
    }
    spec = spec.option("opacity", Value::from(style.opacity));
    spec.validate()?;
    Ok(spec)
}
