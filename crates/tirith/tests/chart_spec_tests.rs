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

use chrono::NaiveDate;
use serde_json::Value;
use tirith::category::{CategoryCount, CategoryCounts};
use tirith::chart_spec::{
    self, AxisValues, ChartKind, ChartSpec, ChartStyle, FunnelValue, Orientation, Trace,
};
use tirith::funnel::{CrossTabMatrix, FunnelReport, FunnelRow};
use tirith::time_series::{Granularity, TrendPoint, TrendSeries};

fn stage_counts() -> CategoryCounts {
    CategoryCounts {
        column: "Stage".to_string(),
        entries: vec![
            CategoryCount {
                label: "Won".to_string(),
                count: 5,
            },
            CategoryCount {
                label: "Lost".to_string(),
                count: 2,
            },
        ],
    }
}

fn campaign_report() -> FunnelReport {
    FunnelReport {
        group_by: "Campaign".to_string(),
        rows: vec![
            FunnelRow {
                group: "Spring".to_string(),
                total: 4,
                successful: 2,
                conversion_rate: 50.0,
                monetary_total: Some(1500.0),
            },
            FunnelRow {
                group: "Summer".to_string(),
                total: 2,
                successful: 1,
                conversion_rate: 50.0,
                monetary_total: None,
            },
        ],
    }
}

fn month_series() -> TrendSeries {
    let ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    TrendSeries {
        column: "Created Time".to_string(),
        granularity: Granularity::Month,
        points: vec![
            TrendPoint {
                bucket_start: ymd(2024, 1, 1),
                label: "2024-01".to_string(),
                count: 3,
            },
            TrendPoint {
                bucket_start: ymd(2024, 2, 1),
                label: "2024-02".to_string(),
                count: 1,
            },
        ],
    }
}

#[test]
fn test_vertical_bar_carries_labels_on_x() {
    let spec = chart_spec::category_bar(
        "Stage distribution",
        &stage_counts(),
        Orientation::Vertical,
        &ChartStyle::for_category_bars(),
    )
    .unwrap();

    assert_eq!(spec.kind, ChartKind::Bar);
    assert_eq!(
        spec.traces[0].x,
        AxisValues::Labels(vec!["Won".to_string(), "Lost".to_string()])
    );
    assert_eq!(spec.traces[0].y, AxisValues::Numbers(vec![5.0, 2.0]));
    assert_eq!(
        spec.traces[0].text,
        Some(vec!["5".to_string(), "2".to_string()])
    );
    assert!(!spec.options.contains_key("y_axis_reversed"));
}

#[test]
fn test_horizontal_bar_flips_axes_and_reverses() {
    let spec = chart_spec::category_bar(
        "Stage distribution",
        &stage_counts(),
        Orientation::Horizontal,
        &ChartStyle::for_category_bars(),
    )
    .unwrap();

    assert_eq!(spec.kind, ChartKind::HorizontalBar);
    assert_eq!(spec.traces[0].x, AxisValues::Numbers(vec![5.0, 2.0]));
    assert_eq!(
        spec.traces[0].y,
        AxisValues::Labels(vec!["Won".to_string(), "Lost".to_string()])
    );
    assert_eq!(spec.x_title.as_deref(), Some("Count"));
    assert_eq!(spec.options.get("y_axis_reversed"), Some(&Value::Bool(true)));
}

#[test]
fn test_pie_has_flat_hole() {
    let spec = chart_spec::category_pie(
        "Stage distribution",
        &stage_counts(),
        &ChartStyle::for_category_bars(),
    )
    .unwrap();
    assert_eq!(spec.kind, ChartKind::Pie);
    assert_eq!(spec.options.get("hole"), Some(&Value::from(0.0)));
}

#[test]
fn test_trend_line_options_follow_granularity() {
    let monthly = chart_spec::trend_line(
        "Monthly trend",
        &month_series(),
        &ChartStyle::for_trends(),
    )
    .unwrap();
    assert_eq!(monthly.kind, ChartKind::Line);
    assert_eq!(monthly.options.get("markers"), Some(&Value::Bool(true)));
    assert_eq!(
        monthly.traces[0].text,
        Some(vec!["3".to_string(), "1".to_string()])
    );

    let mut weekly_series = month_series();
    weekly_series.granularity = Granularity::Week;
    let weekly =
        chart_spec::trend_line("Weekly trend", &weekly_series, &ChartStyle::default()).unwrap();
    assert_eq!(weekly.options.get("tick_angle"), Some(&Value::from(45.0)));
    assert_eq!(weekly.traces[0].text, None);
}

#[test]
fn test_funnel_bar_value_selection() {
    let report = campaign_report();

    let totals = chart_spec::funnel_bar(
        "Deals",
        &report,
        FunnelValue::Totals,
        &ChartStyle::for_category_bars(),
    )
    .unwrap();
    assert_eq!(totals.traces[0].y, AxisValues::Numbers(vec![4.0, 2.0]));
    assert_eq!(totals.y_title.as_deref(), Some("Deals"));

    let conversion = chart_spec::funnel_bar(
        "Conversion",
        &report,
        FunnelValue::Conversion,
        &ChartStyle::for_category_bars(),
    )
    .unwrap();
    assert_eq!(conversion.traces[0].y, AxisValues::Numbers(vec![50.0, 50.0]));
    assert_eq!(
        conversion.traces[0].text,
        Some(vec!["50.00%".to_string(), "50.00%".to_string()])
    );

    // A group with no recorded sales charts as zero rather than a gap.
    let monetary = chart_spec::funnel_bar(
        "Sales",
        &report,
        FunnelValue::Monetary,
        &ChartStyle::for_category_bars(),
    )
    .unwrap();
    assert_eq!(monetary.traces[0].y, AxisValues::Numbers(vec![1500.0, 0.0]));
    assert_eq!(monetary.y_title.as_deref(), Some("Total Sales"));
}

#[test]
fn test_dual_axis_pins_line_to_secondary() {
    let series = chart_spec::DualAxisSeries {
        categories: vec!["Berlin".to_string(), "Madrid".to_string()],
        bar_name: "Deals".to_string(),
        bar_values: vec![4.0, 2.0],
        line_name: "Conversion %".to_string(),
        line_values: vec![50.0, 100.0],
        bar_text: None,
        line_text: None,
    };
    let spec = chart_spec::dual_axis(
        "Top cities",
        &series,
        "Deals",
        "Conversion %",
        &ChartStyle::for_category_bars(),
    )
    .unwrap();

    assert_eq!(spec.traces.len(), 2);
    assert_eq!(spec.options.get("secondary_y"), Some(&Value::Bool(true)));
    assert_eq!(spec.secondary_y_title.as_deref(), Some("Conversion %"));
    // Missing text falls back to formatted values.
    assert_eq!(
        spec.traces[1].text,
        Some(vec!["50.00".to_string(), "100.00".to_string()])
    );
}

#[test]
fn test_heatmap_serializes_missing_cells_as_null() {
    let matrix = CrossTabMatrix {
        row_key: "Product".to_string(),
        col_key: "Education Type".to_string(),
        rows: vec!["Course A".to_string(), "Course B".to_string()],
        cols: vec!["Online".to_string()],
        cells: vec![vec![Some(50.0)], vec![None]],
    };
    let spec =
        chart_spec::heatmap("Conversion", &matrix, &ChartStyle::for_category_bars()).unwrap();

    assert_eq!(spec.kind, ChartKind::Heatmap);
    assert!(spec.traces[0].z.is_some());
    let json = spec.to_json().unwrap();
    println!("{json}");
    assert!(json.contains("null"));
}

#[test]
fn test_histogram_overlay_carries_samples_on_x() {
    let spec = chart_spec::histogram_overlay(
        "Time to close",
        &[1.0, 2.0, 3.0],
        &[],
        ("Successful", "Lost"),
        &ChartStyle::for_overlays(),
    )
    .unwrap();

    assert_eq!(spec.kind, ChartKind::Histogram);
    assert_eq!(spec.traces.len(), 2);
    assert_eq!(spec.traces[0].x, AxisValues::Numbers(vec![1.0, 2.0, 3.0]));
    assert!(spec.traces[0].y.is_empty());
    assert_eq!(
        spec.options.get("bar_mode"),
        Some(&Value::String("overlay".to_string()))
    );
}

#[test]
fn test_scatter_attaches_bubble_sizes() {
    let series = vec![chart_spec::BubbleSeries {
        name: "A1".to_string(),
        xs: vec![2.0, 1.0],
        labels: vec!["Berlin".to_string(), "Madrid".to_string()],
        sizes: vec![4.0, 2.0],
    }];
    let spec =
        chart_spec::scatter("Deals by city", &series, &ChartStyle::for_overlays()).unwrap();
    assert_eq!(spec.kind, ChartKind::Scatter);
    assert_eq!(spec.traces[0].size, Some(vec![4.0, 2.0]));
}

#[test]
fn test_spec_validation() {
    let empty = ChartSpec::new("Empty", ChartKind::Bar);
    assert!(empty.validate().is_err());

    let mut mismatched = ChartSpec::new("Mismatch", ChartKind::Bar);
    mismatched.traces.push(Trace::new(
        "t",
        vec!["a".to_string(), "b".to_string()],
        vec![1.0],
    ));
    assert!(mismatched.validate().is_err());

    // Heatmap axes are row and column labels of independent lengths.
    let mut heatmap = ChartSpec::new("Heatmap", ChartKind::Heatmap);
    heatmap.traces.push(
        Trace::new(
            "t",
            vec!["x1".to_string(), "x2".to_string()],
            vec!["y1".to_string()],
        )
        .with_matrix(vec![vec![Some(1.0), None]]),
    );
    assert!(heatmap.validate().is_ok());
}

#[test]
fn test_style_validation() {
    assert!(ChartStyle::default().validate().is_ok());
    assert!(ChartStyle::for_overlays().validate().is_ok());

    let mut style = ChartStyle::default();
    style.tick_angle = 100.0;
    assert!(style.validate().is_err());

    let mut style = ChartStyle::default();
    style.opacity = 0.0;
    assert!(style.validate().is_err());
    style.opacity = 1.5;
    assert!(style.validate().is_err());
}
