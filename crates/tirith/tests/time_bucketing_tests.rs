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
use tirith::dataset::{CrmDataset, DatasetKind};
use tirith::time_series::{bucket_counts, Granularity, TrendRequest};

fn contacts_with_dates(dates: &[&str]) -> CrmDataset {
    let mut contents = String::from("Contact Owner Name,Created Time\n");
    for date in dates {
        contents.push_str("x,");
        contents.push_str(date);
        contents.push('\n');
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.csv");
    std::fs::write(&path, contents).unwrap();
    CrmDataset::from_csv_path(&path, DatasetKind::Contacts).unwrap()
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn test_monthly_buckets() {
    let dataset = contacts_with_dates(&["2024-01-05", "2024-01-20", "2024-02-01"]);
    let request = TrendRequest::new("Created Time", Granularity::Month);

    let series = bucket_counts(&dataset, &request).unwrap();
    assert_eq!(series.labels(), vec!["2024-01", "2024-02"]);
    assert_eq!(series.counts(), vec![2, 1]);
    assert_eq!(series.total(), 3);
    assert_eq!(series.points[0].bucket_start, ymd(2024, 1, 1));
    assert_eq!(series.points[1].bucket_start, ymd(2024, 2, 1));
}

#[test]
fn test_weekly_buckets_use_iso_labels() {
    let dataset = contacts_with_dates(&["2024-01-29", "2024-01-31", "2024-02-05"]);
    let request = TrendRequest::new("Created Time", Granularity::Week);

    let series = bucket_counts(&dataset, &request).unwrap();
    assert_eq!(series.labels(), vec!["2024-W05", "2024-W06"]);
    assert_eq!(series.counts(), vec![2, 1]);
    // Buckets start on the Monday of their week.
    assert_eq!(series.points[0].bucket_start, ymd(2024, 1, 29));
    assert_eq!(series.points[1].bucket_start, ymd(2024, 2, 5));
}

#[test]
fn test_daily_buckets() {
    let dataset = contacts_with_dates(&["2024-03-01", "2024-03-01", "2024-03-04"]);
    let request = TrendRequest::new("Created Time", Granularity::Day);

    let series = bucket_counts(&dataset, &request).unwrap();
    assert_eq!(series.labels(), vec!["2024-03-01", "2024-03-04"]);
    assert_eq!(series.counts(), vec![2, 1]);
}

#[test]
fn test_buckets_are_ascending() {
    let dataset = contacts_with_dates(&["2024-05-10", "2023-12-31", "2024-02-14", "2024-05-02"]);
    let request = TrendRequest::new("Created Time", Granularity::Month);

    let series = bucket_counts(&dataset, &request).unwrap();
    let starts: Vec<NaiveDate> = series.points.iter().map(|p| p.bucket_start).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
    assert_eq!(series.labels()[0], "2023-12");
}

#[test]
fn test_mixed_timestamp_formats() {
    let dataset = contacts_with_dates(&[
        "2024-01-05",
        "05-02-2024",
        "03/15/2024 08:30",
        "2024-04-01 12:00:00",
    ]);
    let request = TrendRequest::new("Created Time", Granularity::Month);

    let series = bucket_counts(&dataset, &request).unwrap();
    assert_eq!(
        series.labels(),
        vec!["2024-01", "2024-02", "2024-03", "2024-04"]
    );
    assert_eq!(series.counts(), vec![1, 1, 1, 1]);
}

#[test]
fn test_strict_rejects_unparseable_values() {
    let dataset = contacts_with_dates(&["2024-01-05", "not a date"]);
    let request = TrendRequest::new("Created Time", Granularity::Month);

    let error = bucket_counts(&dataset, &request).unwrap_err();
    println!("{error}");
    assert!(error.to_string().contains("Created Time"));
}

#[test]
fn test_lenient_skips_unparseable_values() {
    let dataset = contacts_with_dates(&["2024-01-05", "not a date", "2024-01-20"]);
    let request = TrendRequest::new("Created Time", Granularity::Month).lenient();

    let series = bucket_counts(&dataset, &request).unwrap();
    assert_eq!(series.labels(), vec!["2024-01"]);
    assert_eq!(series.total(), 2);
}

#[test]
fn test_blank_cells_are_skipped_even_when_strict() {
    let dataset = contacts_with_dates(&["2024-01-05", "", "2024-02-01"]);
    let request = TrendRequest::new("Created Time", Granularity::Month);

    let series = bucket_counts(&dataset, &request).unwrap();
    assert_eq!(series.total(), 2);
}

#[test]
fn test_all_blank_column_is_an_error() {
    let dataset = contacts_with_dates(&["", ""]);
    let request = TrendRequest::new("Created Time", Granularity::Month);

    assert!(bucket_counts(&dataset, &request).is_err());
}

#[test]
fn test_granularity_bucket_starts() {
    assert_eq!(
        Granularity::Month.bucket_start(ymd(2024, 3, 17)),
        ymd(2024, 3, 1)
    );
    // 2024-03-17 is a Sunday; its week starts Monday the 11th.
    assert_eq!(
        Granularity::Week.bucket_start(ymd(2024, 3, 17)),
        ymd(2024, 3, 11)
    );
    assert_eq!(
        Granularity::Day.bucket_start(ymd(2024, 3, 17)),
        ymd(2024, 3, 17)
    );
    assert_eq!(Granularity::Month.label(ymd(2024, 3, 1)), "2024-03");
    assert_eq!(Granularity::Week.label(ymd(2024, 3, 11)), "2024-W11");
    assert_eq!(Granularity::Day.label(ymd(2024, 3, 17)), "2024-03-17");
}
