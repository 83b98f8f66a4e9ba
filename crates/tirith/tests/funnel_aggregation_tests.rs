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

use tirith::catalog::{DatasetCatalog, DEFAULT_CATALOG_YAML};
use tirith::dataset::{CrmDataset, DatasetKind};
use tirith::duration::closing_durations;
use tirith::funnel::{
    aggregate, conversion_rate, cross_tab, payment_breakdown, report_means, source_quality,
    target_quality, FunnelRequest, FunnelSort, TargetQuality,
};

fn deals_from_csv(contents: &str) -> CrmDataset {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deals.csv");
    std::fs::write(&path, contents).unwrap();
    CrmDataset::from_csv_path(&path, DatasetKind::Deals).unwrap()
}

fn deals_catalog() -> DatasetCatalog {
    DatasetCatalog::from_yaml_str(DEFAULT_CATALOG_YAML).unwrap()
}

#[test]
fn test_single_campaign_funnel() {
    let dataset = deals_from_csv(
        "Campaign,Stage,Months of study,Initial Amount Paid\n\
         Spring,Closed Won,6,1000\n\
         Spring,Closed Won,3,500\n\
         Spring,Negotiation,2,250\n\
         Spring,Enrolled,12,250\n\
         Spring,Closed Lost,,999\n\
         Spring,Closed Lost,,\n\
         Spring,Contact,,\n\
         Spring,Contact,,\n\
         Spring,Qualification,,\n\
         Spring,Qualification,,\n",
    );

    let mut request = FunnelRequest::new("Campaign", "Months of study");
    request.monetary_column = Some("Initial Amount Paid".to_string());
    let report = aggregate(&dataset, &request).unwrap();

    assert_eq!(report.len(), 1);
    let row = &report.rows[0];
    println!("{}", report.table());
    assert_eq!(row.group, "Spring");
    assert_eq!(row.total, 10);
    assert_eq!(row.successful, 4);
    assert_eq!(row.conversion_rate, 40.0);
    // Only money attached to successful deals counts; the lost deal's
    // 999 must not leak into the total.
    assert_eq!(row.monetary_total, Some(2000.0));
    assert!(row.successful <= row.total);
    assert!((0.0..=100.0).contains(&row.conversion_rate));
}

#[test]
fn test_funnel_sorting_and_filters() {
    let dataset = deals_from_csv(
        "Campaign,Months of study\n\
         Alpha,6\n\
         Alpha,3\n\
         Alpha,\n\
         Alpha,\n\
         Beta,2\n\
         Beta,\n\
         Beta,\n\
         Beta,\n\
         Gamma,4\n\
         Gamma,8\n",
    );

    let request = FunnelRequest::new("Campaign", "Months of study");
    let report = aggregate(&dataset, &request).unwrap();
    assert_eq!(report.groups(), vec!["Alpha", "Beta", "Gamma"]);
    assert_eq!(report.totals(), vec![4, 4, 2]);
    assert_eq!(report.conversions(), vec![50.0, 25.0, 100.0]);

    let mut by_conversion = FunnelRequest::new("Campaign", "Months of study");
    by_conversion.sort = FunnelSort::ConversionDesc;
    let report = aggregate(&dataset, &by_conversion).unwrap();
    assert_eq!(report.groups(), vec!["Gamma", "Alpha", "Beta"]);

    let mut filtered = FunnelRequest::new("Campaign", "Months of study");
    filtered.min_successful = 2;
    let report = aggregate(&dataset, &filtered).unwrap();
    assert_eq!(report.groups(), vec!["Alpha", "Gamma"]);

    let mut filtered = FunnelRequest::new("Campaign", "Months of study");
    filtered.min_conversion = 30.0;
    let report = aggregate(&dataset, &filtered).unwrap();
    assert_eq!(report.groups(), vec!["Alpha", "Gamma"]);

    let mut top = FunnelRequest::new("Campaign", "Months of study");
    top.sort = FunnelSort::ConversionDesc;
    top.top_n = Some(1);
    let report = aggregate(&dataset, &top).unwrap();
    assert_eq!(report.groups(), vec!["Gamma"]);

    let full = aggregate(&dataset, &FunnelRequest::new("Campaign", "Months of study")).unwrap();
    let means = report_means(&full);
    assert_eq!(means.mean_total, 3.33);
    assert_eq!(means.mean_successful, 1.67);
    assert_eq!(means.mean_conversion, 58.33);
}

#[test]
fn test_required_columns_drop_incomplete_rows() {
    let dataset = deals_from_csv(
        "Campaign,Stage,Months of study\n\
         Alpha,Won,6\n\
         Alpha,,3\n\
         Alpha,Lost,\n",
    );

    let plain = aggregate(&dataset, &FunnelRequest::new("Campaign", "Months of study")).unwrap();
    assert_eq!(plain.rows[0].total, 3);
    assert_eq!(plain.rows[0].successful, 2);

    let mut request = FunnelRequest::new("Campaign", "Months of study");
    request.required_columns = vec!["Stage".to_string()];
    let report = aggregate(&dataset, &request).unwrap();
    assert_eq!(report.rows[0].total, 2);
    assert_eq!(report.rows[0].successful, 1);
    assert_eq!(report.rows[0].conversion_rate, 50.0);
}

#[test]
fn test_funnel_request_validation() {
    let dataset = deals_from_csv("Campaign,Months of study\nAlpha,6\n");

    let empty_group = FunnelRequest::new("", "Months of study");
    assert!(aggregate(&dataset, &empty_group).is_err());

    let mut bad_percentage = FunnelRequest::new("Campaign", "Months of study");
    bad_percentage.min_conversion = 150.0;
    assert!(aggregate(&dataset, &bad_percentage).is_err());

    let mut zero_top = FunnelRequest::new("Campaign", "Months of study");
    zero_top.top_n = Some(0);
    assert!(aggregate(&dataset, &zero_top).is_err());

    let missing_column = FunnelRequest::new("Nonexistent", "Months of study");
    let error = aggregate(&dataset, &missing_column).unwrap_err();
    assert!(error.user_message().contains("Nonexistent"));
}

#[test]
fn test_target_quality_labels() {
    assert_eq!(target_quality("A - High"), TargetQuality::High);
    assert_eq!(target_quality("B - Medium"), TargetQuality::Medium);
    assert_eq!(target_quality("C - Low"), TargetQuality::NonTarget);
    assert_eq!(target_quality(""), TargetQuality::NonTarget);
    assert_eq!(target_quality("High"), TargetQuality::NonTarget);
    assert_eq!(TargetQuality::NonTarget.as_str(), "Non-Target");
}

#[test]
fn test_source_quality_ordering() {
    let dataset = deals_from_csv(
        "Source,Quality,Months of study\n\
         Google,A - High,6\n\
         Google,B - Medium,\n\
         Google,C - Low,\n\
         Facebook,A - High,3\n\
         Facebook,A - High,6\n\
         ,B - Medium,4\n",
    );

    let report = source_quality(&dataset, "Source", "Quality", "Months of study").unwrap();
    println!("{}", report.table());
    // The row with no source is skipped entirely.
    assert_eq!(report.rows.len(), 2);

    let facebook = &report.rows[0];
    assert_eq!(facebook.source, "Facebook");
    assert_eq!(facebook.total, 2);
    assert_eq!(facebook.high, 2);
    assert_eq!(facebook.high_pct, 100.0);
    assert_eq!(facebook.conversion_rate, 100.0);

    let google = &report.rows[1];
    assert_eq!(google.source, "Google");
    assert_eq!(google.total, 3);
    assert_eq!(google.high, 1);
    assert_eq!(google.medium, 1);
    assert_eq!(google.high_pct, 33.33);
    assert_eq!(google.medium_pct, 33.33);
    assert_eq!(google.conversion_rate, 33.33);
}

#[test]
fn test_payment_breakdown_by_type() {
    let dataset = deals_from_csv(
        "Payment Type,Months of study,Initial Amount Paid,Offer Total Amount,Created Time,Closing Date\n\
         Full,6,1000,1200,2024-01-01,2024-01-11\n\
         Full,,,,2024-01-01,\n\
         Installments,3,300,600,2024-02-01 10:00:00,2024-02-21\n",
    );
    let catalog = deals_catalog();
    let policy = catalog.policy(DatasetKind::Deals);

    let report = payment_breakdown(&dataset, policy).unwrap();
    println!("{}", report.table());
    assert_eq!(report.rows.len(), 2);

    let full = &report.rows[0];
    assert_eq!(full.payment_type, "Full");
    assert_eq!(full.total, 2);
    assert_eq!(full.successful, 1);
    assert_eq!(full.conversion_rate, 50.0);
    // Averages are over the values present, not over all rows.
    assert_eq!(full.avg_initial_amount, Some(1000.0));
    assert_eq!(full.avg_offer_amount, Some(1200.0));
    assert_eq!(full.avg_study_months, Some(6.0));
    // The second row has no closing date, so only one span counts.
    assert_eq!(full.avg_days_to_close, Some(10.0));
    assert_eq!(full.median_days_to_close, Some(10.0));

    let installments = &report.rows[1];
    assert_eq!(installments.payment_type, "Installments");
    assert_eq!(installments.conversion_rate, 100.0);
    assert_eq!(installments.avg_days_to_close, Some(20.0));
}

#[test]
fn test_cross_tab_conversion_matrix() {
    let dataset = deals_from_csv(
        "Product,Education Type,Months of study\n\
         Course A,Online,6\n\
         Course A,Online,\n\
         Course A,Offline,3\n\
         Course B,Online,\n\
         Course B,Online,\n\
         Course B,Online,2\n",
    );

    let matrix = cross_tab(&dataset, "Product", "Education Type", "Months of study").unwrap();
    // Row totals tie at 3 apiece, so the tie breaks alphabetically.
    assert_eq!(matrix.rows, vec!["Course A", "Course B"]);
    // Online carries 5 of the 6 deals and sorts ahead of Offline.
    assert_eq!(matrix.cols, vec!["Online", "Offline"]);
    assert_eq!(matrix.cells[0], vec![Some(50.0), Some(100.0)]);
    assert_eq!(matrix.cells[1], vec![Some(33.33), None]);
}

#[test]
fn test_conversion_rate_bounds() {
    assert_eq!(conversion_rate(0, 0), 0.0);
    assert_eq!(conversion_rate(1, 2), 50.0);
    assert_eq!(conversion_rate(2, 3), 66.67);
    assert_eq!(conversion_rate(5, 5), 100.0);
}

#[test]
fn test_closing_durations_split_by_outcome() {
    let dataset = deals_from_csv(
        "Months of study,Created Time,Closing Date\n\
         6,2024-01-01,2024-01-15\n\
         3,2024-01-01,2024-01-01\n\
         ,2024-02-01,2024-01-20\n\
         ,2024-03-01,2024-03-06\n\
         ,2024-03-10,\n",
    );
    let catalog = deals_catalog();
    let policy = catalog.policy(DatasetKind::Deals);

    let stats = closing_durations(&dataset, policy).unwrap();
    println!("{}", stats.summary());
    assert_eq!(stats.successful_days, vec![14.0, 0.0]);
    // The deal closed before it was created is dropped, the open deal
    // has no closing date, so a single lost span remains.
    assert_eq!(stats.lost_days, vec![5.0]);
    assert_eq!(stats.mean_successful, Some(7.0));
    assert_eq!(stats.mean_lost, Some(5.0));
    assert_eq!(stats.len(), 3);
}
