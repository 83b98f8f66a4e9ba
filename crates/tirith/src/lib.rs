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

pub mod catalog;
pub mod category;
pub mod chart_spec;
pub mod correlation;
pub mod dashboards;
pub mod dataset;
pub mod descriptive;
pub mod duration;
pub mod error;
pub mod funnel;
pub mod session;
pub mod time_series;

pub use catalog::{ColumnRole, DatasetCatalog, DatasetPolicy};
pub use category::{CategoryCounts, CategoryRequest, NanPolicy, NAN_LABEL};
pub use chart_spec::{ChartKind, ChartSpec, ChartStyle, Orientation, Trace};
pub use correlation::{CorrelationRequest, CorrelationResult, DealScope};
pub use dashboards::{
    build_dashboard, CallsSelection, ContactsSelection, DashboardConfig, DashboardReport,
    DashboardSelections, DealsSelection, DealsTab, Panel, PanelContent, SpendSelection,
};
pub use dataset::{route_filename, CrmDataset, DatasetKind, DatasetMetadata};
pub use descriptive::{ColumnSummary, DescribeRequest, NumericSummary};
pub use duration::DealDurationStats;
pub use error::{AnalyticsError, ErrorReporter, ErrorSeverity, Result};
pub use funnel::{
    CrossTabMatrix, FunnelReport, FunnelRequest, FunnelSort, PaymentReport, SourceQualityReport,
};
pub use session::DashboardSession;
pub use time_series::{Granularity, TrendRequest, TrendSeries};

pub struct CrmAnalyticsSystem {
    session: DashboardSession,
    catalog: DatasetCatalog,
    config: DashboardConfig,
}
impl CrmAnalyticsSystem {
    pub fn new() -> Result<Self> {
        Ok(Self {
            session: DashboardSession::new(),
            catalog: DatasetCatalog::from_yaml_str(catalog::DEFAULT_CATALOG_YAML)?,
            config: DashboardConfig::default(),
        })
    }
    pub fn with_catalog(catalog_path: &str) -> Result<Self> {
        Ok(Self {
            session: DashboardSession::new(),
            catalog: DatasetCatalog::from_yaml_file(catalog_path)?,
            config: DashboardConfig::default(),
        })
    }
    pub fn with_config(config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            session: DashboardSession::new(),
            catalog: DatasetCatalog::from_yaml_str(catalog::DEFAULT_CATALOG_YAML)?,
            config,
        })
    }
    pub fn ingest_csv(&mut self, path: &str) -> Result<DatasetKind> {
        self.session.ingest_csv(path)
    }
    pub fn ingest_as(&mut self, path: &str, kind: DatasetKind) -> Result<()> {
        self.session.ingest_as(path, kind)
    }
    pub fn dashboard(
        &self,
        kind: DatasetKind,
        selections: &DashboardSelections,
    ) -> Result<DashboardReport> {
        build_dashboard(&self.session, kind, selections, &self.catalog, &self.config)
    }
    pub fn dataset_info(&self, kind: DatasetKind) -> Result<String> {
        self.session.info(kind)
    }
    pub fn category_counts(
        &self,
        kind: DatasetKind,
        request: &CategoryRequest,
    ) -> Result<CategoryCounts> {
        let dataset = self.session.dataset(kind)?;
        category::count_categories(&dataset, request)
    }
    pub fn trend(&self, kind: DatasetKind, request: &TrendRequest) -> Result<TrendSeries> {
        let dataset = self.session.dataset(kind)?;
        time_series::bucket_counts(&dataset, request)
    }
    pub fn funnel(&self, kind: DatasetKind, request: &FunnelRequest) -> Result<FunnelReport> {
        let dataset = self.session.dataset(kind)?;
        funnel::aggregate(&dataset, request)
    }
    pub fn session(&self) -> &DashboardSession {
        &self.session
    }
    pub fn catalog(&self) -> &DatasetCatalog {
        &self.catalog
    }
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }
}
impl Default for CrmAnalyticsSystem {
    fn default() -> Self {
        Self::new().expect("Failed to create default analytics system")
    }
}
