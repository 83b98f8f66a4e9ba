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

use crate::dataset::{route_filename, CrmDataset, DatasetKind};
use crate::error::{Result, RoutingError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
pub const DEFAULT_COMPANION_CALLS_PATH: &str = "demo_data/Cleaned_Calls.csv";
pub const DEFAULT_MAP_PATH: &str = "deals_map.html";
#[derive(Debug, Clone)]
pub struct IngestRecord {
    pub kind: DatasetKind,
    pub name: String,
    pub row_count: usize,
    pub ingested_at: DateTime<Utc>,
}
/// Holds the tables loaded for one analysis session. Re-ingesting a
/// kind replaces the previous table.
#[derive(Debug)]
pub struct DashboardSession {
    datasets: HashMap<DatasetKind, Arc<CrmDataset>>,
    companion_calls_path: PathBuf,
    map_path: PathBuf,
    log: Vec<IngestRecord>,
}
impl Default for DashboardSession {
    fn default() -> Self {
        Self::new()
    }
}
impl DashboardSession {
    pub fn new() -> Self {
        Self::with_paths(DEFAULT_COMPANION_CALLS_PATH, DEFAULT_MAP_PATH)
    }
    pub fn with_paths(
        companion_calls_path: impl Into<PathBuf>,
        map_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            datasets: HashMap::new(),
            companion_calls_path: companion_calls_path.into(),
            map_path: map_path.into(),
            log: Vec::new(),
        }
    }
    pub fn ingest_csv(&mut self, path: impl AsRef<Path>) -> Result<DatasetKind> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or(RoutingError::EmptyFileName)?;
        let kind = route_filename(&file_name)?;
        self.ingest_as(path, kind)?;
        Ok(kind)
    }
    pub fn ingest_as(&mut self, path: impl AsRef<Path>, kind: DatasetKind) -> Result<()> {
        let dataset = CrmDataset::from_csv_path(path, kind)?;
        info!(kind = %kind, rows = dataset.height(), columns = dataset.frame().width(), "dataset ingested");
        self.log.push(IngestRecord {
            kind,
            name: dataset.name().to_string(),
            row_count: dataset.height(),
            ingested_at: Utc::now(),
        });
        self.datasets.insert(kind, Arc::new(dataset));
        Ok(())
    }
    pub fn dataset(&self, kind: DatasetKind) -> Result<Arc<CrmDataset>> {
        self.datasets.get(&kind).cloned().ok_or_else(|| {
            RoutingError::NotIngested {
                kind: kind.as_str().to_string(),
            }
            .into()
        })
    }
    pub fn has_dataset(&self, kind: DatasetKind) -> bool {
        self.datasets.contains_key(&kind)
    }
    pub fn kinds(&self) -> Vec<DatasetKind> {
        DatasetKind::all()
            .into_iter()
            .filter(|kind| self.datasets.contains_key(kind))
            .collect()
    }
    /// Absence is not an error here; correlation panels degrade to
    /// notices when the export is missing.
    pub fn companion_calls(&self) -> Option<CrmDataset> {
        if !self.companion_calls_path.exists() {
            debug!(path = %self.companion_calls_path.display(), "companion calls export not present");
            return None;
        }
        match CrmDataset::from_csv_path(&self.companion_calls_path, DatasetKind::Calls) {
            Ok(dataset) => Some(dataset),
            Err(error) => {
                warn!(%error, "failed to load companion calls export");
                None
            }
        }
    }
    pub fn map_markup(&self) -> Option<String> {
        std::fs::read_to_string(&self.map_path).ok()
    }
    pub fn ingest_log(&self) -> &[IngestRecord] {
        &self.log
    }
    pub fn info(&self, kind: DatasetKind) -> Result<String> {
        Ok(self.dataset(kind)?.info())
    }
    pub fn summary(&self) -> String {
        let total_rows: usize = self
            .datasets
            .values()
            .map(|dataset| dataset.height())
            .sum();
        format!(
            "Session Summary:\n\
             - Datasets loaded: {}\n\
             - Total rows: {}\n\
             - Ingest events: {}",
            self.datasets.len(),
            total_rows,
            self.log.len()
        )
    }
}
