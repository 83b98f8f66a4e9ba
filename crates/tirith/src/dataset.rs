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

use crate::error::{DataError, DataResult, RoutingError, RoutingResult};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use uuid::Uuid;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    Contacts,
    Calls,
    Spend,
    Deals,
}
impl DatasetKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Contacts => "contacts",
            DatasetKind::Calls => "calls",
            DatasetKind::Spend => "spend",
            DatasetKind::Deals => "deals",
        }
    }
    /// Keyword tested against lower-cased file names, in declared order.
    const fn keyword(&self) -> &'static str {
        match self {
            DatasetKind::Contacts => "cont",
            DatasetKind::Calls => "calls",
            DatasetKind::Spend => "spend",
            DatasetKind::Deals => "deals",
        }
    }
    pub const fn all() -> [DatasetKind; 4] {
        [
            DatasetKind::Contacts,
            DatasetKind::Calls,
            DatasetKind::Spend,
            DatasetKind::Deals,
        ]
    }
}
impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
/// First keyword hit wins, so a name containing both `cont` and `deals`
/// routes to contacts.
pub fn route_filename(file_name: &str) -> RoutingResult<DatasetKind> {
    if file_name.trim().is_empty() {
        return Err(RoutingError::EmptyFileName);
    }
    let lowered = file_name.to_lowercase();
    for kind in DatasetKind::all() {
        if lowered.contains(kind.keyword()) {
            return Ok(kind);
        }
    }
    Err(RoutingError::UnknownDataset {
        file_name: file_name.to_string(),
    })
}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetId(String);
impl DatasetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}
impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}
impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub id: DatasetId,
    pub name: String,
    pub kind: DatasetKind,
    pub row_count: usize,
    pub column_count: usize,
    pub ingested_at: DateTime<Utc>,
    pub source_path: Option<PathBuf>,
}
#[derive(Debug, Clone)]
pub struct CrmDataset {
    kind: DatasetKind,
    frame: DataFrame,
    metadata: DatasetMetadata,
}
impl CrmDataset {
    pub fn from_csv_path<P: AsRef<Path>>(path: P, kind: DatasetKind) -> DataResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let frame = CsvReader::new(file)
            .finish()
            .map_err(|source| DataError::CsvLoad {
                path: path.display().to_string(),
                source,
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut dataset = Self::from_dataframe(frame, kind, name);
        dataset.metadata.source_path = Some(path.to_path_buf());
        Ok(dataset)
    }
    pub fn from_dataframe(frame: DataFrame, kind: DatasetKind, name: impl Into<String>) -> Self {
        let metadata = DatasetMetadata {
            id: DatasetId::new(),
            name: name.into(),
            kind,
            row_count: frame.height(),
            column_count: frame.width(),
            ingested_at: Utc::now(),
            source_path: None,
        };
        Self {
            kind,
            frame,
            metadata,
        }
    }
    pub fn kind(&self) -> DatasetKind {
        self.kind
    }
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }
    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
    pub fn height(&self) -> usize {
        self.frame.height()
    }
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect()
    }
    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }
    pub fn require_column(&self, name: &str) -> DataResult<Series> {
        self.frame
            .column(name)
            .map(|c| c.as_materialized_series().clone())
            .map_err(|_| DataError::MissingColumn {
                column: name.to_string(),
                dataset: self.kind.as_str().to_string(),
            })
    }
    pub fn filter_rows(&self, mask: &[bool]) -> DataResult<CrmDataset> {
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        let frame = self.frame.filter(&mask)?;
        Ok(CrmDataset::from_dataframe(
            frame,
            self.kind,
            self.metadata.name.clone(),
        ))
    }
    pub fn string_values(&self, name: &str) -> DataResult<Vec<Option<String>>> {
        let series = self.require_column(name)?;
        let casted = series.cast(&DataType::String)?;
        let chunked = casted.str()?;
        Ok(chunked
            .into_iter()
            .map(|value| value.map(|s| s.to_string()))
            .collect())
    }
    /// Values that cannot be read as numbers come back as `None`.
    pub fn numeric_values(&self, name: &str) -> DataResult<Vec<Option<f64>>> {
        let series = self.require_column(name)?;
        let casted = series.cast(&DataType::Float64)?;
        let chunked = casted.f64()?;
        Ok(chunked
            .into_iter()
            .map(|value| value.filter(|v| v.is_finite()))
            .collect())
    }
    pub fn timestamp_columns(&self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| {
                let lowered = name.to_lowercase();
                lowered.contains("time") || lowered.contains("date")
            })
            .collect()
    }
    pub fn info(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "Dataset: {} ({})\n",
            self.metadata.name, self.kind
        ));
        report.push_str(&format!(
            "Rows: {}, Columns: {}\n",
            self.metadata.row_count, self.metadata.column_count
        ));
        report.push_str(&format!("Ingested: {}\n", self.metadata.ingested_at));
        if let Some(path) = &self.metadata.source_path {
            report.push_str(&format!("Source: {}\n", path.display()));
        }
        report.push_str(&format!("Columns: {}\n", self.column_names().join(", ")));
        report
    }
}
impl fmt::Display for CrmDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} rows x {} columns)",
            self.metadata.name, self.kind, self.metadata.row_count, self.metadata.column_count
        )
    }
}
