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

use thiserror::Error;
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),
    #[error("Chart spec error: {0}")]
    Chart(#[from] ChartError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("Unknown data type for file '{file_name}': no dataset keyword matched")]
    UnknownDataset { file_name: String },
    #[error("File name is empty, cannot infer dataset kind")]
    EmptyFileName,
    #[error("Dataset '{kind}' has not been ingested in this session")]
    NotIngested { kind: String },
}
#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to load CSV file '{path}': {source}")]
    CsvLoad {
        path: String,
        #[source]
        source: polars::error::PolarsError,
    },
    #[error("Dataframe operation failed: {source}")]
    Frame {
        #[from]
        source: polars::error::PolarsError,
    },
    #[error("Column '{column}' not available in the {dataset} dataset")]
    MissingColumn { column: String, dataset: String },
    #[error("Could not parse '{value}' in column '{column}' as a date")]
    DateParse { column: String, value: String },
    #[error("The {dataset} dataset is empty")]
    EmptyDataset { dataset: String },
}
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("Nothing to aggregate for column '{column}' after filtering")]
    EmptyResult { column: String },
    #[error("Only {months} overlapping month(s); correlation needs at least 2")]
    InsufficientOverlap { months: usize },
    #[error("Column '{column}' has unsupported type {dtype} for this aggregation")]
    UnsupportedColumnType { column: String, dtype: String },
    #[error("Failed to compute statistics for column '{column}': {source}")]
    Statistics {
        column: String,
        #[source]
        source: polars::error::PolarsError,
    },
}
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Chart '{title}' has no traces to render")]
    EmptyTraces { title: String },
    #[error("Trace axis lengths differ: {x} x values vs {y} y values")]
    AxisLengthMismatch { x: usize, y: usize },
    #[error("Chart spec serialisation failed: {source}")]
    Serialisation {
        #[from]
        source: serde_json::Error,
    },
}
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read catalog file '{path}': {source}")]
    CatalogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse catalog YAML: {source}")]
    CatalogParse {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Catalog validation failed: {reason}")]
    CatalogInvalid { reason: String },
    #[error("Invalid dashboard configuration: {field} is out of range")]
    InvalidDashboardConfig { field: String },
    #[error("Invalid chart style: {field} is out of range")]
    InvalidChartStyle { field: String },
    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },
}
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Empty field not allowed: {field}")]
    EmptyField { field: String },
    #[error("Invalid top-N value: {value}")]
    InvalidTopN { value: usize },
    #[error("Percentage value out of range: {value}")]
    InvalidPercentage { value: f64 },
}
pub type Result<T> = std::result::Result<T, AnalyticsError>;
pub type RoutingResult<T> = std::result::Result<T, RoutingError>;
pub type DataResult<T> = std::result::Result<T, DataError>;
pub type AggregationResult<T> = std::result::Result<T, AggregationError>;
pub type ChartResult<T> = std::result::Result<T, ChartError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
pub trait ErrorExt<T> {
    fn with_context(self, msg: &'static str) -> Result<T>;
    fn with_context_fn<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}
impl From<anyhow::Error> for AnalyticsError {
    fn from(err: anyhow::Error) -> Self {
        AnalyticsError::Config(ConfigError::ValidationFailed {
            reason: err.to_string(),
        })
    }
}
impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        AnalyticsError::Chart(ChartError::Serialisation { source: err })
    }
}
impl<T> ErrorExt<T> for Result<T> {
    fn with_context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| {
            AnalyticsError::Config(ConfigError::ValidationFailed {
                reason: format!("{msg}: {e}"),
            })
        })
    }
    fn with_context_fn<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            AnalyticsError::Config(ConfigError::ValidationFailed {
                reason: format!("{}: {}", f(), e),
            })
        })
    }
}
impl AnalyticsError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalyticsError::Data(DataError::MissingColumn { .. })
                | AnalyticsError::Data(DataError::EmptyDataset { .. })
                | AnalyticsError::Aggregation(AggregationError::EmptyResult { .. })
                | AnalyticsError::Aggregation(AggregationError::InsufficientOverlap { .. })
                | AnalyticsError::Validation(_)
        )
    }
    pub fn category(&self) -> &'static str {
        match self {
            AnalyticsError::Routing(_) => "Routing",
            AnalyticsError::Data(_) => "Data",
            AnalyticsError::Aggregation(_) => "Aggregation",
            AnalyticsError::Chart(_) => "Chart",
            AnalyticsError::Config(_) => "Configuration",
            AnalyticsError::Validation(_) => "Validation",
            AnalyticsError::Io(_) => "I/O",
        }
    }
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AnalyticsError::Data(DataError::MissingColumn { .. }) => ErrorSeverity::Warning,
            AnalyticsError::Data(DataError::EmptyDataset { .. }) => ErrorSeverity::Warning,
            AnalyticsError::Aggregation(AggregationError::EmptyResult { .. }) => {
                ErrorSeverity::Warning
            }
            AnalyticsError::Aggregation(AggregationError::InsufficientOverlap { .. }) => {
                ErrorSeverity::Warning
            }
            AnalyticsError::Config(ConfigError::CatalogInvalid { .. }) => ErrorSeverity::Critical,
            AnalyticsError::Validation(_) => ErrorSeverity::Error,
            AnalyticsError::Config(_) => ErrorSeverity::Error,
            AnalyticsError::Io(_) => ErrorSeverity::Error,
            _ => ErrorSeverity::Error,
        }
    }
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            AnalyticsError::Routing(RoutingError::UnknownDataset { .. }) => vec![
                "Rename the file so it contains one of: cont, calls, spend, deals".to_string(),
                "Or ingest with an explicit dataset kind instead of filename routing".to_string(),
            ],
            AnalyticsError::Data(DataError::MissingColumn { .. }) => vec![
                "Check the export matches one of the four known CRM shapes".to_string(),
                "List the dataset's columns via dataset_info to see what is available".to_string(),
            ],
            AnalyticsError::Data(DataError::DateParse { .. }) => vec![
                "Verify the timestamp column format matches the CRM export".to_string(),
                "Pick a different date column for the trend panel".to_string(),
            ],
            AnalyticsError::Aggregation(AggregationError::EmptyResult { .. }) => vec![
                "Include missing values in the count, or choose another column".to_string(),
            ],
            _ => vec!["Check the error message for specific guidance".to_string()],
        }
    }
    pub fn user_message(&self) -> String {
        match self {
            AnalyticsError::Routing(RoutingError::UnknownDataset { .. }) => {
                "Unknown data type. Please upload a contacts, calls, spend or deals export."
                    .to_string()
            }
            AnalyticsError::Aggregation(AggregationError::EmptyResult { .. }) => {
                "No data to visualize for this selection.".to_string()
            }
            AnalyticsError::Data(DataError::EmptyDataset { .. }) => {
                "The dataset appears to be empty. Please provide data with at least one row."
                    .to_string()
            }
            _ => self.to_string(),
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}
impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }
    pub fn color_code(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "\x1b[36m",
            ErrorSeverity::Warning => "\x1b[33m",
            ErrorSeverity::Error => "\x1b[31m",
            ErrorSeverity::Critical => "\x1b[35m",
        }
    }
}
pub struct ErrorReporter {
    pub show_suggestions: bool,
    pub colored_output: bool,
}
impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            show_suggestions: true,
            colored_output: true,
        }
    }
    pub fn report(&self, error: &AnalyticsError) -> String {
        let severity = error.severity();
        let mut output = String::new();
        if self.colored_output {
            output.push_str(severity.color_code());
        }
        output.push_str(&format!("[{}] {}\n", severity.as_str(), error));
        if self.colored_output {
            output.push_str("\x1b[0m");
        }
        if self.show_suggestions {
            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                output.push_str("\nSuggestions:\n");
                for suggestion in suggestions {
                    output.push_str(&format!("  • {suggestion}\n"));
                }
            }
        }
        output
    }
}
impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
pub mod utils {
    use super::*;
    pub fn unknown_dataset(file_name: &str) -> AnalyticsError {
        AnalyticsError::Routing(RoutingError::UnknownDataset {
            file_name: file_name.to_string(),
        })
    }
    pub fn missing_column(column: &str, dataset: &str) -> AnalyticsError {
        AnalyticsError::Data(DataError::MissingColumn {
            column: column.to_string(),
            dataset: dataset.to_string(),
        })
    }
    pub fn empty_result(column: &str) -> AnalyticsError {
        AnalyticsError::Aggregation(AggregationError::EmptyResult {
            column: column.to_string(),
        })
    }
    pub fn date_parse(column: &str, value: &str) -> AnalyticsError {
        AnalyticsError::Data(DataError::DateParse {
            column: column.to_string(),
            value: value.to_string(),
        })
    }
    pub fn column_statistics(column: &str, source: polars::error::PolarsError) -> AnalyticsError {
        AnalyticsError::Aggregation(AggregationError::Statistics {
            column: column.to_string(),
            source,
        })
    }
}
