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

use crate::dataset::DatasetKind;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
pub const DEFAULT_CATALOG_YAML: &str = include_str!("../config/crm_catalog.yml");
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Success,
    Monetary,
    Offer,
    Payment,
    Created,
    Closed,
    City,
    Country,
    Language,
}
impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Success => "success",
            ColumnRole::Monetary => "monetary",
            ColumnRole::Offer => "offer",
            ColumnRole::Payment => "payment",
            ColumnRole::Created => "created",
            ColumnRole::Closed => "closed",
            ColumnRole::City => "city",
            ColumnRole::Country => "country",
            ColumnRole::Language => "language",
        }
    }
}
impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPolicy {
    #[serde(default)]
    pub category_columns: Vec<String>,
    #[serde(default)]
    pub describe_columns: Vec<String>,
    #[serde(default)]
    pub describe_excludes: Vec<String>,
    /// Matches by lower-cased substring, so any column containing `id` is dropped.
    #[serde(default)]
    pub drop_id_columns: bool,
    #[serde(default)]
    pub numeric_columns: Vec<String>,
    #[serde(default)]
    pub boolean_flag_columns: Vec<String>,
    #[serde(default)]
    pub success_column: Option<String>,
    #[serde(default)]
    pub monetary_column: Option<String>,
    #[serde(default)]
    pub offer_column: Option<String>,
    #[serde(default)]
    pub payment_column: Option<String>,
    #[serde(default)]
    pub created_column: Option<String>,
    #[serde(default)]
    pub closed_column: Option<String>,
    #[serde(default)]
    pub city_column: Option<String>,
    #[serde(default)]
    pub country_column: Option<String>,
    #[serde(default)]
    pub language_column: Option<String>,
}
impl DatasetPolicy {
    pub fn role(&self, role: ColumnRole) -> ConfigResult<&str> {
        let value = match role {
            ColumnRole::Success => &self.success_column,
            ColumnRole::Monetary => &self.monetary_column,
            ColumnRole::Offer => &self.offer_column,
            ColumnRole::Payment => &self.payment_column,
            ColumnRole::Created => &self.created_column,
            ColumnRole::Closed => &self.closed_column,
            ColumnRole::City => &self.city_column,
            ColumnRole::Country => &self.country_column,
            ColumnRole::Language => &self.language_column,
        };
        value.as_deref().ok_or_else(|| ConfigError::CatalogInvalid {
            reason: format!("no {role} column configured for this dataset kind"),
        })
    }
    pub fn has_role(&self, role: ColumnRole) -> bool {
        self.role(role).is_ok()
    }
    pub fn describe_targets(&self, all_columns: &[String]) -> Vec<String> {
        if !self.describe_columns.is_empty() {
            return self
                .describe_columns
                .iter()
                .filter(|&name| all_columns.contains(name))
                .cloned()
                .collect();
        }
        all_columns
            .iter()
            .filter(|&name| !self.describe_excludes.contains(name))
            .filter(|name| !(self.drop_id_columns && name.to_lowercase().contains("id")))
            .cloned()
            .collect()
    }
    pub fn is_boolean_flag(&self, column: &str) -> bool {
        self.boolean_flag_columns.iter().any(|c| c == column)
    }
}
#[derive(Debug, Deserialize)]
struct CatalogFile {
    datasets: DatasetCatalog,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCatalog {
    pub contacts: DatasetPolicy,
    pub calls: DatasetPolicy,
    pub spend: DatasetPolicy,
    pub deals: DatasetPolicy,
}
impl DatasetCatalog {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::CatalogFile {
                path: path.as_ref().display().to_string(),
                source,
            })?;
        Self::from_yaml_str(&content)
    }
    pub fn from_yaml_str(raw: &str) -> ConfigResult<Self> {
        let file: CatalogFile = serde_yaml::from_str(raw)?;
        file.datasets.validate()?;
        Ok(file.datasets)
    }
    pub fn policy(&self, kind: DatasetKind) -> &DatasetPolicy {
        match kind {
            DatasetKind::Contacts => &self.contacts,
            DatasetKind::Calls => &self.calls,
            DatasetKind::Spend => &self.spend,
            DatasetKind::Deals => &self.deals,
        }
    }
    pub fn policies(&self) -> [(DatasetKind, &DatasetPolicy); 4] {
        [
            (DatasetKind::Contacts, &self.contacts),
            (DatasetKind::Calls, &self.calls),
            (DatasetKind::Spend, &self.spend),
            (DatasetKind::Deals, &self.deals),
        ]
    }
    pub fn validate(&self) -> ConfigResult<()> {
        for (kind, policy) in self.policies() {
            if policy.category_columns.is_empty() {
                return Err(ConfigError::CatalogInvalid {
                    reason: format!("{kind} policy has no category columns"),
                });
            }
            if !policy.describe_columns.is_empty() && !policy.describe_excludes.is_empty() {
                return Err(ConfigError::CatalogInvalid {
                    reason: format!("{kind} policy mixes an explicit describe list with exclusions"),
                });
            }
            Self::check_list(kind, "category_columns", &policy.category_columns)?;
            Self::check_list(kind, "describe_columns", &policy.describe_columns)?;
            Self::check_list(kind, "describe_excludes", &policy.describe_excludes)?;
            Self::check_list(kind, "numeric_columns", &policy.numeric_columns)?;
            Self::check_list(kind, "boolean_flag_columns", &policy.boolean_flag_columns)?;
        }
        for role in [
            ColumnRole::Success,
            ColumnRole::Monetary,
            ColumnRole::Created,
            ColumnRole::Closed,
        ] {
            if !self.deals.has_role(role) {
                return Err(ConfigError::CatalogInvalid {
                    reason: format!("deals policy must name a {role} column"),
                });
            }
        }
        Ok(())
    }
    fn check_list(kind: DatasetKind, list: &str, values: &[String]) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for value in values {
            if value.trim().is_empty() {
                return Err(ConfigError::CatalogInvalid {
                    reason: format!("{kind} policy has an empty entry in {list}"),
                });
            }
            if !seen.insert(value.as_str()) {
                return Err(ConfigError::CatalogInvalid {
                    reason: format!("{kind} policy lists '{value}' twice in {list}"),
                });
            }
        }
        Ok(())
    }
    pub fn stats(&self) -> CatalogStats {
        let mut total_category_columns = 0;
        let mut total_numeric_columns = 0;
        let mut total_describe_rules = 0;
        let mut kinds_with_success = 0;
        let mut kinds_with_boolean_flags = 0;
        let mut unique_columns = HashSet::new();
        for (_, policy) in self.policies() {
            total_category_columns += policy.category_columns.len();
            total_numeric_columns += policy.numeric_columns.len();
            total_describe_rules += policy.describe_columns.len() + policy.describe_excludes.len();
            if policy.success_column.is_some() {
                kinds_with_success += 1;
            }
            if !policy.boolean_flag_columns.is_empty() {
                kinds_with_boolean_flags += 1;
            }
            unique_columns.extend(policy.category_columns.iter().cloned());
            unique_columns.extend(policy.numeric_columns.iter().cloned());
        }
        CatalogStats {
            total_kinds: self.policies().len(),
            total_category_columns,
            total_numeric_columns,
            total_describe_rules,
            kinds_with_success,
            kinds_with_boolean_flags,
            unique_columns: unique_columns.len(),
        }
    }
}
impl Default for DatasetCatalog {
    fn default() -> Self {
        Self::from_yaml_str(DEFAULT_CATALOG_YAML).expect("Failed to load built-in dataset catalog")
    }
}
#[derive(Debug)]
pub struct CatalogStats {
    pub total_kinds: usize,
    pub total_category_columns: usize,
    pub total_numeric_columns: usize,
    pub total_describe_rules: usize,
    pub kinds_with_success: usize,
    pub kinds_with_boolean_flags: usize,
    pub unique_columns: usize,
}
impl CatalogStats {
    pub fn summary(&self) -> String {
        format!(
            "Dataset Catalog Summary:\n\
            - Dataset Kinds: {}\n\
            - Category Columns: {}\n\
            - Numeric Columns: {}\n\
            - Describe Rules: {}\n\
            - Unique Columns: {}\n\
            - Kinds with Success Predicate: {}\n\
            - Kinds with Boolean Flags: {}",
            self.total_kinds,
            self.total_category_columns,
            self.total_numeric_columns,
            self.total_describe_rules,
            self.unique_columns,
            self.kinds_with_success,
            self.kinds_with_boolean_flags
        )
    }
}
