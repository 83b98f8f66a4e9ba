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

use crate::dataset::CrmDataset;
use crate::error::{utils, Result, ValidationError, ValidationResult};
use itertools::Itertools;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
/// Label under which missing values are counted when the policy includes them.
pub const NAN_LABEL: &str = "NaN";
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NanPolicy {
    #[default]
    Include,
    Exclude,
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRequest {
    pub column: String,
    pub nan_policy: NanPolicy,
    pub top_n: Option<usize>,
}
impl CategoryRequest {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            nan_policy: NanPolicy::Include,
            top_n: None,
        }
    }
    pub fn validate(&self) -> ValidationResult<()> {
        if self.column.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "column".to_string(),
            });
        }
        if self.top_n == Some(0) {
            return Err(ValidationError::InvalidTopN { value: 0 });
        }
        Ok(())
    }
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub column: String,
    pub entries: Vec<CategoryCount>,
}
impl CategoryCounts {
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.label.clone()).collect()
    }
    pub fn counts(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.count).collect()
    }
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
pub fn count_categories(dataset: &CrmDataset, request: &CategoryRequest) -> Result<CategoryCounts> {
    request.validate()?;
    let series = dataset.require_column(&request.column)?;
    let casted = series
        .cast(&DataType::String)
        .map_err(|e| utils::column_statistics(&request.column, e))?;
    let chunked = casted
        .str()
        .map_err(|e| utils::column_statistics(&request.column, e))?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in chunked {
        match value {
            Some(v) => *counts.entry(v.to_string()).or_insert(0) += 1,
            None => {
                if request.nan_policy == NanPolicy::Include {
                    *counts.entry(NAN_LABEL.to_string()).or_insert(0) += 1;
                }
            }
        }
    }
    if counts.is_empty() {
        return Err(utils::empty_result(&request.column));
    }
    let mut entries: Vec<CategoryCount> = counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .map(|(label, count)| CategoryCount { label, count })
        .collect();
    if let Some(limit) = request.top_n {
        entries.truncate(limit);
    }
    Ok(CategoryCounts {
        column: request.column.clone(),
        entries,
    })
}
