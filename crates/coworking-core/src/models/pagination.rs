// ABOUTME: Page/offset pagination parameters and the paginated response envelope
// ABOUTME: Used by the admin conversation listing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

use serde::{Deserialize, Serialize};

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

const fn default_page_size() -> u32 {
    10
}

/// Query parameters for a paginated listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Zero-based page index
    #[serde(default)]
    pub page: u32,
    /// Items per page, clamped to `1..=MAX_PAGE_SIZE`
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Sort key; unknown keys fall back to the listing's default
    #[serde(default)]
    pub order_by: String,
    /// Case-insensitive substring filter
    #[serde(default)]
    pub filter: String,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: default_page_size(),
            order_by: String::new(),
            filter: String::new(),
        }
    }
}

impl PaginationParams {
    /// Page size after clamping
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Row offset of the first item on the page
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.limit())
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total matching items across all pages
    pub length: u64,
    /// Parameters that produced this page
    pub params: PaginationParams,
}
