//! # Common API Types
//!
//! Shared response envelope and pagination types used across the API
//! handlers.

use crate::telemetry;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Standard response envelope wrapping every successful payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response metadata
    pub meta: ResponseMeta,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(),
        }
    }
}

/// Response metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResponseMeta {
    /// Unique request identifier for tracing
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub request_id: String,
    /// Response timestamp (ISO 8601)
    #[schema(example = "2026-01-15T10:30:00Z")]
    pub timestamp: String,
}

impl ResponseMeta {
    pub fn new() -> Self {
        Self {
            request_id: telemetry::current_trace_id()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Page of items with offset pagination bookkeeping
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Zero-based page index
    pub page: u64,
    pub per_page: u64,
    /// Total matching items across all pages
    pub total: u64,
}

/// Query parameters for paginated list endpoints
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageParams {
    /// Zero-based page index (default 0)
    pub page: Option<u64>,
    /// Items per page (default 20, max 100)
    pub per_page: Option<u64>,
}

impl PageParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(0)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

/// Location and X-Trace-Id headers returned alongside 201 responses
pub fn created_headers(location: String) -> [(&'static str, String); 2] {
    let trace_id = telemetry::current_trace_id().unwrap_or_else(|| Uuid::new_v4().to_string());
    [("Location", location), ("X-Trace-Id", trace_id)]
}
