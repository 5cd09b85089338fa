//! API Request/Response Types

use axum::http::{Method, StatusCode, Uri};
use axum::Json;
use serde::Serialize;

use crate::core::gas_cache::CacheStats;
use crate::models::errors::{AppError, ErrorCode};

/// Handler result: JSON body or the uniform error body
pub type ApiResult<T> = Result<Json<T>, ApiFailure>;

/// Error status plus body
pub type ApiFailure = (StatusCode, Json<ErrorResponse>);

/// Uniform error body for every non-2xx response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub code: String,
    pub message: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub path: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>, method: &Method, uri: &Uri) -> Self {
        Self {
            status: code.http_status(),
            code: code.as_str().to_string(),
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            path: uri.to_string(),
            method: method.to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Map a service error; internal source chains are not exposed
    pub fn from_app_error(err: &AppError, method: &Method, uri: &Uri) -> Self {
        let response = Self::new(err.code, err.message.clone(), method, uri);
        if err.details.is_empty() {
            response
        } else {
            response.with_details(serde_json::json!(err.details))
        }
    }

    pub fn into_failure(self) -> ApiFailure {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self))
    }
}

/// One rejected request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ============================================
// Trading
// ============================================

#[derive(Debug, Serialize)]
pub struct GasPriceResponse {
    /// Gas price in wei, decimal string
    pub wei: String,
    /// Observation time, ms since the Unix epoch
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenReturnResponse {
    /// Output amount in the smallest unit of the TO token, decimal string
    pub amount_out: String,
}

// ============================================
// Health Check & Stats
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    pub uptime_seconds: u64,
    pub gas_cache: CacheStats,
}
