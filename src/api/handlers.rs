//! API Request Handlers

use axum::{
    extract::{rejection::PathRejection, OriginalUri, Path, State},
    http::{Method, StatusCode},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use super::types::*;
use super::validation::{parse_address, parse_amount};
use crate::core::trading::TradingService;
use crate::models::errors::AppError;
use crate::utils::constants::APP_VERSION;

/// Shared application state
pub struct AppState {
    pub trading: Arc<TradingService>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(trading: Arc<TradingService>) -> Self {
        Self {
            trading,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn service_failure(err: &AppError, method: &Method, uri: &axum::http::Uri) -> ApiFailure {
    if err.code.http_status() >= 500 {
        error!(code = err.code_str(), path = %uri, "❌ {}", err);
    }
    ErrorResponse::from_app_error(err, method, uri).into_failure()
}

fn bad_request(
    method: &Method,
    uri: &axum::http::Uri,
    details: impl IntoIterator<Item = FieldError>,
) -> ApiFailure {
    let details: Vec<FieldError> = details.into_iter().collect();
    ErrorResponse::from_app_error(&AppError::bad_request("Validation failed"), method, uri)
        .with_details(serde_json::json!(details))
        .into_failure()
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthData> {
    Json(HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsData> {
    Json(StatsData {
        uptime_seconds: state.uptime_seconds(),
        gas_cache: state.trading.gas_cache().stats().await,
    })
}

// ============================================
// Trading
// ============================================

pub async fn get_gas_price(
    State(state): State<Arc<AppState>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<GasPriceResponse> {
    let sample = state
        .trading
        .gas_price()
        .await
        .map_err(|e| service_failure(&e, &method, &uri))?;

    Ok(Json(GasPriceResponse {
        wei: sample.value.to_string(),
        timestamp: sample.timestamp_ms(),
    }))
}

pub async fn get_token_return(
    State(state): State<Arc<AppState>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    path: Result<Path<(String, String, String)>, PathRejection>,
) -> ApiResult<TokenReturnResponse> {
    let Path((from_token, to_token, amount_in)) = path.map_err(|rejection| {
        bad_request(&method, &uri, [FieldError::new("path", rejection.body_text())])
    })?;

    let from = parse_address("fromTokenAddress", &from_token);
    let to = parse_address("toTokenAddress", &to_token);
    let amount = parse_amount("amountIn", &amount_in);

    let (from, to, amount) = match (from, to, amount) {
        (Ok(from), Ok(to), Ok(amount)) => (from, to, amount),
        (from, to, amount) => {
            let details: Vec<FieldError> = [from.err(), to.err(), amount.err()]
                .into_iter()
                .flatten()
                .collect();
            return Err(bad_request(&method, &uri, details));
        }
    };

    let result = state
        .trading
        .token_return(from, to, amount)
        .await
        .map_err(|e| service_failure(&e, &method, &uri))?;

    Ok(Json(TokenReturnResponse {
        amount_out: result.amount_out.to_string(),
    }))
}

// ============================================
// Fallback
// ============================================

pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> (StatusCode, Json<ErrorResponse>) {
    let err = AppError::not_found(format!("Cannot {} {}", method, uri.path()));
    ErrorResponse::from_app_error(&err, &method, &uri).into_failure()
}
