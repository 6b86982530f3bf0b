use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub mod jwt;

/// Helper to create error response
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"success": false, "message": message}))).into_response()
}

/// Helper to create success response
pub fn success_response<T: serde::Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(json!({"success": true, "data": data}))).into_response()
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        round_to(part as f64 / whole as f64 * 100.0, 2)
    } else {
        0.0
    }
}
