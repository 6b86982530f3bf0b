use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error};

use crate::{
    AppState,
    analytics::{
        self,
        params::{limit_param, weeks_param, year_param},
    },
    error::AnalyticsResult,
    middleware::auth::AdminUser,
    utils::success_response,
};

/// Wrap a report result in the response envelope.
fn respond<T: Serialize>(report: &str, admin: &AdminUser, result: AnalyticsResult<T>) -> Response {
    match result {
        Ok(data) => {
            debug!(report, admin = %admin.user_id, "report served");
            success_response(StatusCode::OK, data)
        }
        Err(e) => {
            error!(report, error = %e, "report query failed");
            e.into_response()
        }
    }
}

pub async fn get_category_stats(
    admin: AdminUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let result = analytics::category_stats(state.store.as_ref()).await;
    respond("category_stats", &admin, result)
}

pub async fn get_monthly_trends(
    admin: AdminUser,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let year = year_param(&params, Utc::now());
    let result = analytics::monthly_trends(state.store.as_ref(), year).await;
    respond("monthly_trends", &admin, result)
}

pub async fn get_frequent_issues(
    admin: AdminUser,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let limit = limit_param(&params);
    let result = analytics::frequent_issues(state.store.as_ref(), limit).await;
    respond("frequent_issues", &admin, result)
}

pub async fn get_priority_stats(
    admin: AdminUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let result = analytics::priority_stats(state.store.as_ref()).await;
    respond("priority_stats", &admin, result)
}

pub async fn get_overall_stats(
    admin: AdminUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let result = analytics::overall_stats(state.store.as_ref()).await;
    respond("overall_stats", &admin, result)
}

pub async fn get_department_stats(
    admin: AdminUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let result = analytics::department_stats(state.store.as_ref()).await;
    respond("department_stats", &admin, result)
}

pub async fn get_user_stats(admin: AdminUser, State(state): State<AppState>) -> impl IntoResponse {
    let result = analytics::user_stats(state.store.as_ref()).await;
    respond("user_stats", &admin, result)
}

pub async fn get_assigned_user_stats(
    admin: AdminUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let result = analytics::assigned_user_stats(state.store.as_ref()).await;
    respond("assigned_user_stats", &admin, result)
}

pub async fn get_status_breakdown(
    admin: AdminUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let result = analytics::status_breakdown(state.store.as_ref()).await;
    respond("status_breakdown", &admin, result)
}

pub async fn get_weekly_trends(
    admin: AdminUser,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let weeks = weeks_param(&params);
    let result = analytics::weekly_trends(state.store.as_ref(), weeks, Utc::now()).await;
    respond("weekly_trends", &admin, result)
}
