//! Complaint analytics API.
//!
//! Administrator-only reporting endpoints over the complaint and user
//! collections: category and priority breakdowns, monthly and weekly trends,
//! recurring issues, resolution rates and per-department and per-staff
//! workloads.

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod structure;
pub mod utils;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::ComplaintStore,
    handlers::{analytics as reports, health::health_check},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ComplaintStore>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn ComplaintStore>, jwt_secret: &str) -> Self {
        Self {
            store,
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let analytics = Router::new()
        .route("/category-stats", get(reports::get_category_stats))
        .route("/monthly-trends", get(reports::get_monthly_trends))
        .route("/frequent-issues", get(reports::get_frequent_issues))
        .route("/priority-stats", get(reports::get_priority_stats))
        .route("/overall-stats", get(reports::get_overall_stats))
        .route("/department-stats", get(reports::get_department_stats))
        .route("/user-stats", get(reports::get_user_stats))
        .route("/assigned-user-stats", get(reports::get_assigned_user_stats))
        .route("/status-breakdown", get(reports::get_status_breakdown))
        .route("/weekly-trends", get(reports::get_weekly_trends));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/analytics", analytics)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
