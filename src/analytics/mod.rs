//! Read-only reports over the complaint dataset.
//!
//! Each report is one [`tally::TallyQuery`] run by a
//! [`ComplaintStore`](crate::db::ComplaintStore) as a single read, plus the
//! user count for the overall stats. Reports share no state and may run
//! concurrently.

pub mod params;
pub mod reports;
pub mod tally;

pub use reports::{
    assigned_user_stats, category_stats, department_stats, frequent_issues, monthly_trends,
    overall_stats, priority_stats, status_breakdown, user_stats, weekly_trends,
};
