use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    /// `null` groups complaints with no category.
    pub category: Option<String>,
    pub count: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub resolved: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    pub year: i32,
    pub month: u32,
    pub count: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub resolved: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequentIssue {
    pub category: Option<String>,
    pub title: Option<String>,
    pub count: i64,
    /// Mean days to resolution over the resolved members, `None` if none resolved.
    pub avg_resolution_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityStat {
    pub priority: Option<String>,
    pub count: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub resolved: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_complaints: i64,
    pub total_users: i64,
    pub pending_complaints: i64,
    pub in_progress_complaints: i64,
    pub resolved_complaints: i64,
    pub closed_complaints: i64,
    pub assigned_complaints: i64,
    pub unassigned_complaints: i64,
    pub avg_resolution_days: f64,
    pub resolution_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStat {
    pub department: String,
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStat {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub total_complaints: i64,
    pub pending: i64,
    pub resolved: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedUserStat {
    pub staff_name: String,
    pub department: Option<String>,
    pub total_assigned: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub resolved: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusShare {
    pub status: Option<String>,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrend {
    /// ISO week-numbering year.
    pub year: i32,
    /// ISO week, 1 to 53.
    pub week: u32,
    pub count: i64,
    /// Complaints now Resolved or Closed.
    pub resolved: i64,
}
