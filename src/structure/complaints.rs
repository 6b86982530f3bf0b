use std::fmt;

use chrono::Utc;
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Deserializer, Serialize};

/// Complaint workflow state. Values outside the known set are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Pending,
    InProgress,
    Resolved,
    Closed,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In-Progress",
            Status::Resolved => "Resolved",
            Status::Closed => "Closed",
            Status::Other(s) => s,
        }
    }

    /// Fixed display order used by the status breakdown.
    pub fn rank(&self) -> u8 {
        match self {
            Status::Pending => 1,
            Status::InProgress => 2,
            Status::Resolved => 3,
            Status::Closed => 4,
            Status::Other(_) => 5,
        }
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Pending" => Status::Pending,
            "In-Progress" => Status::InProgress,
            "Resolved" => Status::Resolved,
            "Closed" => Status::Closed,
            _ => Status::Other(value),
        }
    }
}

impl From<&str> for Status {
    fn from(value: &str) -> Self {
        Status::from(value.to_string())
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    High,
    Medium,
    Low,
    Other(String),
}

impl Priority {
    pub fn as_str(&self) -> &str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Other(s) => s,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
            Priority::Other(_) => 4,
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        match value.as_str() {
            "High" => Priority::High,
            "Medium" => Priority::Medium,
            "Low" => Priority::Low,
            _ => Priority::Other(value),
        }
    }
}

impl From<&str> for Priority {
    fn from(value: &str) -> Self {
        Priority::from(value.to_string())
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTo {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub staff_name: Option<String>,
}

/// Complaint document as written by the submission and triage workflows.
///
/// Only `_id` and `createdAt` are required. Other fields may be missing or
/// null on legacy documents; those read as `None` and group under a null key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    /// `None` is counted like an unrecognised status: in totals only.
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub user: Option<ObjectId>,
    #[serde(default)]
    pub assigned_to: Option<AssignedTo>,
    pub created_at: DateTime,
    #[serde(default)]
    pub resolved_at: Option<DateTime>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Complaint {
    pub fn department(&self) -> Option<&str> {
        self.assigned_to
            .as_ref()
            .and_then(|a| a.department.as_deref())
            .filter(|d| !d.is_empty())
    }

    pub fn staff_name(&self) -> Option<&str> {
        self.assigned_to
            .as_ref()
            .and_then(|a| a.staff_name.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn created_at_utc(&self) -> Option<chrono::DateTime<Utc>> {
        chrono::DateTime::from_timestamp_millis(self.created_at.timestamp_millis())
    }

    /// Milliseconds between creation and resolution, if resolved.
    pub fn resolution_millis(&self) -> Option<i64> {
        self.resolved_at
            .map(|resolved| resolved.timestamp_millis() - self.created_at.timestamp_millis())
    }
}
