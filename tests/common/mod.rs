#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use complaint_analytics::structure::{
    complaints::{AssignedTo, Complaint, Priority},
    users::User,
};
use mongodb::bson::{DateTime, oid::ObjectId};

// ── Helpers ──────────────────────────────────────────────────────────────────

pub fn day(year: i32, month: u32, day: u32) -> DateTime {
    let at = Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap();
    DateTime::from_millis(at.timestamp_millis())
}

pub fn user(name: &str) -> User {
    User {
        id: ObjectId::new(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

/// Builder over a Pending, Medium-priority complaint created 2024-01-10.
pub struct ComplaintBuilder(Complaint);

pub fn complaint(category: &str, title: &str) -> ComplaintBuilder {
    ComplaintBuilder(Complaint {
        id: ObjectId::new(),
        title: Some(title.to_string()),
        description: String::new(),
        category: Some(category.to_string()),
        priority: Some(Priority::Medium),
        status: Some("Pending".into()),
        user: Some(ObjectId::new()),
        assigned_to: None,
        created_at: day(2024, 1, 10),
        resolved_at: None,
    })
}

impl ComplaintBuilder {
    pub fn status(mut self, status: &str) -> Self {
        self.0.status = Some(status.into());
        self
    }

    pub fn priority(mut self, priority: &str) -> Self {
        self.0.priority = Some(priority.into());
        self
    }

    pub fn by(mut self, user: &User) -> Self {
        self.0.user = Some(user.id);
        self
    }

    pub fn created(mut self, at: DateTime) -> Self {
        self.0.created_at = at;
        self
    }

    pub fn resolved(mut self, at: DateTime) -> Self {
        self.0.resolved_at = Some(at);
        self
    }

    pub fn assigned(mut self, department: &str, staff_name: &str) -> Self {
        self.0.assigned_to = Some(AssignedTo {
            department: Some(department.to_string()),
            staff_name: Some(staff_name.to_string()),
        });
        self
    }

    /// Clear category, priority and status, as on a legacy document.
    pub fn bare(mut self) -> Self {
        self.0.category = None;
        self.0.priority = None;
        self.0.status = None;
        self
    }

    pub fn build(self) -> Complaint {
        self.0
    }
}
