use chrono::{TimeZone, Utc};
use mongodb::bson::{DateTime, Document, doc};

use crate::structure::complaints::Complaint;

/// Conditions a complaint read can be narrowed by.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplaintFilter {
    pub created_from: Option<DateTime>,
    pub created_to: Option<DateTime>,
    pub has_department: bool,
    pub has_staff_name: bool,
}

impl ComplaintFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Inclusive on both ends.
    pub fn created_between(mut self, from: DateTime, to: DateTime) -> Self {
        self.created_from = Some(from);
        self.created_to = Some(to);
        self
    }

    pub fn with_department(mut self) -> Self {
        self.has_department = true;
        self
    }

    pub fn with_staff_name(mut self) -> Self {
        self.has_staff_name = true;
        self
    }

    /// MongoDB filter document for this set of conditions.
    pub fn to_document(&self) -> Document {
        let mut filter = doc! {};

        let mut created = doc! {};
        if let Some(from) = self.created_from {
            created.insert("$gte", from);
        }
        if let Some(to) = self.created_to {
            created.insert("$lte", to);
        }
        if !created.is_empty() {
            filter.insert("createdAt", created);
        }

        // `$type` rather than `$exists` so an explicit null stays out.
        if self.has_department {
            filter.insert("assignedTo.department", doc! { "$type": "string", "$ne": "" });
        }

        if self.has_staff_name {
            filter.insert("assignedTo.staffName", doc! { "$type": "string", "$ne": "" });
        }

        filter
    }

    /// Same predicate as [`ComplaintFilter::to_document`], evaluated in process.
    pub fn matches(&self, complaint: &Complaint) -> bool {
        let created = complaint.created_at.timestamp_millis();
        if self
            .created_from
            .is_some_and(|from| created < from.timestamp_millis())
        {
            return false;
        }
        if self
            .created_to
            .is_some_and(|to| created > to.timestamp_millis())
        {
            return false;
        }
        if self.has_department && complaint.department().is_none() {
            return false;
        }
        if self.has_staff_name && complaint.staff_name().is_none() {
            return false;
        }
        true
    }
}

/// Convert a chrono instant to a BSON date.
pub fn to_bson_datetime(at: chrono::DateTime<Utc>) -> DateTime {
    DateTime::from_millis(at.timestamp_millis())
}

/// `[Jan 1 00:00:00, Dec 31 23:59:59]` of `year`, UTC.
pub fn year_bounds(year: i32) -> Option<(DateTime, DateTime)> {
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
    let end = Utc.with_ymd_and_hms(year, 12, 31, 23, 59, 59).single()?;
    Some((to_bson_datetime(start), to_bson_datetime(end)))
}
