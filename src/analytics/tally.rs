//! Grouped status counts, the one aggregation every report is built from.
//!
//! A [`TallyQuery`] names the complaints to read, the key to bucket them by,
//! the optional accumulators to carry and how to order the buckets. The
//! MongoDB store runs it server-side as an aggregation pipeline
//! (`db::pipeline`); [`fold`] evaluates the same query in process over a
//! snapshot for the in-memory store.

use std::collections::BTreeMap;

use chrono::Datelike;
use mongodb::bson::oid::ObjectId;

use crate::{
    config::Constants,
    db::ComplaintFilter,
    structure::{
        complaints::{Complaint, Priority, Status},
        users::User,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Category,
    Priority,
    Status,
    Department,
    StaffName,
    /// The submitting user.
    Reporter,
    CategoryTitle,
    /// `(year, month)` of `createdAt`.
    Month,
    /// `(ISO week-year, ISO week)` of `createdAt`.
    IsoWeek,
    /// One bucket for everything matched.
    Whole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallySort {
    /// Largest buckets first, ties by ascending key.
    CountDesc,
    KeyAsc,
    /// High, Medium, Low, then anything else.
    PriorityRank,
    /// Pending, In-Progress, Resolved, Closed, then anything else.
    StatusRank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TallyQuery {
    pub filter: ComplaintFilter,
    pub key: GroupKey,
    pub sort: TallySort,
    /// Buckets smaller than this are dropped after grouping.
    pub min_count: Option<i64>,
    pub limit: Option<usize>,
    pub resolution_time: bool,
    pub first_department: bool,
    /// Inner join of `Reporter` buckets to the users collection.
    pub join_reporter: bool,
}

impl TallyQuery {
    pub fn new(key: GroupKey) -> Self {
        Self {
            filter: ComplaintFilter::all(),
            key,
            sort: TallySort::CountDesc,
            min_count: None,
            limit: None,
            resolution_time: false,
            first_department: false,
            join_reporter: false,
        }
    }

    pub fn filter(mut self, filter: ComplaintFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn sort(mut self, sort: TallySort) -> Self {
        self.sort = sort;
        self
    }

    pub fn min_count(mut self, min_count: i64) -> Self {
        self.min_count = Some(min_count);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Carry the mean `resolvedAt - createdAt` of resolved members.
    pub fn with_resolution_time(mut self) -> Self {
        self.resolution_time = true;
        self
    }

    /// Carry the department of the earliest-created member.
    pub fn with_first_department(mut self) -> Self {
        self.first_department = true;
        self
    }

    pub fn join_reporter(mut self) -> Self {
        self.join_reporter = true;
        self
    }
}

/// Value a bucket is keyed by. Missing or null fields key as `None`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TallyKey {
    Text(Option<String>),
    Pair(Option<String>, Option<String>),
    Period(i32, u32),
    Reporter(Option<ObjectId>),
    Whole,
}

impl TallyKey {
    pub fn text(&self) -> Option<&str> {
        match self {
            TallyKey::Text(text) => text.as_deref(),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            TallyKey::Text(text) => text,
            _ => None,
        }
    }
}

/// Per-status counters for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTally {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
    /// Members with a non-empty department assignment.
    pub assigned: i64,
}

impl StatusTally {
    pub fn add(&mut self, complaint: &Complaint) {
        self.total += 1;
        match complaint.status {
            Some(Status::Pending) => self.pending += 1,
            Some(Status::InProgress) => self.in_progress += 1,
            Some(Status::Resolved) => self.resolved += 1,
            Some(Status::Closed) => self.closed += 1,
            Some(Status::Other(_)) | None => {}
        }
        if complaint.department().is_some() {
            self.assigned += 1;
        }
    }

    /// Resolved or Closed.
    pub fn finished(&self) -> i64 {
        self.resolved + self.closed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TallyRow {
    pub key: TallyKey,
    pub counts: StatusTally,
    /// Mean resolution time in milliseconds, when requested and any member resolved.
    pub avg_resolution_millis: Option<f64>,
    /// Raw department of the earliest-created member, when requested.
    pub department: Option<String>,
    /// Joined user record, when requested.
    pub reporter: Option<User>,
}

impl TallyRow {
    pub fn new(key: TallyKey, counts: StatusTally) -> Self {
        Self {
            key,
            counts,
            avg_resolution_millis: None,
            department: None,
            reporter: None,
        }
    }

    pub fn avg_resolution_days(&self) -> Option<f64> {
        self.avg_resolution_millis
            .map(|millis| millis / Constants::MILLIS_PER_DAY)
    }
}

impl GroupKey {
    fn of(self, complaint: &Complaint) -> Option<TallyKey> {
        let assigned = complaint.assigned_to.as_ref();
        let key = match self {
            GroupKey::Category => TallyKey::Text(complaint.category.clone()),
            GroupKey::Priority => {
                TallyKey::Text(complaint.priority.as_ref().map(|p| p.as_str().to_string()))
            }
            GroupKey::Status => {
                TallyKey::Text(complaint.status.as_ref().map(|s| s.as_str().to_string()))
            }
            GroupKey::Department => TallyKey::Text(assigned.and_then(|a| a.department.clone())),
            GroupKey::StaffName => TallyKey::Text(assigned.and_then(|a| a.staff_name.clone())),
            GroupKey::Reporter => TallyKey::Reporter(complaint.user),
            GroupKey::CategoryTitle => {
                TallyKey::Pair(complaint.category.clone(), complaint.title.clone())
            }
            GroupKey::Month => {
                let at = complaint.created_at_utc()?;
                TallyKey::Period(at.year(), at.month())
            }
            GroupKey::IsoWeek => {
                let week = complaint.created_at_utc()?.iso_week();
                TallyKey::Period(week.year(), week.week())
            }
            GroupKey::Whole => TallyKey::Whole,
        };
        Some(key)
    }
}

/// Sort position of a key under a rank policy.
pub fn rank(sort: TallySort, key: &TallyKey) -> u8 {
    match sort {
        TallySort::PriorityRank => key.text().map_or(4, |p| Priority::from(p).rank()),
        TallySort::StatusRank => key.text().map_or(5, |s| Status::from(s).rank()),
        TallySort::CountDesc | TallySort::KeyAsc => 0,
    }
}

#[derive(Default)]
struct Bucket {
    counts: StatusTally,
    resolved_millis: f64,
    resolved_count: i64,
    department: Option<String>,
}

impl Bucket {
    fn add(&mut self, complaint: &Complaint) {
        if self.counts.total == 0 {
            self.department = complaint
                .assigned_to
                .as_ref()
                .and_then(|a| a.department.clone());
        }
        self.counts.add(complaint);
        if let Some(millis) = complaint.resolution_millis() {
            self.resolved_millis += millis as f64;
            self.resolved_count += 1;
        }
    }

    fn into_row(self, key: TallyKey, query: &TallyQuery) -> TallyRow {
        let mut row = TallyRow::new(key, self.counts);
        if query.resolution_time && self.resolved_count > 0 {
            row.avg_resolution_millis = Some(self.resolved_millis / self.resolved_count as f64);
        }
        if query.first_department {
            row.department = self.department;
        }
        row
    }
}

/// Evaluate `query` in process, in the same stage order as the pipeline:
/// match, group, join, minimum count, sort, limit.
pub fn fold(complaints: &[Complaint], users: &[User], query: &TallyQuery) -> Vec<TallyRow> {
    let mut matching: Vec<&Complaint> = complaints
        .iter()
        .filter(|c| query.filter.matches(c))
        .collect();
    matching.sort_by_key(|c| (c.created_at, c.id));

    let mut buckets: BTreeMap<TallyKey, Bucket> = BTreeMap::new();
    for complaint in matching {
        if let Some(key) = query.key.of(complaint) {
            buckets.entry(key).or_default().add(complaint);
        }
    }

    let mut rows: Vec<TallyRow> = buckets
        .into_iter()
        .map(|(key, bucket)| bucket.into_row(key, query))
        .collect();

    if query.join_reporter {
        rows = rows
            .into_iter()
            .filter_map(|mut row| {
                let TallyKey::Reporter(Some(id)) = row.key else {
                    return None;
                };
                row.reporter = Some(users.iter().find(|u| u.id == id)?.clone());
                Some(row)
            })
            .collect();
    }

    if let Some(min_count) = query.min_count {
        rows.retain(|row| row.counts.total >= min_count);
    }

    match query.sort {
        TallySort::CountDesc => rows.sort_by(|a, b| b.counts.total.cmp(&a.counts.total)),
        TallySort::KeyAsc => {}
        TallySort::PriorityRank | TallySort::StatusRank => {
            rows.sort_by_key(|row| rank(query.sort, &row.key))
        }
    }

    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::complaints::AssignedTo;
    use mongodb::bson::DateTime;

    fn complaint(category: &str, status: &str) -> Complaint {
        Complaint {
            id: ObjectId::new(),
            title: Some("t".into()),
            description: String::new(),
            category: Some(category.into()),
            priority: Some(Priority::Low),
            status: Some(status.into()),
            user: Some(ObjectId::new()),
            assigned_to: None,
            created_at: DateTime::from_millis(0),
            resolved_at: None,
        }
    }

    fn text(value: &str) -> TallyKey {
        TallyKey::Text(Some(value.into()))
    }

    #[test]
    fn counts_statuses_per_bucket() {
        let complaints = vec![
            complaint("Billing", "Pending"),
            complaint("Billing", "Pending"),
            complaint("Billing", "Resolved"),
            complaint("Service", "Closed"),
        ];

        let rows = fold(&complaints, &[], &TallyQuery::new(GroupKey::Category));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, text("Billing"));
        assert_eq!(
            rows[0].counts,
            StatusTally {
                total: 3,
                pending: 2,
                in_progress: 0,
                resolved: 1,
                closed: 0,
                assigned: 0,
            }
        );
        assert_eq!(rows[1].counts.finished(), 1);
    }

    #[test]
    fn unknown_status_counts_only_in_total() {
        let mut missing = complaint("IT", "Pending");
        missing.status = None;
        let complaints = vec![complaint("IT", "Escalated"), missing];

        let rows = fold(&complaints, &[], &TallyQuery::new(GroupKey::Category));

        let counts = rows[0].counts;
        assert_eq!(counts.total, 2);
        assert_eq!(counts.pending + counts.in_progress + counts.resolved + counts.closed, 0);
    }

    #[test]
    fn missing_fields_share_a_null_bucket() {
        let mut no_category = complaint("IT", "Pending");
        no_category.category = None;
        let complaints = vec![complaint("IT", "Pending"), no_category];

        let rows = fold(
            &complaints,
            &[],
            &TallyQuery::new(GroupKey::Category).sort(TallySort::KeyAsc),
        );

        let keys: Vec<&TallyKey> = rows.iter().map(|r| &r.key).collect();
        assert_eq!(keys, vec![&TallyKey::Text(None), &text("IT")]);
    }

    #[test]
    fn ties_keep_key_order() {
        let complaints = vec![
            complaint("Zoning", "Pending"),
            complaint("Access", "Pending"),
            complaint("Metro", "Pending"),
            complaint("Metro", "Pending"),
        ];

        let rows = fold(&complaints, &[], &TallyQuery::new(GroupKey::Category));

        let keys: Vec<Option<&str>> = rows.iter().map(|r| r.key.text()).collect();
        assert_eq!(keys, vec![Some("Metro"), Some("Access"), Some("Zoning")]);
    }

    #[test]
    fn priority_rank_puts_unknown_last() {
        let mut high = complaint("IT", "Pending");
        high.priority = Some(Priority::High);
        let mut odd = complaint("IT", "Pending");
        odd.priority = Some(Priority::Other("Urgent".into()));
        let mut missing = complaint("IT", "Pending");
        missing.priority = None;
        let complaints = vec![complaint("IT", "Pending"), odd, high, missing];

        let rows = fold(
            &complaints,
            &[],
            &TallyQuery::new(GroupKey::Priority).sort(TallySort::PriorityRank),
        );

        let keys: Vec<Option<&str>> = rows.iter().map(|r| r.key.text()).collect();
        assert_eq!(keys, vec![Some("High"), Some("Low"), None, Some("Urgent")]);
    }

    #[test]
    fn resolution_average_ignores_open_members() {
        let mut resolved = complaint("IT", "Resolved");
        resolved.resolved_at = Some(DateTime::from_millis(2 * 86_400_000));
        let complaints = vec![resolved, complaint("IT", "Pending")];

        let query = TallyQuery::new(GroupKey::Category).with_resolution_time();
        let rows = fold(&complaints, &[], &query);
        assert_eq!(rows[0].counts.total, 2);
        assert_eq!(rows[0].avg_resolution_days(), Some(2.0));

        let rows = fold(&complaints[1..], &[], &query);
        assert_eq!(rows[0].avg_resolution_days(), None);
    }

    #[test]
    fn first_department_follows_creation_order() {
        let mut late = complaint("IT", "Resolved");
        late.created_at = DateTime::from_millis(2_000);
        late.assigned_to = Some(AssignedTo {
            department: Some("Facilities".into()),
            staff_name: Some("Ada".into()),
        });
        let mut early = complaint("IT", "Pending");
        early.created_at = DateTime::from_millis(1_000);
        early.assigned_to = Some(AssignedTo {
            department: Some("Network".into()),
            staff_name: Some("Ada".into()),
        });

        let rows = fold(
            &[late, early],
            &[],
            &TallyQuery::new(GroupKey::StaffName).with_first_department(),
        );

        assert_eq!(rows[0].department.as_deref(), Some("Network"));
        assert_eq!(rows[0].counts.total, 2);
        assert_eq!(rows[0].counts.assigned, 2);
    }

    #[test]
    fn reporter_join_drops_unknown_users_before_limit() {
        let known = User {
            id: ObjectId::new(),
            name: "Ann".into(),
            email: "ann@example.com".into(),
        };
        let mut mine = complaint("IT", "Pending");
        mine.user = Some(known.id);
        let mut orphan_a = complaint("IT", "Pending");
        let orphan_id = ObjectId::new();
        orphan_a.user = Some(orphan_id);
        let mut orphan_b = orphan_a.clone();
        orphan_b.id = ObjectId::new();

        let rows = fold(
            &[mine, orphan_a, orphan_b],
            &[known.clone()],
            &TallyQuery::new(GroupKey::Reporter).join_reporter().limit(1),
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reporter.as_ref(), Some(&known));
    }

    #[test]
    fn min_count_applies_before_limit() {
        let complaints = vec![
            complaint("A", "Pending"),
            complaint("B", "Pending"),
            complaint("B", "Pending"),
            complaint("C", "Pending"),
            complaint("C", "Pending"),
        ];

        let rows = fold(
            &complaints,
            &[],
            &TallyQuery::new(GroupKey::Category).min_count(2).limit(5),
        );

        let keys: Vec<Option<&str>> = rows.iter().map(|r| r.key.text()).collect();
        assert_eq!(keys, vec![Some("B"), Some("C")]);
    }
}
