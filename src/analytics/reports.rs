use chrono::{DateTime, Duration, Utc};

use super::tally::{GroupKey, TallyKey, TallyQuery, TallySort};
use crate::{
    config::Constants,
    db::{
        ComplaintFilter, ComplaintStore,
        operations::{to_bson_datetime, year_bounds},
    },
    error::AnalyticsResult,
    structure::analytics::{
        AssignedUserStat, CategoryStat, DepartmentStat, FrequentIssue, MonthlyTrend, OverallStats,
        PriorityStat, StatusShare, UserStat, WeeklyTrend,
    },
    utils::{percentage, round_to},
};

/// Complaint counts per category, largest first.
pub async fn category_stats(store: &dyn ComplaintStore) -> AnalyticsResult<Vec<CategoryStat>> {
    let rows = store.tally(&TallyQuery::new(GroupKey::Category)).await?;

    Ok(rows
        .into_iter()
        .map(|row| CategoryStat {
            category: row.key.into_text(),
            count: row.counts.total,
            pending: row.counts.pending,
            in_progress: row.counts.in_progress,
            resolved: row.counts.resolved,
        })
        .collect())
}

/// Complaints created in `year`, bucketed by month. Empty months are absent.
pub async fn monthly_trends(
    store: &dyn ComplaintStore,
    year: i32,
) -> AnalyticsResult<Vec<MonthlyTrend>> {
    let Some((from, to)) = year_bounds(year) else {
        return Ok(Vec::new());
    };
    let query = TallyQuery::new(GroupKey::Month)
        .filter(ComplaintFilter::all().created_between(from, to))
        .sort(TallySort::KeyAsc);
    let rows = store.tally(&query).await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let TallyKey::Period(year, month) = row.key else {
                return None;
            };
            Some(MonthlyTrend {
                year,
                month,
                count: row.counts.total,
                pending: row.counts.pending,
                in_progress: row.counts.in_progress,
                resolved: row.counts.resolved,
            })
        })
        .collect())
}

/// `(category, title)` pairs reported at least twice, most reported first.
pub async fn frequent_issues(
    store: &dyn ComplaintStore,
    limit: usize,
) -> AnalyticsResult<Vec<FrequentIssue>> {
    let query = TallyQuery::new(GroupKey::CategoryTitle)
        .min_count(Constants::FREQUENT_ISSUE_THRESHOLD)
        .limit(limit)
        .with_resolution_time();
    let rows = store.tally(&query).await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let avg_resolution_time = row.avg_resolution_days();
            let TallyKey::Pair(category, title) = row.key else {
                return None;
            };
            Some(FrequentIssue {
                category,
                title,
                count: row.counts.total,
                avg_resolution_time,
            })
        })
        .collect())
}

/// Complaint counts per priority, High first.
pub async fn priority_stats(store: &dyn ComplaintStore) -> AnalyticsResult<Vec<PriorityStat>> {
    let query = TallyQuery::new(GroupKey::Priority).sort(TallySort::PriorityRank);
    let rows = store.tally(&query).await?;

    Ok(rows
        .into_iter()
        .map(|row| PriorityStat {
            priority: row.key.into_text(),
            count: row.counts.total,
            pending: row.counts.pending,
            in_progress: row.counts.in_progress,
            resolved: row.counts.resolved,
        })
        .collect())
}

/// Headline counters. Complaint figures come from one grouped read so they
/// describe the same snapshot; the user count is a separate collection.
pub async fn overall_stats(store: &dyn ComplaintStore) -> AnalyticsResult<OverallStats> {
    let query = TallyQuery::new(GroupKey::Whole).with_resolution_time();

    let (rows, total_users) = tokio::try_join!(store.tally(&query), store.count_users())?;
    let whole = rows.into_iter().next();
    let counts = whole.as_ref().map(|row| row.counts).unwrap_or_default();
    let avg_resolution_days = whole
        .and_then(|row| row.avg_resolution_days())
        .map(|days| round_to(days, 1))
        .unwrap_or(0.0);

    Ok(OverallStats {
        total_complaints: counts.total,
        total_users,
        pending_complaints: counts.pending,
        in_progress_complaints: counts.in_progress,
        resolved_complaints: counts.resolved,
        closed_complaints: counts.closed,
        assigned_complaints: counts.assigned,
        unassigned_complaints: counts.total - counts.assigned,
        avg_resolution_days,
        resolution_rate: percentage(counts.finished(), counts.total),
    })
}

/// Workload per assigned department, busiest first.
pub async fn department_stats(
    store: &dyn ComplaintStore,
) -> AnalyticsResult<Vec<DepartmentStat>> {
    let query = TallyQuery::new(GroupKey::Department)
        .filter(ComplaintFilter::all().with_department());
    let rows = store.tally(&query).await?;

    Ok(rows
        .into_iter()
        .map(|row| DepartmentStat {
            department: row.key.into_text().unwrap_or_default(),
            total: row.counts.total,
            pending: row.counts.pending,
            in_progress: row.counts.in_progress,
            resolved: row.counts.resolved,
            closed: row.counts.closed,
        })
        .collect())
}

/// Top reporters joined to their user record.
///
/// Complaints whose `user` no longer resolves to a user document are left out
/// of the ranking entirely.
pub async fn user_stats(store: &dyn ComplaintStore) -> AnalyticsResult<Vec<UserStat>> {
    let query = TallyQuery::new(GroupKey::Reporter)
        .join_reporter()
        .limit(Constants::TOP_REPORTERS);
    let rows = store.tally(&query).await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let user = row.reporter?;
            Some(UserStat {
                user_id: user.id.to_hex(),
                name: user.name,
                email: user.email,
                total_complaints: row.counts.total,
                pending: row.counts.pending,
                resolved: row.counts.resolved,
            })
        })
        .collect())
}

/// Workload per staff member, busiest first. The department shown is the
/// one on the staff member's earliest assigned complaint.
pub async fn assigned_user_stats(
    store: &dyn ComplaintStore,
) -> AnalyticsResult<Vec<AssignedUserStat>> {
    let query = TallyQuery::new(GroupKey::StaffName)
        .filter(ComplaintFilter::all().with_staff_name())
        .with_first_department();
    let rows = store.tally(&query).await?;

    Ok(rows
        .into_iter()
        .map(|row| AssignedUserStat {
            staff_name: row.key.into_text().unwrap_or_default(),
            department: row.department.filter(|d| !d.is_empty()),
            total_assigned: row.counts.total,
            pending: row.counts.pending,
            in_progress: row.counts.in_progress,
            resolved: row.counts.resolved,
        })
        .collect())
}

/// Share of each status in the whole dataset, in workflow order.
pub async fn status_breakdown(store: &dyn ComplaintStore) -> AnalyticsResult<Vec<StatusShare>> {
    let query = TallyQuery::new(GroupKey::Status).sort(TallySort::StatusRank);
    let rows = store.tally(&query).await?;

    let total: i64 = rows.iter().map(|row| row.counts.total).sum();

    Ok(rows
        .into_iter()
        .map(|row| StatusShare {
            count: row.counts.total,
            percentage: percentage(row.counts.total, total),
            status: row.key.into_text(),
        })
        .collect())
}

/// Complaints created in the last `weeks * 7` days, bucketed by ISO week.
pub async fn weekly_trends(
    store: &dyn ComplaintStore,
    weeks: i64,
    now: DateTime<Utc>,
) -> AnalyticsResult<Vec<WeeklyTrend>> {
    let start = now - Duration::days(weeks * 7);
    let query = TallyQuery::new(GroupKey::IsoWeek)
        .filter(
            ComplaintFilter::all().created_between(to_bson_datetime(start), to_bson_datetime(now)),
        )
        .sort(TallySort::KeyAsc);
    let rows = store.tally(&query).await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let TallyKey::Period(year, week) = row.key else {
                return None;
            };
            Some(WeeklyTrend {
                year,
                week,
                count: row.counts.total,
                resolved: row.counts.finished(),
            })
        })
        .collect())
}
