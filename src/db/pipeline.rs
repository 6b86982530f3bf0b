//! Translation of a [`TallyQuery`] into a MongoDB aggregation pipeline and of
//! its output documents back into [`TallyRow`]s.

use mongodb::bson::{self, Bson, Document, doc};

use crate::{
    analytics::tally::{GroupKey, StatusTally, TallyKey, TallyQuery, TallyRow, TallySort},
    config::Constants,
    structure::{
        complaints::{Priority, Status},
        users::User,
    },
};

const REPORTER_FIELD: &str = "userDetails";

/// Stages: `$match`, optional creation-order `$sort` for `$first`, `$group`,
/// optional `$lookup`/`$unwind` join, optional minimum count, `$sort`, `$limit`.
pub fn build(query: &TallyQuery) -> Vec<Document> {
    let mut pipeline = vec![doc! { "$match": query.filter.to_document() }];

    if query.first_department {
        pipeline.push(doc! { "$sort": { "createdAt": 1, "_id": 1 } });
    }

    let mut group = doc! {
        "_id": group_id(query.key),
        "count": { "$sum": 1 },
        "pending": status_count(&Status::Pending),
        "inProgress": status_count(&Status::InProgress),
        "resolved": status_count(&Status::Resolved),
        "closed": status_count(&Status::Closed),
        "assigned": {
            "$sum": {
                "$cond": [
                    { "$and": [
                        { "$eq": [{ "$type": "$assignedTo.department" }, "string"] },
                        { "$ne": ["$assignedTo.department", ""] }
                    ] },
                    1,
                    0
                ]
            }
        },
    };
    if query.resolution_time {
        group.insert(
            "avgResolutionTime",
            doc! {
                "$avg": {
                    "$cond": [
                        { "$ne": ["$resolvedAt", null] },
                        { "$subtract": ["$resolvedAt", "$createdAt"] },
                        null
                    ]
                }
            },
        );
    }
    if query.first_department {
        group.insert("department", doc! { "$first": "$assignedTo.department" });
    }
    pipeline.push(doc! { "$group": group });

    if query.join_reporter {
        pipeline.push(doc! {
            "$lookup": {
                "from": Constants::USERS_COLLECTION,
                "localField": "_id",
                "foreignField": "_id",
                "as": REPORTER_FIELD,
            }
        });
        pipeline.push(doc! { "$unwind": format!("${REPORTER_FIELD}") });
    }

    if let Some(min_count) = query.min_count {
        pipeline.push(doc! { "$match": { "count": { "$gte": min_count } } });
    }

    pipeline.extend(sort_stages(query.sort));

    if let Some(limit) = query.limit {
        let limit = limit as i64;
        pipeline.push(doc! { "$limit": limit });
    }
    pipeline
}

fn group_id(key: GroupKey) -> Bson {
    match key {
        GroupKey::Category => Bson::from("$category"),
        GroupKey::Priority => Bson::from("$priority"),
        GroupKey::Status => Bson::from("$status"),
        GroupKey::Department => Bson::from("$assignedTo.department"),
        GroupKey::StaffName => Bson::from("$assignedTo.staffName"),
        GroupKey::Reporter => Bson::from("$user"),
        GroupKey::CategoryTitle => Bson::from(doc! { "category": "$category", "title": "$title" }),
        GroupKey::Month => Bson::from(doc! {
            "year": { "$year": "$createdAt" },
            "month": { "$month": "$createdAt" },
        }),
        GroupKey::IsoWeek => Bson::from(doc! {
            "year": { "$isoWeekYear": "$createdAt" },
            "week": { "$isoWeek": "$createdAt" },
        }),
        GroupKey::Whole => Bson::Null,
    }
}

fn status_count(status: &Status) -> Document {
    doc! { "$sum": { "$cond": [{ "$eq": ["$status", status.as_str()] }, 1, 0] } }
}

fn sort_stages(sort: TallySort) -> Vec<Document> {
    match sort {
        TallySort::CountDesc => vec![doc! { "$sort": { "count": -1, "_id": 1 } }],
        TallySort::KeyAsc => vec![doc! { "$sort": { "_id": 1 } }],
        TallySort::PriorityRank => {
            let known = [Priority::High, Priority::Medium, Priority::Low];
            rank_stages(
                known.iter().map(|p| (p.as_str(), p.rank())),
                Priority::Other(String::new()).rank(),
            )
        }
        TallySort::StatusRank => {
            let known = [
                Status::Pending,
                Status::InProgress,
                Status::Resolved,
                Status::Closed
            ];
            rank_stages(
                known.iter().map(|s| (s.as_str(), s.rank())),
                Status::Other(String::new()).rank(),
            )
        }
    }
}

fn rank_stages<'a>(known: impl Iterator<Item = (&'a str, u8)>, otherwise: u8) -> Vec<Document> {
    let branches: Vec<Document> = known
        .map(|(name, rank)| {
            let rank = i32::from(rank);
            doc! { "case": { "$eq": ["$_id", name] }, "then": rank }
        })
        .collect();
    let otherwise = i32::from(otherwise);
    vec![
        doc! {
            "$addFields": {
                "sortOrder": { "$switch": { "branches": branches, "default": otherwise } }
            }
        },
        doc! { "$sort": { "sortOrder": 1, "_id": 1 } },
        doc! { "$project": { "sortOrder": 0 } }
    ]
}

/// Read one pipeline output document. `None` when a period key is missing
/// its numeric parts.
pub fn decode_row(key: GroupKey, document: &Document) -> Option<TallyRow> {
    let id = document.get("_id");
    let key = match key {
        GroupKey::Category
        | GroupKey::Priority
        | GroupKey::Status
        | GroupKey::Department
        | GroupKey::StaffName => TallyKey::Text(text(id)),
        GroupKey::CategoryTitle => {
            let pair = id.and_then(Bson::as_document);
            TallyKey::Pair(
                text(pair.and_then(|p| p.get("category"))),
                text(pair.and_then(|p| p.get("title"))),
            )
        }
        GroupKey::Month | GroupKey::IsoWeek => {
            let period = id.and_then(Bson::as_document)?;
            let part = if key == GroupKey::Month { "month" } else { "week" };
            let year = number(period.get("year"))?;
            let within = number(period.get(part))?;
            TallyKey::Period(year as i32, within as u32)
        }
        GroupKey::Reporter => TallyKey::Reporter(id.and_then(Bson::as_object_id)),
        GroupKey::Whole => TallyKey::Whole,
    };

    let counts = StatusTally {
        total: count(document, "count"),
        pending: count(document, "pending"),
        in_progress: count(document, "inProgress"),
        resolved: count(document, "resolved"),
        closed: count(document, "closed"),
        assigned: count(document, "assigned"),
    };

    let mut row = TallyRow::new(key, counts);
    row.avg_resolution_millis = match document.get("avgResolutionTime") {
        Some(Bson::Double(v)) => Some(*v),
        Some(Bson::Int64(v)) => Some(*v as f64),
        Some(Bson::Int32(v)) => Some(f64::from(*v)),
        _ => None,
    };
    row.department = text(document.get("department"));
    row.reporter = document
        .get_document(REPORTER_FIELD)
        .ok()
        .and_then(|user| bson::from_document::<User>(user.clone()).ok());
    Some(row)
}

fn text(value: Option<&Bson>) -> Option<String> {
    match value {
        Some(Bson::String(s)) => Some(s.clone()),
        None | Some(Bson::Null) | Some(Bson::Undefined) => None,
        Some(other) => Some(other.to_string()),
    }
}

fn number(value: Option<&Bson>) -> Option<i64> {
    match value? {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(n) => Some(*n as i64),
        _ => None,
    }
}

/// `$sum` yields Int32 until it overflows into Int64.
fn count(document: &Document, field: &str) -> i64 {
    number(document.get(field)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ComplaintFilter;
    use mongodb::bson::{DateTime, oid::ObjectId};

    fn stage_names(pipeline: &[Document]) -> Vec<&str> {
        pipeline
            .iter()
            .filter_map(|stage| stage.keys().next().map(String::as_str))
            .collect()
    }

    #[test]
    fn category_pipeline_groups_with_status_counters() {
        let pipeline = build(&TallyQuery::new(GroupKey::Category));

        assert_eq!(stage_names(&pipeline), vec!["$match", "$group", "$sort"]);
        assert_eq!(pipeline[0], doc! { "$match": {} });

        let group = pipeline[1].get_document("$group").unwrap();
        assert_eq!(group.get_str("_id").unwrap(), "$category");
        assert_eq!(group.get_document("count").unwrap(), &doc! { "$sum": 1 });
        assert_eq!(
            group.get_document("inProgress").unwrap(),
            &doc! { "$sum": { "$cond": [{ "$eq": ["$status", "In-Progress"] }, 1, 0] } }
        );
        assert!(!group.contains_key("avgResolutionTime"));
        assert_eq!(pipeline[2], doc! { "$sort": { "count": -1, "_id": 1 } });
    }

    #[test]
    fn frequent_issue_pipeline_filters_then_limits() {
        let query = TallyQuery::new(GroupKey::CategoryTitle)
            .min_count(2)
            .limit(5)
            .with_resolution_time();
        let pipeline = build(&query);

        assert_eq!(
            stage_names(&pipeline),
            vec!["$match", "$group", "$match", "$sort", "$limit"]
        );
        let group = pipeline[1].get_document("$group").unwrap();
        assert_eq!(
            group.get_document("_id").unwrap(),
            &doc! { "category": "$category", "title": "$title" }
        );
        assert!(group.contains_key("avgResolutionTime"));
        assert_eq!(pipeline[2], doc! { "$match": { "count": { "$gte": 2_i64 } } });
        assert_eq!(pipeline[4], doc! { "$limit": 5_i64 });
    }

    #[test]
    fn reporter_join_runs_inside_the_pipeline() {
        let query = TallyQuery::new(GroupKey::Reporter).join_reporter().limit(10);
        let pipeline = build(&query);

        assert_eq!(
            stage_names(&pipeline),
            vec!["$match", "$group", "$lookup", "$unwind", "$sort", "$limit"]
        );
        assert_eq!(
            pipeline[2],
            doc! {
                "$lookup": {
                    "from": "users",
                    "localField": "_id",
                    "foreignField": "_id",
                    "as": "userDetails",
                }
            }
        );
        assert_eq!(pipeline[3], doc! { "$unwind": "$userDetails" });
    }

    #[test]
    fn first_department_sorts_by_creation_before_grouping() {
        let query = TallyQuery::new(GroupKey::StaffName)
            .filter(ComplaintFilter::all().with_staff_name())
            .with_first_department();
        let pipeline = build(&query);

        assert_eq!(pipeline[1], doc! { "$sort": { "createdAt": 1, "_id": 1 } });
        let group = pipeline[2].get_document("$group").unwrap();
        assert_eq!(
            group.get_document("department").unwrap(),
            &doc! { "$first": "$assignedTo.department" }
        );
    }

    #[test]
    fn rank_sort_uses_switch() {
        let pipeline = build(&TallyQuery::new(GroupKey::Priority).sort(TallySort::PriorityRank));

        assert_eq!(
            stage_names(&pipeline),
            vec!["$match", "$group", "$addFields", "$sort", "$project"]
        );
        assert_eq!(
            pipeline[2],
            doc! {
                "$addFields": {
                    "sortOrder": {
                        "$switch": {
                            "branches": [
                                { "case": { "$eq": ["$_id", "High"] }, "then": 1 },
                                { "case": { "$eq": ["$_id", "Medium"] }, "then": 2 },
                                { "case": { "$eq": ["$_id", "Low"] }, "then": 3 }
                            ],
                            "default": 4,
                        }
                    }
                }
            }
        );
        assert_eq!(pipeline[4], doc! { "$project": { "sortOrder": 0 } });
    }

    #[test]
    fn period_keys_use_calendar_operators() {
        let monthly = build(&TallyQuery::new(GroupKey::Month).sort(TallySort::KeyAsc));
        let weekly = build(&TallyQuery::new(GroupKey::IsoWeek).sort(TallySort::KeyAsc));

        let month_id = monthly[1].get_document("$group").unwrap().get_document("_id").unwrap();
        assert_eq!(
            month_id,
            &doc! { "year": { "$year": "$createdAt" }, "month": { "$month": "$createdAt" } }
        );
        let week_id = weekly[1].get_document("$group").unwrap().get_document("_id").unwrap();
        assert_eq!(
            week_id,
            &doc! { "year": { "$isoWeekYear": "$createdAt" }, "week": { "$isoWeek": "$createdAt" } }
        );
        assert_eq!(weekly[2], doc! { "$sort": { "_id": 1 } });
    }

    #[test]
    fn decodes_int32_counts_and_null_key() {
        let row = decode_row(
            GroupKey::Category,
            &doc! {
                "_id": null,
                "count": 3,
                "pending": 1,
                "inProgress": 0,
                "resolved": 2_i64,
                "closed": 0,
                "assigned": 1,
            },
        )
        .unwrap();

        assert_eq!(row.key, TallyKey::Text(None));
        assert_eq!(row.counts.total, 3);
        assert_eq!(row.counts.resolved, 2);
        assert_eq!(row.avg_resolution_millis, None);
    }

    #[test]
    fn decodes_period_and_resolution_average() {
        let row = decode_row(
            GroupKey::Month,
            &doc! {
                "_id": { "year": 2024, "month": 3 },
                "count": 2,
                "avgResolutionTime": 172_800_000.0,
            },
        )
        .unwrap();

        assert_eq!(row.key, TallyKey::Period(2024, 3));
        assert_eq!(row.avg_resolution_days(), Some(2.0));

        assert!(decode_row(GroupKey::IsoWeek, &doc! { "_id": { "year": 2024 } }).is_none());
    }

    #[test]
    fn decodes_joined_reporter() {
        let id = ObjectId::new();
        let row = decode_row(
            GroupKey::Reporter,
            &doc! {
                "_id": id,
                "count": 4,
                "userDetails": {
                    "_id": id,
                    "name": "Ann",
                    "email": "ann@example.com",
                    "password": "hash",
                    "createdAt": DateTime::from_millis(0),
                },
            },
        )
        .unwrap();

        assert_eq!(row.key, TallyKey::Reporter(Some(id)));
        let reporter = row.reporter.unwrap();
        assert_eq!(reporter.id, id);
        assert_eq!(reporter.name, "Ann");
    }
}
