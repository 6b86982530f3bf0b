use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, Database,
    bson::{Document, doc},
};
use tracing::{debug, info};

use super::{ComplaintStore, pipeline};
use crate::{
    analytics::tally::{TallyQuery, TallyRow},
    config::{AppConfig, Constants},
    error::AnalyticsResult,
};

/// Get MongoDB database connection
pub async fn get_database(config: &AppConfig) -> AnalyticsResult<Database> {
    let client = Client::with_uri_str(&config.mongo_db_url).await?;
    info!(database = %config.mongo_db_name, "connected to MongoDB");
    Ok(client.database(&config.mongo_db_name))
}

/// Get a collection from the database
pub fn get_collection<T: Send + Sync>(db: &Database, name: &str) -> Collection<T> {
    db.collection(name)
}

/// Store backed by the `complaints` and `users` collections. Every report
/// runs server-side as one aggregation pipeline.
#[derive(Clone)]
pub struct MongoStore {
    complaints: Collection<Document>,
    users: Collection<Document>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            complaints: get_collection(db, Constants::COMPLAINTS_COLLECTION),
            users: get_collection(db, Constants::USERS_COLLECTION),
        }
    }

    pub async fn connect(config: &AppConfig) -> AnalyticsResult<Self> {
        let db = get_database(config).await?;
        Ok(Self::new(&db))
    }
}

#[async_trait]
impl ComplaintStore for MongoStore {
    async fn tally(&self, query: &TallyQuery) -> AnalyticsResult<Vec<TallyRow>> {
        let stages = pipeline::build(query);
        debug!(key = ?query.key, stages = stages.len(), "running tally pipeline");

        let mut cursor = self.complaints.aggregate(stages).await?;
        let mut rows = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            match pipeline::decode_row(query.key, &document) {
                Some(row) => rows.push(row),
                None => debug!(%document, "skipping group with malformed key"),
            }
        }
        Ok(rows)
    }

    async fn count_users(&self) -> AnalyticsResult<i64> {
        let count = self.users.count_documents(doc! {}).await?;
        Ok(count as i64)
    }
}
