use async_trait::async_trait;

use super::ComplaintStore;
use crate::{
    analytics::tally::{self, TallyQuery, TallyRow},
    error::{AnalyticsError, AnalyticsResult},
    structure::{complaints::Complaint, users::User},
};

/// In-process store over a fixed snapshot. Used by tests and local runs
/// without a database.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    complaints: Vec<Complaint>,
    users: Vec<User>,
    failure: Option<String>,
}

impl MemoryStore {
    pub fn new(complaints: Vec<Complaint>, users: Vec<User>) -> Self {
        Self {
            complaints,
            users,
            failure: None,
        }
    }

    /// A store whose every query fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn check(&self) -> AnalyticsResult<()> {
        match &self.failure {
            Some(message) => Err(AnalyticsError::QueryMessage(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ComplaintStore for MemoryStore {
    async fn tally(&self, query: &TallyQuery) -> AnalyticsResult<Vec<TallyRow>> {
        self.check()?;
        Ok(tally::fold(&self.complaints, &self.users, query))
    }

    async fn count_users(&self) -> AnalyticsResult<i64> {
        self.check()?;
        Ok(self.users.len() as i64)
    }
}
