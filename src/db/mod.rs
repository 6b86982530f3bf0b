use async_trait::async_trait;

use crate::{
    analytics::tally::{TallyQuery, TallyRow},
    error::AnalyticsResult,
};

pub mod memory;
pub mod mongo;
pub mod operations;
pub mod pipeline;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use operations::ComplaintFilter;

/// Read-only view over the complaint and user collections.
#[async_trait]
pub trait ComplaintStore: Send + Sync {
    /// Run one grouped count over the complaints, as a single read.
    async fn tally(&self, query: &TallyQuery) -> AnalyticsResult<Vec<TallyRow>>;

    async fn count_users(&self) -> AnalyticsResult<i64>;
}
