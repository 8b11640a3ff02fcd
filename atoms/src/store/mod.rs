//! Store port for the two collections.
//!
//! Services only see these traits. The DynamoDB adapter is what runs in
//! Lambda; the in-memory adapter backs tests. Nothing here is
//! transactional: a read followed by a write can interleave with other
//! requests.

mod dynamo;
#[cfg(any(test, feature = "test-helpers"))]
mod memory;

pub use dynamo::{DynamoBidStore, DynamoTaskStore};
#[cfg(any(test, feature = "test-helpers"))]
pub use memory::{MemoryBidStore, MemoryTaskStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::bids::Bid;
use crate::error::StoreError;
use crate::tasks::{Task, TaskChanges};

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: &Task) -> Result<(), StoreError>;

    async fn find_task(&self, id: &str) -> Result<Option<Task>, StoreError>;

    /// Every task, unordered.
    async fn all_tasks(&self) -> Result<Vec<Task>, StoreError>;

    async fn tasks_by_creator(&self, creator_email: &str) -> Result<Vec<Task>, StoreError>;

    /// Set only the fields in `changes`, plus `updatedAt`, on an existing
    /// task. Concurrent updates to different fields both survive. `false`
    /// when no task has that id.
    async fn update_task(
        &self,
        id: &str,
        changes: &TaskChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// `false` when no task has that id.
    async fn delete_task(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait BidStore: Send + Sync {
    async fn insert_bid(&self, bid: &Bid) -> Result<(), StoreError>;

    async fn bids_for_task(&self, task_id: &str) -> Result<Vec<Bid>, StoreError>;

    async fn bids_by_bidder(&self, bidder_email: &str) -> Result<Vec<Bid>, StoreError>;
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Canonical form of a record id, or `None` if `raw` is not one.
pub fn parse_id(raw: &str) -> Option<String> {
    Uuid::parse_str(raw.trim()).ok().map(|id| id.to_string())
}
