use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{BidStore, TaskStore};
use crate::bids::Bid;
use crate::error::StoreError;
use crate::tasks::{Task, TaskChanges};

/// In-process task collection. Insertion order is kept.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
    unavailable: bool,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails, for exercising 500 paths.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError("memory store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        self.check()?;
        self.tasks.write().await.push(task.clone());
        Ok(())
    }

    async fn find_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        self.check()?;
        Ok(self.tasks.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn all_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.check()?;
        Ok(self.tasks.read().await.clone())
    }

    async fn tasks_by_creator(&self, creator_email: &str) -> Result<Vec<Task>, StoreError> {
        self.check()?;
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .filter(|t| t.creator_email == creator_email)
            .cloned()
            .collect())
    }

    async fn update_task(
        &self,
        id: &str,
        changes: &TaskChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.check()?;
        let mut tasks = self.tasks.write().await;
        match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                changes.apply(task);
                task.updated_at = Some(updated_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_task(&self, id: &str) -> Result<bool, StoreError> {
        self.check()?;
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        Ok(tasks.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryBidStore {
    bids: RwLock<Vec<Bid>>,
    unavailable: bool,
}

impl MemoryBidStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.bids.read().await.len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError("memory store unavailable".to_string()));
        }
        Ok(())
    }

    async fn filtered(&self, keep: impl Fn(&Bid) -> bool) -> Result<Vec<Bid>, StoreError> {
        self.check()?;
        Ok(self.bids.read().await.iter().filter(|b| keep(b)).cloned().collect())
    }
}

#[async_trait]
impl BidStore for MemoryBidStore {
    async fn insert_bid(&self, bid: &Bid) -> Result<(), StoreError> {
        self.check()?;
        self.bids.write().await.push(bid.clone());
        Ok(())
    }

    async fn bids_for_task(&self, task_id: &str) -> Result<Vec<Bid>, StoreError> {
        self.filtered(|b| b.task_id == task_id).await
    }

    async fn bids_by_bidder(&self, bidder_email: &str) -> Result<Vec<Bid>, StoreError> {
        self.filtered(|b| b.bidder_email == bidder_email).await
    }
}
