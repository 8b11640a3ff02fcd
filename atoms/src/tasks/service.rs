use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::{CreateTaskPayload, Task, UpdateTaskPayload};
use crate::error::ApiError;
use crate::store::{new_id, parse_id, TaskStore};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;
pub const FEATURED_LIMIT: usize = 6;

/// Page request with the defaults applied to absent or invalid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: positive(page).unwrap_or(DEFAULT_PAGE),
            limit: positive(limit).unwrap_or(DEFAULT_LIMIT),
        }
    }
}

fn positive(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok()).filter(|n| *n > 0)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total_tasks: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

/// Outcome of a merge update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub modified_count: u8,
}

/// Ascending by parsed deadline; tasks whose deadline does not parse go last.
pub fn by_deadline(a: &Task, b: &Task) -> Ordering {
    match (a.deadline_at(), b.deadline_at()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn task_id(raw: &str) -> Result<String, ApiError> {
    parse_id(raw).ok_or_else(|| ApiError::validation("Invalid Task ID format."))
}

/// Validate and insert a new task stamped with `now`.
pub async fn create_task(
    store: &dyn TaskStore,
    payload: CreateTaskPayload,
    now: DateTime<Utc>,
) -> Result<Task, ApiError> {
    let new = payload.validate(now.date_naive())?;

    let task = Task {
        id: new_id(),
        title: new.title,
        category: new.category,
        budget: new.budget,
        deadline: new.deadline,
        description: new.description,
        creator_email: new.creator_email,
        creator_name: new.creator_name,
        created_at: now,
        updated_at: None,
    };

    store.insert_task(&task).await?;
    tracing::info!("Created task {} for {}", task.id, task.creator_email);
    Ok(task)
}

/// One page of tasks ordered by deadline.
pub async fn list_tasks(store: &dyn TaskStore, request: PageRequest) -> Result<TaskPage, ApiError> {
    let mut tasks = store.all_tasks().await?;
    tasks.sort_by(by_deadline);

    let total_tasks = tasks.len();
    let skip = (request.page - 1).saturating_mul(request.limit);
    let tasks = tasks.into_iter().skip(skip).take(request.limit).collect();

    Ok(TaskPage {
        tasks,
        total_tasks,
        total_pages: total_tasks.div_ceil(request.limit),
        current_page: request.page,
    })
}

pub async fn list_featured_tasks(store: &dyn TaskStore) -> Result<Vec<Task>, ApiError> {
    let mut tasks = store.all_tasks().await?;
    tasks.sort_by(by_deadline);
    tasks.truncate(FEATURED_LIMIT);
    Ok(tasks)
}

/// Tasks posted by `creator_email`, newest first.
pub async fn list_tasks_by_creator(
    store: &dyn TaskStore,
    creator_email: Option<&str>,
) -> Result<Vec<Task>, ApiError> {
    let creator_email = creator_email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::validation("creatorEmail query parameter is required."))?;

    let mut tasks = store.tasks_by_creator(creator_email).await?;
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(tasks)
}

pub async fn get_task(store: &dyn TaskStore, raw_id: &str) -> Result<Task, ApiError> {
    let id = task_id(raw_id)?;
    store
        .find_task(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found."))
}

/// Merge `payload` into the task. Only fields whose value differs are
/// written; nothing is written when none do.
pub async fn update_task(
    store: &dyn TaskStore,
    raw_id: &str,
    payload: UpdateTaskPayload,
    now: DateTime<Utc>,
) -> Result<UpdateOutcome, ApiError> {
    let id = task_id(raw_id)?;
    let changes = payload.validate()?;

    let task = store
        .find_task(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found."))?;

    let changes = changes.changed_from(&task);
    if changes.is_empty() {
        return Ok(UpdateOutcome { modified_count: 0 });
    }

    if !store.update_task(&id, &changes, now).await? {
        return Err(ApiError::not_found("Task not found."));
    }
    tracing::info!("Updated task {}", id);
    Ok(UpdateOutcome { modified_count: 1 })
}

pub async fn delete_task(store: &dyn TaskStore, raw_id: &str) -> Result<(), ApiError> {
    let id = task_id(raw_id)?;
    if !store.delete_task(&id).await? {
        return Err(ApiError::not_found("Task not found."));
    }
    tracing::info!("Deleted task {}", id);
    Ok(())
}
