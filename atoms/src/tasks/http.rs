use chrono::Utc;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde_json::json;

use super::model::{CreateTaskPayload, UpdateTaskPayload};
use super::service::{self, PageRequest};
use crate::fields::parse_body;
use crate::respond;
use crate::store::TaskStore;

/// POST /api/v1/tasks
pub async fn create_task(store: &dyn TaskStore, body: &[u8]) -> Result<Response<Body>, Error> {
    let result = match parse_body::<CreateTaskPayload>(body) {
        Ok(payload) => service::create_task(store, payload, Utc::now()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(task) => respond::json(
            StatusCode::CREATED,
            &json!({ "message": "Task created successfully.", "taskId": task.id }),
        ),
        Err(e) => e.into_response(),
    }
}

/// GET /api/v1/tasks?page&limit
pub async fn list_tasks(
    store: &dyn TaskStore,
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<Response<Body>, Error> {
    match service::list_tasks(store, PageRequest::from_query(page, limit)).await {
        Ok(page) => respond::json(StatusCode::OK, &page),
        Err(e) => e.into_response(),
    }
}

/// GET /api/v1/featured-tasks
pub async fn list_featured_tasks(store: &dyn TaskStore) -> Result<Response<Body>, Error> {
    match service::list_featured_tasks(store).await {
        Ok(tasks) => respond::json(StatusCode::OK, &tasks),
        Err(e) => e.into_response(),
    }
}

/// GET /api/v1/tasks/my-posted-tasks?creatorEmail=
pub async fn list_my_posted_tasks(
    store: &dyn TaskStore,
    creator_email: Option<&str>,
) -> Result<Response<Body>, Error> {
    match service::list_tasks_by_creator(store, creator_email).await {
        Ok(tasks) => respond::json(StatusCode::OK, &tasks),
        Err(e) => e.into_response(),
    }
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(store: &dyn TaskStore, task_id: &str) -> Result<Response<Body>, Error> {
    match service::get_task(store, task_id).await {
        Ok(task) => respond::json(StatusCode::OK, &task),
        Err(e) => e.into_response(),
    }
}

/// PUT /api/v1/tasks/{id}
pub async fn update_task(
    store: &dyn TaskStore,
    task_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let result = match UpdateTaskPayload::from_body(body) {
        Ok(payload) => service::update_task(store, task_id, payload, Utc::now()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => {
            let message = if outcome.modified_count == 0 {
                "No changes were made to the task."
            } else {
                "Task updated successfully."
            };
            respond::json(
                StatusCode::OK,
                &json!({ "message": message, "modifiedCount": outcome.modified_count }),
            )
        }
        Err(e) => e.into_response(),
    }
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete_task(store: &dyn TaskStore, task_id: &str) -> Result<Response<Body>, Error> {
    match service::delete_task(store, task_id).await {
        Ok(()) => respond::no_content(),
        Err(e) => e.into_response(),
    }
}
