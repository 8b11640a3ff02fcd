use std::sync::Arc;

use gigboard_atoms::{bids, respond, tasks};
use gigboard_shared::{cors, status, AppState};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use serde_json::json;

fn query_param<'a>(event: &'a Request, name: &str) -> Option<&'a str> {
    event
        .query_string_parameters_ref()
        .and_then(|params| params.first(name))
}

/// Main Lambda handler - routes every API Gateway request
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    let allow_origin = state.config.allow_origin.as_str();
    tracing::info!("API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if *method == Method::OPTIONS {
        return cors::preflight(allow_origin);
    }

    let task_store = state.tasks.as_ref();
    let bid_store = state.bids.as_ref();
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let resp = match (method, parts.as_slice()) {
        // GET / - status page
        (&Method::GET, []) => status::status_page(),

        // --- TASKS ---
        // POST /api/v1/tasks - create task
        (&Method::POST, ["api", "v1", "tasks"]) => tasks::http::create_task(task_store, body).await,
        // GET /api/v1/tasks?page&limit - paginated list
        (&Method::GET, ["api", "v1", "tasks"]) => {
            tasks::http::list_tasks(
                task_store,
                query_param(&event, "page"),
                query_param(&event, "limit"),
            )
            .await
        }
        // GET /api/v1/tasks/my-posted-tasks?creatorEmail= - must stay above GET /tasks/{id}
        (&Method::GET, ["api", "v1", "tasks", "my-posted-tasks"]) => {
            tasks::http::list_my_posted_tasks(task_store, query_param(&event, "creatorEmail")).await
        }
        // GET /api/v1/featured-tasks - six soonest deadlines
        (&Method::GET, ["api", "v1", "featured-tasks"]) => {
            tasks::http::list_featured_tasks(task_store).await
        }
        // GET /api/v1/tasks/{id} - get task
        (&Method::GET, ["api", "v1", "tasks", task_id]) => {
            tasks::http::get_task(task_store, task_id).await
        }
        // PUT /api/v1/tasks/{id} - merge update
        (&Method::PUT, ["api", "v1", "tasks", task_id]) => {
            tasks::http::update_task(task_store, task_id, body).await
        }
        // DELETE /api/v1/tasks/{id} - delete task
        (&Method::DELETE, ["api", "v1", "tasks", task_id]) => {
            tasks::http::delete_task(task_store, task_id).await
        }

        // --- BIDS ---
        // POST /api/v1/tasks/{taskId}/bids - place bid
        (&Method::POST, ["api", "v1", "tasks", task_id, "bids"]) => {
            bids::http::place_bid(task_store, bid_store, task_id, body).await
        }
        // GET /api/v1/tasks/{taskId}/bids - bids for a task
        (&Method::GET, ["api", "v1", "tasks", task_id, "bids"]) => {
            bids::http::list_task_bids(bid_store, task_id).await
        }
        // GET /api/v1/my-bids?bidderEmail= - bids by bidder
        (&Method::GET, ["api", "v1", "my-bids"]) => {
            bids::http::list_my_bids(bid_store, query_param(&event, "bidderEmail")).await
        }

        _ => {
            tracing::warn!("No route matched - Method: {} Path: {}", method, path);
            not_found()
        }
    };

    cors::finalize_response(resp, allow_origin)
}

fn not_found() -> Result<Response<Body>, Error> {
    respond::json(StatusCode::NOT_FOUND, &json!({ "message": "Route not found." }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use gigboard_atoms::store::{MemoryBidStore, MemoryTaskStore};
    use gigboard_shared::Config;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::collections::HashMap;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(
            Arc::new(MemoryTaskStore::new()),
            Arc::new(MemoryBidStore::new()),
            Config::default(),
        ))
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request {
        let body = body.map(|v| Body::from(v.to_string())).unwrap_or(Body::Empty);
        lambda_http::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(body)
            .unwrap()
    }

    fn with_query(req: Request, pairs: &[(&str, &str)]) -> Request {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        req.with_query_string_parameters(params)
    }

    async fn call(state: &Arc<AppState>, req: Request) -> (StatusCode, Value) {
        let resp = function_handler(req, Arc::clone(state)).await.unwrap();
        let status = resp.status();
        let body = if resp.body().is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(resp.body()).unwrap()
        };
        (status, body)
    }

    fn day(offset: i64) -> String {
        (Utc::now() + Duration::days(offset))
            .date_naive()
            .format("%Y-%m-%d")
            .to_string()
    }

    fn task_body(deadline: &str) -> Value {
        json!({
            "title": "Logo design",
            "category": "Graphic Design",
            "budget": 50,
            "deadline": deadline,
            "description": "A clean vector logo",
            "creatorEmail": "a@x.com",
        })
    }

    async fn create(state: &Arc<AppState>, deadline: &str) -> String {
        let (status, body) = call(
            state,
            request(Method::POST, "/api/v1/tasks", Some(task_body(deadline))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["taskId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn status_page_is_html() {
        let resp = function_handler(request(Method::GET, "/", None), state())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()["Content-Type"]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }

    #[tokio::test]
    async fn create_then_get_task() {
        let state = state();
        let tomorrow = day(1);
        let id = create(&state, &tomorrow).await;

        let (status, task) = call(&state, request(Method::GET, &format!("/api/v1/tasks/{id}"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["_id"], id.as_str());
        assert_eq!(task["title"], "Logo design");
        assert_eq!(task["category"], "Graphic Design");
        assert_eq!(task["budget"], 50.0);
        assert_eq!(task["deadline"], tomorrow.as_str());
        assert_eq!(task["creatorEmail"], "a@x.com");
        assert!(task["createdAt"].is_string());
    }

    #[tokio::test]
    async fn negative_budget_is_bad_request() {
        let mut body = task_body(&day(1));
        body["budget"] = json!(-10);
        let (status, resp) = call(&state(), request(Method::POST, "/api/v1/tasks", Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "Budget must be a positive number.");
    }

    #[tokio::test]
    async fn past_deadline_is_bad_request() {
        let (status, resp) = call(
            &state(),
            request(Method::POST, "/api/v1/tasks", Some(task_body(&day(-1)))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "Deadline cannot be in the past.");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let req = lambda_http::http::Request::builder()
            .method(Method::POST)
            .uri("/api/v1/tasks")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = call(&state(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let (status, resp) = call(
            &state(),
            request(Method::GET, "/api/v1/tasks/not-an-object-id", None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "Invalid Task ID format.");
    }

    #[tokio::test]
    async fn malformed_id_on_update_and_delete_is_bad_request() {
        let state = state();
        for method in [Method::PUT, Method::DELETE] {
            let (status, resp) = call(
                &state,
                request(
                    method,
                    "/api/v1/tasks/not-an-object-id",
                    Some(json!({ "title": "x" })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(resp["message"], "Invalid Task ID format.");
        }
    }

    #[tokio::test]
    async fn update_with_unknown_field_is_bad_request() {
        let state = state();
        let id = create(&state, &day(1)).await;
        let uri = format!("/api/v1/tasks/{id}");

        let (status, resp) = call(
            &state,
            request(Method::PUT, &uri, Some(json!({ "skills": ["rust"] }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "Unknown update fields: skills.");
    }

    #[tokio::test]
    async fn budget_beyond_storable_range_is_bad_request() {
        let state = state();
        let mut body = task_body(&day(1));
        body["budget"] = json!(1e130);

        let (status, resp) = call(&state, request(Method::POST, "/api/v1/tasks", Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            resp["message"],
            "Budget must be between 0.01 and 1000000000000."
        );
    }

    #[tokio::test]
    async fn configured_origin_is_the_only_cors_source() {
        let state = Arc::new(AppState::new(
            Arc::new(MemoryTaskStore::new()),
            Arc::new(MemoryBidStore::new()),
            Config {
                allow_origin: "https://gigboard.example".to_string(),
                ..Config::default()
            },
        ));
        let resp = function_handler(request(Method::GET, "/api/v1/featured-tasks", None), state)
            .await
            .unwrap();
        assert_eq!(
            resp.headers()["Access-Control-Allow-Origin"],
            "https://gigboard.example"
        );
        assert_eq!(
            resp.headers().get_all("Access-Control-Allow-Origin").iter().count(),
            1
        );
    }

    #[tokio::test]
    async fn my_posted_tasks_is_not_swallowed_by_id_route() {
        let state = state();
        create(&state, &day(1)).await;

        let (status, resp) = call(
            &state,
            request(Method::GET, "/api/v1/tasks/my-posted-tasks", None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "creatorEmail query parameter is required.");

        let req = with_query(
            request(Method::GET, "/api/v1/tasks/my-posted-tasks", None),
            &[("creatorEmail", "a@x.com")],
        );
        let (status, resp) = call(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn paginated_listing_shape() {
        let state = state();
        for offset in 1..=5 {
            create(&state, &day(offset)).await;
        }

        let req = with_query(
            request(Method::GET, "/api/v1/tasks", None),
            &[("page", "2"), ("limit", "2")],
        );
        let (status, resp) = call(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["totalTasks"], 5);
        assert_eq!(resp["totalPages"], 3);
        assert_eq!(resp["currentPage"], 2);
        assert_eq!(resp["tasks"].as_array().unwrap().len(), 2);
        assert_eq!(resp["tasks"][0]["deadline"], day(3).as_str());
    }

    #[tokio::test]
    async fn featured_tasks_capped() {
        let state = state();
        for offset in 1..=8 {
            create(&state, &day(offset)).await;
        }
        let (status, resp) = call(&state, request(Method::GET, "/api/v1/featured-tasks", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp.as_array().unwrap().len(), 6);
        assert_eq!(resp[0]["deadline"], day(1).as_str());
    }

    #[tokio::test]
    async fn update_reports_modified_count() {
        let state = state();
        let id = create(&state, &day(1)).await;
        let uri = format!("/api/v1/tasks/{id}");

        let (status, resp) = call(
            &state,
            request(Method::PUT, &uri, Some(json!({ "budget": 75, "creatorEmail": "z@x.com" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["modifiedCount"], 1);

        let (status, resp) = call(&state, request(Method::PUT, &uri, Some(json!({ "budget": 75 })))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["modifiedCount"], 0);

        let (status, _) = call(&state, request(Method::PUT, &uri, Some(json!({})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, task) = call(&state, request(Method::GET, &uri, None)).await;
        assert_eq!(task["creatorEmail"], "a@x.com");
        assert_eq!(task["budget"], 75.0);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let state = state();
        let id = create(&state, &day(1)).await;
        let uri = format!("/api/v1/tasks/{id}");

        let resp = function_handler(request(Method::DELETE, &uri, None), Arc::clone(&state))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let (status, resp) = call(&state, request(Method::GET, &uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(resp["message"], "Task not found.");
    }

    #[tokio::test]
    async fn own_task_bid_is_forbidden() {
        let state = state();
        let id = create(&state, &day(3)).await;

        let (status, resp) = call(
            &state,
            request(
                Method::POST,
                &format!("/api/v1/tasks/{id}/bids"),
                Some(json!({ "biddingAmount": 40, "bidderEmail": "a@x.com" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(resp["message"], "You cannot bid on your own task.");
    }

    #[tokio::test]
    async fn bid_lifecycle_over_http() {
        let state = state();
        let id = create(&state, &day(3)).await;
        let bids_uri = format!("/api/v1/tasks/{id}/bids");

        let (status, resp) = call(&state, request(Method::GET, &bids_uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp, json!([]));

        let (status, resp) = call(
            &state,
            request(
                Method::POST,
                &bids_uri,
                Some(json!({ "biddingAmount": "45", "bidderEmail": "b@x.com", "comment": "Hi" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let bid_id = resp["bidId"].as_str().unwrap().to_string();

        let (_, listed) = call(&state, request(Method::GET, &bids_uri, None)).await;
        assert_eq!(listed[0]["_id"], bid_id.as_str());
        assert_eq!(listed[0]["status"], "pending");
        assert_eq!(listed[0]["biddingAmount"], 45.0);

        let (status, _) = call(&state, request(Method::GET, "/api/v1/my-bids", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let req = with_query(
            request(Method::GET, "/api/v1/my-bids", None),
            &[("bidderEmail", "b@x.com")],
        );
        let (status, mine) = call(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bid_on_missing_task_is_not_found() {
        let uri = format!("/api/v1/tasks/{}/bids", gigboard_atoms::store::new_id());
        let (status, _) = call(
            &state(),
            request(
                Method::POST,
                &uri,
                Some(json!({ "biddingAmount": 40, "bidderEmail": "b@x.com" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_failure_is_internal_error() {
        let state = Arc::new(AppState::new(
            Arc::new(MemoryTaskStore::unavailable()),
            Arc::new(MemoryBidStore::unavailable()),
            Config::default(),
        ));
        let (status, resp) = call(&state, request(Method::GET, "/api/v1/featured-tasks", None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp["error"], "memory store unavailable");
    }

    #[tokio::test]
    async fn unknown_route_and_preflight() {
        let state = state();
        let (status, _) = call(&state, request(Method::GET, "/api/v2/whatever", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let resp = function_handler(request(Method::OPTIONS, "/api/v1/tasks", None), state)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
    }
}
