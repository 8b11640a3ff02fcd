use chrono::Utc;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde_json::json;

use super::model::PlaceBidPayload;
use super::service;
use crate::fields::parse_body;
use crate::respond;
use crate::store::{BidStore, TaskStore};

/// POST /api/v1/tasks/{taskId}/bids
pub async fn place_bid(
    tasks: &dyn TaskStore,
    bids: &dyn BidStore,
    task_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let result = match parse_body::<PlaceBidPayload>(body) {
        Ok(payload) => service::place_bid(tasks, bids, task_id, payload, Utc::now()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(bid) => respond::json(
            StatusCode::CREATED,
            &json!({ "message": "Bid placed successfully.", "bidId": bid.id }),
        ),
        Err(e) => e.into_response(),
    }
}

/// GET /api/v1/tasks/{taskId}/bids
pub async fn list_task_bids(bids: &dyn BidStore, task_id: &str) -> Result<Response<Body>, Error> {
    match service::list_task_bids(bids, task_id).await {
        Ok(found) => respond::json(StatusCode::OK, &found),
        Err(e) => e.into_response(),
    }
}

/// GET /api/v1/my-bids?bidderEmail=
pub async fn list_my_bids(
    bids: &dyn BidStore,
    bidder_email: Option<&str>,
) -> Result<Response<Body>, Error> {
    match service::list_bidder_bids(bids, bidder_email).await {
        Ok(found) => respond::json(StatusCode::OK, &found),
        Err(e) => e.into_response(),
    }
}
