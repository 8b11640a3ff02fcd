use chrono::{DateTime, Utc};

use super::model::{Bid, BidStatus, PlaceBidPayload};
use crate::error::ApiError;
use crate::store::{new_id, parse_id, BidStore, TaskStore};

fn task_id(raw: &str) -> Result<String, ApiError> {
    parse_id(raw).ok_or_else(|| ApiError::validation("Invalid Task ID format."))
}

fn newest_first(bids: &mut [Bid]) {
    bids.sort_by(|a, b| b.bid_placed_at.cmp(&a.bid_placed_at));
}

/// Place a bid on a task.
///
/// Checks run in a fixed order: id format, task existence, self-bid,
/// task deadline, then the bid fields. The task read and the bid insert are
/// separate store calls; two concurrent bids both see the same task state.
pub async fn place_bid(
    tasks: &dyn TaskStore,
    bids: &dyn BidStore,
    raw_task_id: &str,
    payload: PlaceBidPayload,
    now: DateTime<Utc>,
) -> Result<Bid, ApiError> {
    let task_id = task_id(raw_task_id)?;

    let task = tasks
        .find_task(&task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found."))?;

    if payload
        .bidder_email()
        .is_some_and(|email| email.eq_ignore_ascii_case(task.creator_email.trim()))
    {
        return Err(ApiError::forbidden("You cannot bid on your own task."));
    }

    if task.deadline_at().is_some_and(|deadline| now > deadline) {
        return Err(ApiError::forbidden(
            "The deadline for this task has passed. Bidding is closed.",
        ));
    }

    let new = payload.validate()?;

    let bid = Bid {
        id: new_id(),
        task_id: task.id,
        bidder_email: new.bidder_email,
        bidding_amount: new.bidding_amount,
        bidder_deadline: new.bidder_deadline,
        comment: new.comment,
        status: BidStatus::Pending,
        bid_placed_at: now,
    };

    bids.insert_bid(&bid).await?;
    tracing::info!("Bid {} placed on task {} by {}", bid.id, bid.task_id, bid.bidder_email);
    Ok(bid)
}

/// Bids on one task, newest first. An unknown task simply has none.
pub async fn list_task_bids(bids: &dyn BidStore, raw_task_id: &str) -> Result<Vec<Bid>, ApiError> {
    let task_id = task_id(raw_task_id)?;
    let mut found = bids.bids_for_task(&task_id).await?;
    newest_first(&mut found);
    Ok(found)
}

pub async fn list_bidder_bids(
    bids: &dyn BidStore,
    bidder_email: Option<&str>,
) -> Result<Vec<Bid>, ApiError> {
    let bidder_email = bidder_email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::validation("bidderEmail query parameter is required."))?;

    let mut found = bids.bids_by_bidder(bidder_email).await?;
    newest_first(&mut found);
    Ok(found)
}
