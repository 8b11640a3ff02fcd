use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::fields::{amount, has_text, is_supplied, parse_date};

/// Bids are created as `pending` and never move on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidStatus {
    #[default]
    Pending,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    #[serde(rename = "_id")]
    pub id: String,
    pub task_id: String,
    pub bidder_email: String,
    pub bidding_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidder_deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub status: BidStatus,
    pub bid_placed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidPayload {
    pub bidding_amount: Option<Value>,
    pub bidder_email: Option<String>,
    pub bidder_deadline: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBid {
    pub bidder_email: String,
    pub bidding_amount: f64,
    pub bidder_deadline: Option<String>,
    pub comment: Option<String>,
}

impl PlaceBidPayload {
    /// The email as sent, for the self-bid check which runs before
    /// field validation.
    pub fn bidder_email(&self) -> Option<&str> {
        self.bidder_email.as_deref().map(str::trim)
    }

    pub fn validate(self) -> Result<NewBid, ApiError> {
        let mut missing = Vec::new();
        if !is_supplied(self.bidding_amount.as_ref()) {
            missing.push("biddingAmount".to_string());
        }
        if !has_text(&self.bidder_email) {
            missing.push("bidderEmail".to_string());
        }
        if !missing.is_empty() {
            return Err(ApiError::missing_fields(missing));
        }

        let bidding_amount = amount(
            self.bidding_amount.as_ref().unwrap_or(&Value::Null),
            "Bidding amount",
        )?;

        let bidder_deadline = match self.bidder_deadline.map(|s| s.trim().to_string()) {
            Some(raw) if raw.is_empty() => None,
            Some(raw) => {
                if parse_date(&raw).is_none() {
                    return Err(ApiError::validation("Bidder deadline must be a valid date."));
                }
                Some(raw)
            }
            None => None,
        };

        Ok(NewBid {
            bidder_email: self.bidder_email.unwrap_or_default().trim().to_string(),
            bidding_amount,
            bidder_deadline,
            comment: self.comment.filter(|c| !c.trim().is_empty()),
        })
    }
}
