pub mod model;
pub mod service;
pub mod http;

pub use model::{Bid, BidStatus, NewBid, PlaceBidPayload};
