//! Domain atoms for the gig board API.
//!
//! Each resource lives in its own module split the same way:
//! `model` (payloads and records), `service` (store logic, no HTTP) and
//! `http` (request body in, `Response<Body>` out).

pub mod bids;
pub mod error;
pub mod fields;
pub mod respond;
pub mod store;
pub mod tasks;

pub use error::{ApiError, StoreError};
