//! Client for the Pantry JSON storage service.
//!
//! All requests go through a [`http::Dispatcher`], which can gate them behind
//! a shared token-bucket [`http::RateLimiter`] (2 permits, one refilled per
//! second by default).

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod record;
pub mod types;

pub use client::PantryClient;
pub use config::{Config, DecodeMode, RateLimitConfig};
pub use error::{PantryError, Result};
pub use http::RateLimiter;
pub use types::{BasketInfo, PantryInfo, UpdatedInfo};
pub use tokio_util::sync::CancellationToken;
