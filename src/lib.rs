//! checkoutkeys - local mirror of checkoutkeys.com license keys
//!
//! Pulls the remote license collection into a SQLite store, forwards
//! activate/deactivate requests to the remote API, and serves an admin API
//! over the mirrored data.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod nonce;
pub mod pagination;
pub mod remote;
pub mod settings;
pub mod sync;
pub mod toggle;
pub mod util;
