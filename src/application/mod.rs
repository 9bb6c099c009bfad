//! # Application Layer
//!
//! Contains the core relay logic and its orchestration.
//! This includes the feed poller and its dedup store, command registry and routing, and logging setup.

pub mod cache;
pub mod dedup;
pub mod feed_formatter;
pub mod logging;
pub mod parsing;
pub mod poller;
pub mod registry;
pub mod router;
