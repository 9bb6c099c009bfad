//! # Infrastructure Layer
//!
//! Handles interactions with external systems and services.
//! Implements the traits defined in the Domain layer (e.g., BroadcastTarget, FeedSource, ErrorReporter).

pub mod external_id;
pub mod matrix;
pub mod reddit;
pub mod reporting;
