//! # Domain Layer
//!
//! Core definitions, types, and traits that define the business domain of the relay bot.
//! Independent of the chat protocol and the feed provider, serving as the contract for other layers.

pub mod config;
pub mod error;
pub mod paths;
pub mod traits;
pub mod types;
