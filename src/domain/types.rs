//! # Domain Types
//!
//! Common data structures and enums used across the application logic.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of a polled feed snapshot.
/// Only `id` outlives the poll cycle (it goes into the dedup store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub author: String,
    pub domain: String,
    pub url: String,
    pub permalink: String,
    #[serde(default)]
    pub flair: Option<String>,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub stickied: bool,
}

/// Dispatch priority tier. Declaration order is the dispatch order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

/// An inbound chat message as seen by the command layer.
#[derive(Debug, Clone, Default)]
pub struct MessageEvent {
    pub channel: String,
    pub sender: String,
    pub body: String,
    pub is_admin: bool,
}

impl MessageEvent {
    pub fn new(channel: impl Into<String>, sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            sender: sender.into(),
            body: body.into(),
            is_admin: false,
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }
}

/// Owned copy of the capture groups of the pattern that selected a command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchGroups {
    positional: Vec<Option<String>>,
    named: HashMap<String, String>,
}

impl MatchGroups {
    pub fn from_captures(regex: &regex::Regex, caps: &regex::Captures<'_>) -> Self {
        let positional = caps
            .iter()
            .map(|m| m.map(|m| m.as_str().to_string()))
            .collect();
        let named = regex
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();
        Self { positional, named }
    }

    /// Group 0 is the whole match.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.positional.get(index).and_then(|g| g.as_deref())
    }

    pub fn name(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }
}
