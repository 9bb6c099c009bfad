//! # Miscellaneous Commands
//!
//! Handles `.ping`.

use crate::domain::types::{MatchGroups, MessageEvent};
use anyhow::Result;

pub fn handle_ping(_event: &MessageEvent, _args: &MatchGroups, _use_cache: bool) -> Result<Vec<String>> {
    Ok(vec![crate::strings::messages::PONG.to_string()])
}
