//! # Parsing Utils
//!
//! Recognizes social-post URLs in feed items and extracts the numeric post id,
//! which the poller compares against the stream watcher's last id.

use crate::domain::error::RelayError;
use regex::{Regex, RegexBuilder};

const SOCIAL_POST_PATTERN: &str =
    r"https?://(?:www\.|mobile\.)?(?:twitter\.com|x\.com)/(?:#!/)?(\w+)/(?:status|statuses)/(\d+)";

/// A URL that looked like a social post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialPost {
    pub account: String,
    pub raw_id: String,
}

impl SocialPost {
    /// Parses the captured id; ids that overflow an i64 are rejected.
    pub fn post_id(&self) -> Result<i64, RelayError> {
        self.raw_id.parse::<i64>().map_err(|e| RelayError::Parse {
            what: "social post id",
            input: self.raw_id.clone(),
            reason: e.to_string(),
        })
    }
}

pub struct SocialPostMatcher {
    regex: Regex,
}

impl SocialPostMatcher {
    pub fn new() -> Result<Self, RelayError> {
        let regex = RegexBuilder::new(SOCIAL_POST_PATTERN)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|e| RelayError::Config(format!("invalid social post pattern: {e}")))?;
        Ok(Self { regex })
    }

    /// Returns the post reference if `url` has the social-post shape.
    pub fn match_url(&self, url: &str) -> Option<SocialPost> {
        let caps = self.regex.captures(url)?;
        Some(SocialPost {
            account: caps.get(1)?.as_str().to_string(),
            raw_id: caps.get(2)?.as_str().to_string(),
        })
    }
}
