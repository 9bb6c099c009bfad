//! Reddit listing feed source
//!
//! Fetches `{base_url}/r/{target}.json` and maps the listing children to `FeedItem`s.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::config::RedditConfig;
use crate::domain::error::RelayError;
use crate::domain::traits::FeedSource;
use crate::domain::types::FeedItem;

/// Reddit listing response format
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    author_flair_text: Option<String>,
    #[serde(default)]
    is_video: bool,
    #[serde(default)]
    stickied: bool,
}

impl From<Post> for FeedItem {
    fn from(post: Post) -> Self {
        FeedItem {
            id: post.name,
            title: post.title,
            author: post.author,
            domain: post.domain,
            url: post.url,
            permalink: post.permalink,
            flair: post.author_flair_text,
            is_video: post.is_video,
            stickied: post.stickied,
        }
    }
}

/// Parses a listing body into items, preserving listing order.
pub fn parse_listing(body: &str) -> Result<Vec<FeedItem>, serde_json::Error> {
    let listing: Listing = serde_json::from_str(body)?;
    Ok(listing.data.children.into_iter().map(|c| c.data.into()).collect())
}

pub struct RedditFeedSource {
    client: Client,
    base_url: String,
}

impl RedditFeedSource {
    pub fn new(config: &RedditConfig) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RelayError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn listing_url(&self, target: &str) -> String {
        format!("{}/r/{}.json", self.base_url, target)
    }
}

#[async_trait]
impl FeedSource for RedditFeedSource {
    async fn fetch_snapshot(&self, target: &str) -> Result<Vec<FeedItem>, RelayError> {
        let url = self.listing_url(target);
        tracing::debug!(%url, "Fetching listing");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RelayError::fetch(target, format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::fetch(target, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RelayError::fetch(target, format!("failed to read body: {e}")))?;

        parse_listing(&body).map_err(|e| RelayError::fetch(target, format!("invalid listing JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
      "kind": "Listing",
      "data": {
        "after": null,
        "children": [
          {"kind": "t3", "data": {
            "name": "t3_aaa", "title": "Weekly thread &amp; news", "author": "mod",
            "domain": "self.news", "url": "https://www.reddit.com/r/news/comments/aaa/",
            "permalink": "/r/news/comments/aaa/", "author_flair_text": "Moderator",
            "is_video": false, "stickied": true, "score": 10}},
          {"kind": "t3", "data": {
            "name": "t3_bbb", "title": "Clip", "author": "someone",
            "domain": "v.redd.it", "url": "https://v.redd.it/bbb",
            "permalink": "/r/news/comments/bbb/", "author_flair_text": null,
            "is_video": true, "stickied": false}}
        ]
      }
    }"#;

    #[test]
    fn test_parse_listing_maps_fields_in_order() {
        let items = parse_listing(LISTING).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].id, "t3_aaa");
        assert_eq!(items[0].title, "Weekly thread &amp; news");
        assert_eq!(items[0].flair.as_deref(), Some("Moderator"));
        assert!(items[0].stickied);

        assert_eq!(items[1].id, "t3_bbb");
        assert!(items[1].is_video);
        assert!(items[1].flair.is_none());
    }

    #[test]
    fn test_parse_listing_rejects_garbage() {
        assert!(parse_listing("<html>rate limited</html>").is_err());
    }

    #[test]
    fn test_empty_listing() {
        let items = parse_listing(r#"{"data": {"children": []}}"#).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_listing_url_trims_trailing_slash() {
        let config = RedditConfig {
            base_url: "https://example.org/".into(),
            ..Default::default()
        };
        let source = RedditFeedSource::new(&config).unwrap();
        assert_eq!(source.listing_url("news"), "https://example.org/r/news.json");
    }
}
