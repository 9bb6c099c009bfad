//! # Feed Formatter
//!
//! Builds the one-line channel announcement for a feed item.

use crate::domain::types::FeedItem;

const PERMALINK_BASE: &str = "https://old.reddit.com";

pub struct FeedFormatter;

impl FeedFormatter {
    /// `"{title} ({domain}) by {author}[ ({flair})], link: {link}"`
    pub fn announcement(item: &FeedItem) -> String {
        let mut message = format!(
            "{} ({}) by {}",
            decode_html_entities(&item.title),
            item.domain,
            item.author
        );
        if let Some(flair) = item.flair.as_deref().filter(|f| !f.is_empty()) {
            message.push_str(&format!(" ({flair})"));
        }
        if item.is_video {
            message.push_str(&format!(", link: {}{}", PERMALINK_BASE, item.permalink));
        } else {
            message.push_str(&format!(", link: {}", decode_link(&item.url)));
        }
        message
    }
}

/// Form-decodes a URL (`+` is a space) and unescapes `&amp;`. Falls back to
/// the raw URL if the decoded bytes are not UTF-8.
pub fn decode_link(url: &str) -> String {
    let spaced = url.replace('+', " ");
    let decoded = urlencoding::decode(&spaced)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| url.to_string());
    decoded.replace("&amp;", "&")
}

/// Decodes the HTML entities feeds put into titles.
pub fn decode_html_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        // entities are short; don't scan far for the terminator
        let decoded = tail
            .char_indices()
            .take(12)
            .find(|(_, c)| *c == ';')
            .and_then(|(semi, _)| decode_entity(&tail[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}
