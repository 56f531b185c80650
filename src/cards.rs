// Card feeds for the projects and blog panels. Best effort: a failed or malformed
// feed never reaches the choreographer, it resolves to a fallback list.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::error::ScrollError;

/// One card record, as consumed by the card mounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub url: String,
}

/// Which feed a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// `[{title, date, url}]` posts; falls back to placeholder cards.
    Blog,
    /// Ready-made `Card` records; falls back to an empty list.
    Projects,
}

impl FeedKind {
    pub fn parse(name: &str) -> Result<Self, ScrollError> {
        match name {
            "blog" => Ok(FeedKind::Blog),
            "projects" => Ok(FeedKind::Projects),
            other => Err(ScrollError::InvalidConfig(format!("unknown feed '{}'", other))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

pub const DEFAULT_BLOG_LIMIT: usize = 8;

pub fn parse_blog_feed(json: &str, limit: usize) -> Result<Vec<Card>, ScrollError> {
    let posts: Vec<Post> = serde_json::from_str(json)?;
    Ok(posts
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, post)| Card {
            id: (i + 1).to_string(),
            title: post.title.unwrap_or_default().to_lowercase(),
            subtitle: post.date.as_deref().and_then(format_post_date),
            url: post.url.unwrap_or_else(|| "#".to_string()),
        })
        .collect())
}

pub fn parse_project_feed(json: &str) -> Result<Vec<Card>, ScrollError> {
    Ok(serde_json::from_str(json)?)
}

/// `M/D/YYYY`, or `None` when the date is missing or unreadable.
fn format_post_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| DateTime::parse_from_rfc2822(raw).map(|dt| dt.date_naive()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()?;
    Some(date.format("%-m/%-d/%Y").to_string())
}

pub fn placeholder_blog_cards() -> Vec<Card> {
    [
        ("b1", "designing for delight"),
        ("b2", "simple > complex"),
        ("b3", "human-first tech"),
    ]
    .iter()
    .map(|(id, title)| Card {
        id: id.to_string(),
        title: title.to_string(),
        subtitle: Some("writing".to_string()),
        url: "#".to_string(),
    })
    .collect()
}

/// Resolve a fetched payload (or a fetch failure) to the cards to mount.
pub fn resolve_feed(kind: FeedKind, payload: Result<&str, ScrollError>, limit: usize) -> Vec<Card> {
    let parsed = payload.and_then(|json| match kind {
        FeedKind::Blog => parse_blog_feed(json, limit),
        FeedKind::Projects => parse_project_feed(json),
    });

    match parsed {
        Ok(cards) => cards,
        Err(e) => {
            let err = match e {
                ScrollError::TransientFetchFailure(_) => e,
                other => ScrollError::TransientFetchFailure(other.to_string()),
            };
            tracing::warn!(?kind, error = %err, "Using fallback cards");
            match kind {
                FeedKind::Blog => placeholder_blog_cards(),
                FeedKind::Projects => Vec::new(),
            }
        }
    }
}

/// Await a JS promise for the feed body text and resolve to card JSON.
/// The returned promise always fulfils.
#[wasm_bindgen]
pub fn load_cards(kind: &str, body: js_sys::Promise, limit: usize) -> Result<js_sys::Promise, JsValue> {
    let kind = FeedKind::parse(kind).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let limit = if limit == 0 { DEFAULT_BLOG_LIMIT } else { limit };

    Ok(future_to_promise(async move {
        let text = match JsFuture::from(body).await {
            Ok(value) => value
                .as_string()
                .ok_or_else(|| ScrollError::TransientFetchFailure("feed body is not text".to_string())),
            Err(err) => Err(ScrollError::TransientFetchFailure(format!("{:?}", err))),
        };
        let cards = resolve_feed(kind, text.as_deref().map_err(Clone::clone), limit);
        serde_json::to_string(&cards)
            .map(|json| JsValue::from_str(&json))
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blog_feed_maps_posts() {
        let json = r#"[
            {"title": "Shipping Small Things", "date": "2024-03-05T10:00:00Z", "url": "https://example.com/a"},
            {"title": "On Taste", "date": "2024-11-21", "url": "https://example.com/b"},
            {"title": "Undated"}
        ]"#;
        let cards = parse_blog_feed(json, DEFAULT_BLOG_LIMIT).unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].id, "1");
        assert_eq!(cards[0].title, "shipping small things");
        assert_eq!(cards[0].subtitle.as_deref(), Some("3/5/2024"));
        assert_eq!(cards[1].subtitle.as_deref(), Some("11/21/2024"));
        assert_eq!(cards[2].subtitle, None);
        assert_eq!(cards[2].url, "#");
    }

    #[test]
    fn blog_feed_respects_limit() {
        let posts: Vec<String> = (0..12)
            .map(|i| format!(r#"{{"title":"Post {}","url":"u{}"}}"#, i, i))
            .collect();
        let json = format!("[{}]", posts.join(","));
        let cards = parse_blog_feed(&json, 8).unwrap();
        assert_eq!(cards.len(), 8);
        assert_eq!(cards[7].id, "8");
    }

    #[test]
    fn project_feed_passes_cards_through() {
        let json = r#"[{"id":"p1","title":"Tide","subtitle":"tool","url":"https://example.com"}]"#;
        let cards = parse_project_feed(json).unwrap();
        assert_eq!(cards[0].id, "p1");
        assert_eq!(cards[0].subtitle.as_deref(), Some("tool"));
    }

    #[test]
    fn failures_resolve_to_fallbacks() {
        let blog = resolve_feed(FeedKind::Blog, Ok("not json"), 8);
        assert_eq!(blog, placeholder_blog_cards());
        assert_eq!(blog[1].title, "simple > complex");

        let projects = resolve_feed(
            FeedKind::Projects,
            Err(ScrollError::TransientFetchFailure("404".to_string())),
            8,
        );
        assert!(projects.is_empty());
    }

    #[test]
    fn unknown_feed_kind() {
        assert!(FeedKind::parse("photos").is_err());
        assert_eq!(FeedKind::parse("blog").unwrap(), FeedKind::Blog);
    }
}
