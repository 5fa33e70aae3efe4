//! Tweet field extraction
//!
//! Tweets arrive as JSON objects in the classic streaming format. Retweets
//! carry the original tweet in `retweeted_status`, and long tweets keep their
//! text in `extended_tweet.full_text`.

use chrono::DateTime;
use serde_json::{Map, Value};

use super::vectorizer::RawDocument;

/// Twitter's `created_at` layout, e.g. `Wed Oct 10 20:19:24 +0000 2018`
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Full text of a tweet, following retweets and extended tweets
pub fn extract_text(tweet: &Value) -> Option<String> {
    if let Some(original) = tweet.get("retweeted_status").filter(|v| v.is_object()) {
        if let Some(text) = extract_text(original) {
            return Some(text);
        }
    }

    tweet
        .pointer("/extended_tweet/full_text")
        .or_else(|| tweet.get("full_text"))
        .or_else(|| tweet.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Unix timestamp of a tweet in seconds
///
/// Tries `timestamp_ms`, then `created_at`, then a plain `timestamp`.
pub fn extract_timestamp(tweet: &Value) -> Option<i64> {
    if let Some(ms) = tweet.get("timestamp_ms").and_then(as_integer) {
        return Some(ms / 1000);
    }

    if let Some(created_at) = tweet.get("created_at").and_then(Value::as_str) {
        let parsed = DateTime::parse_from_str(created_at, CREATED_AT_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(created_at))
            .or_else(|_| DateTime::parse_from_rfc2822(created_at));
        if let Ok(dt) = parsed {
            return Some(dt.timestamp());
        }
    }

    tweet.get("timestamp").and_then(as_integer)
}

/// Tweet id as a string
pub fn extract_id(tweet: &Value) -> Option<String> {
    match tweet.get("id_str").or_else(|| tweet.get("id"))? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Build a raw document from a tweet; `None` when text or time is missing
///
/// The user's screen name, when present, is kept as an attribute.
pub fn to_document(tweet: &Value) -> Option<RawDocument> {
    let text = extract_text(tweet)?;
    let timestamp = extract_timestamp(tweet)?;
    let id = extract_id(tweet).unwrap_or_else(|| format!("{}", timestamp));

    let mut attributes = Map::new();
    if let Some(user) = tweet.pointer("/user/screen_name").and_then(Value::as_str) {
        attributes.insert("user".to_string(), Value::String(user.to_string()));
    }
    if let Some(lang) = tweet.get("lang").and_then(Value::as_str) {
        attributes.insert("lang".to_string(), Value::String(lang.to_string()));
    }

    Some(RawDocument {
        id,
        text,
        timestamp,
        attributes,
    })
}

/// Numbers or numeric strings (`timestamp_ms` is a string in the stream API)
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
