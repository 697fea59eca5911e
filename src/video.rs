//! Talk videos: YouTube URL parsing and normalization.
//!
//! Video entries store an embed snippet as rich text. The first URL found in
//! it is parsed as a YouTube link; entries without a usable video id are
//! dropped. Accepted shapes:
//!
//! ```text
//! https://youtu.be/<id>?t=90
//! https://www.youtube.com/watch?v=<id>&t=1m30s
//! https://www.youtube.com/embed/<id>?start=90
//! https://www.youtube.com/shorts/<id>        (trailing path segment)
//! ```
//!
//! Embeds always point at the privacy-enhanced `youtube-nocookie.com`
//! domain with `rel=0&modestbranding=1`.

use crate::assets::normalize_url;
use crate::model::{VideoEntry, sort_key};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Reverse;
use std::sync::LazyLock;
use url::Url;

static URL_IN_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(https?://[^\s"'>]+)"#).expect("valid regex"));

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?").expect("valid regex")
});

/// Parsed YouTube link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YouTube {
    pub video_id: String,
    /// Start offset in seconds; `None` when absent or zero.
    pub start: Option<u64>,
    pub source_url: String,
    pub embed_url: String,
    pub thumbnail: String,
}

/// A talk ready for rendering; also serialized into the page payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub year: Option<i64>,
    pub video_id: String,
    pub embed_url: String,
    pub source_url: String,
    pub thumbnail: String,
}

/// Parse a start time: `90`, `t=90`, `1h2m3s`, `2m`. Zero is no start.
pub fn parse_start_seconds(raw: &str) -> Option<u64> {
    let value = raw.trim();
    let value = value
        .strip_prefix("t=")
        .or_else(|| value.strip_prefix("T="))
        .unwrap_or(value);
    let value = value.strip_prefix('#').unwrap_or(value).trim();
    if value.is_empty() {
        return None;
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse::<u64>().ok().filter(|s| *s > 0);
    }
    let caps = DURATION.captures(value)?;
    let part = |i: usize| -> Option<u64> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    // Out-of-range values mean no usable start time.
    let total = part(1)?
        .checked_mul(3600)?
        .checked_add(part(2)?.checked_mul(60)?)?
        .checked_add(part(3)?)?;
    (total > 0).then_some(total)
}

/// Parse a YouTube URL. `None` for other hosts or ids shorter than 5 chars.
pub fn parse_youtube(raw: &str) -> Option<YouTube> {
    let normalized = normalize_url(Some(raw))?;
    let url = Url::parse(&normalized)
        .or_else(|_| Url::parse("https://www.youtube.com").and_then(|base| base.join(&normalized)))
        .ok()?;

    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if !host.contains("youtube") && !host.contains("youtu.be") {
        return None;
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    let query = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    };

    let raw_id = if host == "youtu.be" {
        segments.first().map(|s| s.to_string())
    } else if url.path().starts_with("/embed/") {
        segments.get(1).map(|s| s.to_string())
    } else if let Some(v) = query("v") {
        Some(v)
    } else {
        segments.last().map(|s| s.to_string())
    }
    .unwrap_or_default();

    let video_id: String = raw_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if video_id.len() < 5 {
        return None;
    }

    let hash_start = url
        .fragment()
        .and_then(|f| f.split_once("t=").map(|(_, rest)| rest.to_string()));
    let start = query("start")
        .or_else(|| query("t"))
        .or(hash_start)
        .and_then(|s| parse_start_seconds(&s));

    let mut embed_url = format!(
        "https://www.youtube-nocookie.com/embed/{video_id}?rel=0&modestbranding=1"
    );
    if let Some(start) = start {
        embed_url.push_str(&format!("&start={start}"));
    }

    Some(YouTube {
        thumbnail: format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg"),
        source_url: url.to_string(),
        embed_url,
        start,
        video_id,
    })
}

/// First URL in a rich-text document: a hyperlink `data.uri`, or a URL
/// appearing inside a text value.
pub fn find_url_in_rich_text(doc: &Value) -> Option<String> {
    fn walk(node: &Value) -> Option<String> {
        if node.get("nodeType").and_then(Value::as_str) == Some("hyperlink") {
            if let Some(uri) = node
                .pointer("/data/uri")
                .and_then(Value::as_str)
                .filter(|u| !u.is_empty())
            {
                return Some(uri.to_string());
            }
        }
        if let Some(text) = node.get("value").and_then(Value::as_str) {
            if let Some(m) = URL_IN_TEXT.captures(text).and_then(|c| c.get(1)) {
                return Some(m.as_str().to_string());
            }
        }
        node.get("content")
            .and_then(Value::as_array)?
            .iter()
            .find_map(walk)
    }
    walk(doc).and_then(|found| normalize_url(Some(&found)))
}

impl Video {
    /// Build a video from a CMS entry. `None` when no YouTube id is found.
    pub fn from_entry(entry: &VideoEntry, brand: &str) -> Option<Self> {
        let rich = entry.safe_embedding_code.as_ref()?.json.as_ref()?;
        let yt = parse_youtube(&find_url_in_rich_text(rich)?)?;
        let title = entry
            .video_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{brand} Talk"));
        let id = entry
            .sys
            .as_ref()
            .and_then(|s| s.id.clone())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| yt.video_id.clone());
        Some(Self {
            id,
            title,
            year: entry.event_year,
            video_id: yt.video_id,
            embed_url: yt.embed_url,
            source_url: yt.source_url,
            thumbnail: yt.thumbnail,
        })
    }
}

/// Normalize entries, drop unusable ones, and sort: year descending
/// (unknown years last), then case-insensitive title.
pub fn collect_videos(entries: &[VideoEntry], brand: &str) -> Vec<Video> {
    let mut videos: Vec<Video> = entries
        .iter()
        .filter_map(|e| Video::from_entry(e, brand))
        .collect();
    videos.sort_by(|a, b| {
        Reverse(a.year.unwrap_or(0))
            .cmp(&Reverse(b.year.unwrap_or(0)))
            .then_with(|| sort_key(&a.title).cmp(&sort_key(&b.title)))
            .then_with(|| a.title.cmp(&b.title))
    });
    videos
}

/// Distinct known years, newest first.
pub fn distinct_years(videos: &[Video]) -> Vec<i64> {
    let mut years: Vec<i64> = videos.iter().filter_map(|v| v.year).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}
