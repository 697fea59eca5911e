//! Watch page: the talk archive.
//!
//! Videos come from embedded-video entries whose rich text carries a
//! YouTube link. The page gets a year filter, a count, a year range, one
//! card per talk, and a `#video-data` payload for the client-side player.
//! No static images are injected here.

use super::{BuildContext, RenderError, json_payload, markup_nodes, set_text};
use crate::content::{ContentQuery, decode};
use crate::model::{Collection, VideoEntry};
use crate::queries::EMBEDDED_VIDEOS_QUERY;
use crate::video::{Video, collect_videos, distinct_years};
use maud::{Markup, html};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;

pub const TEMPLATE: &str = "sites/watch/watch.html";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoData {
    #[serde(default)]
    new_embedded_video_collection: Collection<VideoEntry>,
}

pub fn render(ctx: &mut BuildContext) -> Result<PathBuf, RenderError> {
    let query = ContentQuery::new("EmbeddedVideos", EMBEDDED_VIDEOS_QUERY)
        .var("limit", ctx.config.watch.video_limit);
    let data: VideoData = decode(ctx.content.execute(&query)?)?;
    let brand = ctx.brand().to_string();
    let videos = collect_videos(&data.new_embedded_video_collection.items, &brand);
    let years = distinct_years(&videos);
    log::debug!("{} talks across {} years", videos.len(), years.len());

    let mut doc = ctx.load(TEMPLATE)?;

    if let Some(select) = doc.by_id_mut("year-filter") {
        select.children = markup_nodes(html! {
            option value="all" { "All years" }
            @for year in &years {
                option value=(year) { (year) }
            }
        });
    }
    set_text(&mut doc, "talk-count", &format!("{} talks", videos.len()));
    if let Some(range) = year_range(&years) {
        set_text(&mut doc, "year-range", &range);
    }
    if let Some(grid) = doc.by_id_mut("video-grid") {
        grid.children = if videos.is_empty() {
            markup_nodes(html! { p.watch-empty { "No talks are available yet." } })
        } else {
            videos
                .iter()
                .enumerate()
                .flat_map(|(idx, video)| markup_nodes(video_card(video, idx, &brand)))
                .collect()
        };
    }
    if let Some(payload) = doc.by_id_mut("video-data") {
        payload.set_text(json_payload(&json!({ "videos": videos, "years": years }))?);
    }

    ctx.write(TEMPLATE, &doc)
}

/// "2024" for one year, "2019–2024" for several. `years` is newest first.
pub fn year_range(years: &[i64]) -> Option<String> {
    let newest = *years.first()?;
    let oldest = *years.last()?;
    if newest == oldest {
        Some(newest.to_string())
    } else {
        Some(format!("{oldest}–{newest}"))
    }
}

/// Brand name with a superscript x when it is a TEDx brand.
pub fn brand_markup(brand: &str) -> Markup {
    html! {
        @if let Some(rest) = brand.strip_prefix("TEDx") {
            span.brand-mark { "TED" span.sup { "x" } }
            span.brand-tail { (rest) }
        } @else {
            (brand)
        }
    }
}

fn video_card(video: &Video, index: usize, brand: &str) -> Markup {
    let year = video.year.map(|y| y.to_string()).unwrap_or_default();
    html! {
        article.video-card
            data-video-id=(video.video_id)
            data-embed=(video.embed_url)
            data-year=(year)
            data-title=(video.title.to_lowercase())
            data-source=(video.source_url)
            data-index=(index) {
            button.thumb-btn type="button" aria-label={ "Play: " (video.title) } {
                span.year-badge {
                    @if year.is_empty() { (brand) } @else { (year) }
                }
                img.thumb-img src=(video.thumbnail) alt={ (video.title) " preview" } loading="lazy" decoding="async";
                div.play-overlay {
                    span.spark {}
                    span.play-icon aria-hidden="true" { "▶" }
                    span.play-label { "Watch now" }
                }
            }
            div.meta {
                div.title { (video.title) }
                div.meta-sub {
                    (brand_markup(brand))
                    @if !year.is_empty() { " • " (year) }
                }
            }
        }
    }
}
