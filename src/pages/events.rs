//! Events page.
//!
//! Lists events, fetches each event's detail one year at a time, and renders
//! the initially selected event into the template. The full set of raw event
//! records is embedded as `#event-data` so the browser can switch years
//! without another build.
//!
//! A year whose detail query fails is skipped with a warning; the page only
//! fails when no event detail could be fetched at all.

use super::{BuildContext, RenderError, json_payload, markup_nodes, set_text};
use crate::assets::{ResolveOptions, with_params};
use crate::content::{ContentQuery, decode};
use crate::dom::Document;
use crate::model::{Collection, Event, EventSummary, Person, PersonRecord, TeamEntry};
use crate::queries::{EVENT_BY_YEAR_QUERY, EVENT_LIST_QUERY};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use maud::html;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;

pub const TEMPLATE: &str = "sites/events/events.html";

const HERO_IMAGE_PARAMS: &str = "fm=webp&q=85&w=1400";
const PERSON_IMAGE_PARAMS: &str = "fm=webp&w=300&q=80";
const TEAM_IMAGE_PARAMS: &str = "fm=webp&q=80&w=900";
const TEAM_COLUMNS: usize = 4;

/// One fetched event: typed view for rendering, raw record for the payload.
#[derive(Debug, Clone)]
pub struct LoadedEvent {
    pub year: i64,
    pub event: Event,
    pub raw: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListData {
    #[serde(default)]
    event_collection: Collection<EventSummary>,
}

/// Render the events page.
pub fn render(ctx: &mut BuildContext) -> Result<PathBuf, RenderError> {
    let events = fetch_events(ctx)?;
    let default_year = events[0].year;
    let initial_year = initial_year(&events, ctx.config.events.year);
    let initial = events
        .iter()
        .find(|e| e.year == initial_year)
        .unwrap_or(&events[0]);

    let mut doc = ctx.load(TEMPLATE)?;
    let brand = ctx.brand().to_string();
    render_switcher(&mut doc, &events, initial_year, &brand);
    render_event(&mut doc, &initial.event, initial_year, &brand);

    if let Some(data) = doc.by_id_mut("event-data") {
        let raw: Vec<&Value> = events.iter().map(|e| &e.raw).collect();
        data.set_text(json_payload(&json!({
            "events": raw,
            "initialYear": initial_year,
            "defaultYear": default_year,
        }))?);
    }

    ctx.inject(&mut doc, &ResolveOptions::scan())?;
    ctx.write(TEMPLATE, &doc)
}

/// List events, then fetch each one's detail in sequence.
pub fn fetch_events(ctx: &BuildContext) -> Result<Vec<LoadedEvent>, RenderError> {
    let query = ContentQuery::new("EventList", EVENT_LIST_QUERY)
        .var("limit", ctx.config.events.list_limit);
    let list: EventListData = decode(ctx.content.execute(&query)?)?;
    let years: Vec<i64> = list
        .event_collection
        .items
        .iter()
        .filter_map(|e| e.year_identifier)
        .collect();
    if years.is_empty() {
        return Err(RenderError::EmptyContent(
            "Contentful returned no events to render.".into(),
        ));
    }

    let mut events = Vec::new();
    for year in years {
        match fetch_event(ctx, year) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => log::warn!("no event detail returned for year {year}"),
            Err(err) => log::warn!("skipping event year {year} due to fetch error: {err}"),
        }
    }
    if events.is_empty() {
        return Err(RenderError::EmptyContent(
            "No detailed event entries could be fetched.".into(),
        ));
    }
    Ok(events)
}

fn fetch_event(ctx: &BuildContext, year: i64) -> Result<Option<LoadedEvent>, RenderError> {
    let query = ContentQuery::new("EventByYear", EVENT_BY_YEAR_QUERY).var("year", year);
    let data = ctx.content.execute(&query)?;
    let Some(raw) = data
        .pointer("/eventCollection/items/0")
        .filter(|v| !v.is_null())
        .cloned()
    else {
        return Ok(None);
    };
    let event: Event = decode(raw.clone())?;
    Ok(Some(LoadedEvent {
        year: event.year_identifier.unwrap_or(year),
        event,
        raw,
    }))
}

/// The preferred year when an event has it, otherwise the newest event.
pub fn initial_year(events: &[LoadedEvent], preferred: Option<i64>) -> i64 {
    match preferred {
        Some(year) if events.iter().any(|e| e.year == year) => year,
        _ => events.first().map(|e| e.year).unwrap_or_default(),
    }
}

fn render_switcher(doc: &mut Document, events: &[LoadedEvent], active: i64, brand: &str) {
    if doc.by_id("eventSwitcherBlock").is_none() {
        return;
    }
    let Some(options) = doc.by_id_mut("eventSwitcher") else {
        return;
    };
    options.children.clear();
    for loaded in events {
        let label = loaded
            .event
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{brand} {}", loaded.year));
        let class = if loaded.year == active {
            "event-switcher__option is-active"
        } else {
            "event-switcher__option"
        };
        options.children.extend(markup_nodes(html! {
            button type="button" class=(class) data-year=(loaded.year) title=(label) {
                (loaded.year)
            }
        }));
    }
    let hidden = events.is_empty();
    if let Some(block) = doc.by_id_mut("eventSwitcherBlock") {
        block.set_hidden(hidden);
    }
}

/// Fill the page's header, people, and team sections from `event`.
pub fn render_event(doc: &mut Document, event: &Event, year: i64, brand: &str) {
    set_text(doc, "eventYear", &format!("{brand} {year}"));
    set_text(doc, "eventName", event.name().unwrap_or_default());
    set_text(doc, "eventMeta", &meta_line(event));
    if let Some(description) = doc.by_id_mut("eventDescription") {
        description.set_inner_html(event.description.as_deref().unwrap_or_default());
    }

    let hero = event.hero().and_then(|h| Some((h.url()?, h.description())));
    if let (Some((url, description)), Some(img)) = (hero, doc.by_id_mut("eventImage")) {
        let alt = description
            .or(event.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{brand} event"));
        img.set_attr("src", with_params(url, HERO_IMAGE_PARAMS));
        img.set_attr("alt", alt);
    }

    let sections = [
        (&event.speakers_collection, "speakersSection", "speakersGrid"),
        (&event.hosts_collection, "hostsSection", "hostsGrid"),
        (&event.performers_collection, "performersSection", "performersGrid"),
    ];
    for (collection, section_id, grid_id) in sections {
        render_people(doc, collection, section_id, grid_id);
    }
    render_teams(doc, event);
}

fn normalize_people(collection: &Collection<PersonRecord>) -> Vec<Person> {
    collection
        .items
        .iter()
        .filter_map(PersonRecord::normalize)
        .collect()
}

fn render_people(
    doc: &mut Document,
    collection: &Collection<PersonRecord>,
    section_id: &str,
    grid_id: &str,
) {
    if doc.by_id(section_id).is_none() {
        return;
    }
    let Some(grid) = doc.by_id_mut(grid_id) else {
        return;
    };
    let people = normalize_people(collection);
    grid.children.clear();
    for person in &people {
        grid.children.extend(markup_nodes(person_card(person)));
    }
    if let Some(section) = doc.by_id_mut(section_id) {
        section.set_hidden(people.is_empty());
    }
}

fn person_card(person: &Person) -> maud::Markup {
    let role = person.role.as_deref().filter(|r| !r.is_empty());
    html! {
        article.event-person-card {
            div.event-person-avatar {
                @if let Some(url) = person.photo.as_ref().and_then(|p| p.url()) {
                    @let alt = person.photo.as_ref().and_then(|p| p.description())
                        .or(Some(person.name.as_str()).filter(|n| !n.is_empty()))
                        .unwrap_or("Event contributor");
                    img src=(with_params(url, PERSON_IMAGE_PARAMS)) alt=(alt) loading="lazy" decoding="async";
                } @else {
                    span { (person.initial()) }
                }
            }
            div.event-person-meta {
                div.event-person-name { (person.name) }
                @if let Some(role) = role {
                    div.event-person-role { (role) }
                }
            }
        }
    }
}

fn render_teams(doc: &mut Document, event: &Event) {
    if doc.by_id("eventTeamsSection").is_none() {
        return;
    }
    let Some(container) = doc.by_id_mut("eventTeams") else {
        return;
    };
    container.children.clear();

    let mut rendered = 0;
    for entry in &event.teams_collection.items {
        let TeamEntry::Team(team) = entry else {
            continue;
        };
        let members = normalize_people(&team.team_members_collection);
        if members.is_empty() {
            continue;
        }
        let name = team
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("Team");
        container
            .children
            .extend(markup_nodes(team_section(name, &members)));
        rendered += 1;
    }

    if let Some(section) = doc.by_id_mut("eventTeamsSection") {
        section.set_hidden(rendered == 0);
    }
}

/// Split `items` round-robin into `n` columns by original index.
pub fn distribute<T>(items: &[T], n: usize) -> Vec<Vec<&T>> {
    let mut columns: Vec<Vec<&T>> = (0..n).map(|_| Vec::new()).collect();
    for (idx, item) in items.iter().enumerate() {
        columns[idx % n].push(item);
    }
    columns
}

fn team_section(name: &str, members: &[Person]) -> maud::Markup {
    let columns = distribute(members, TEAM_COLUMNS);
    html! {
        section.event-team-section {
            header.event-team-header {
                h3 { (name) }
            }
            div.team-grid {
                div.cols {
                    @for (idx, column) in columns.iter().enumerate() {
                        div class=(format!("col col-{}", idx + 1)) {
                            @for member in column {
                                (team_card(member))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn team_card(member: &Person) -> maud::Markup {
    let name = if member.name.is_empty() {
        "Team member"
    } else {
        member.name.as_str()
    };
    let role = member.role.as_deref().filter(|r| !r.is_empty());
    html! {
        article.team-card {
            div."portrait-wrap"."animate-once" data-anim="slide-up" {
                @if let Some(url) = member.photo.as_ref().and_then(|p| p.url()) {
                    @let alt = member.photo.as_ref().and_then(|p| p.description()).unwrap_or(name);
                    img.portrait src=(with_params(url, TEAM_IMAGE_PARAMS)) alt=(alt) loading="lazy" decoding="async";
                } @else {
                    div.portrait."portrait--placeholder" aria-label=(name) {
                        (crate::model::name_initial(name))
                    }
                }
                div.card-label {
                    span.name { (name) }
                    @if let Some(role) = role {
                        span.role { (role) }
                    }
                }
            }
        }
    }
}

/// `<date range> • <location>`, skipping empty parts.
pub fn meta_line(event: &Event) -> String {
    let date = format_date_range(event.start_time.as_deref(), event.end_time.as_deref());
    let location = event.location.as_deref().unwrap_or_default().to_string();
    [date, location]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" • ")
}

/// Calendar date of an ISO-8601 timestamp or date, in the timestamp's own offset.
fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d").to_string()
}

/// Format a start/end pair as `June 1`, `June 1 – June 3`, or whichever side
/// is present. Unparseable values count as missing.
pub fn format_date_range(start: Option<&str>, end: Option<&str>) -> String {
    match (parse_date(start), parse_date(end)) {
        (Some(s), Some(e)) if s == e => format_date(s),
        (Some(s), Some(e)) => format!("{} – {}", format_date(s), format_date(e)),
        (Some(d), None) | (None, Some(d)) => format_date(d),
        (None, None) => String::new(),
    }
}
