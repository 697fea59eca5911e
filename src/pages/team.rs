//! Team page: the roster for one year, grouped into team sections.
//!
//! Team order follows a fixed priority list matched by prefix on the
//! lowercased name (a trailing "team" word is ignored); other teams follow
//! alphabetically. Within a team: leads first, then role, then full name,
//! all case-insensitive. Cards are dealt round-robin into four columns, and
//! their reveal index runs across sections so the entrance animation
//! staggers over the whole page.

use super::{BuildContext, RenderError, markup_nodes};
use super::events::distribute;
use crate::assets::{ResolveOptions, with_params};
use crate::content::{ContentQuery, decode};
use crate::model::{Collection, TeamMemberCard, name_initial, sort_key};
use crate::queries::TEAM_BY_YEAR_QUERY;
use chrono::Datelike;
use maud::{Markup, html};
use regex::Regex;
use serde::Deserialize;
use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::LazyLock;

pub const TEMPLATE: &str = "sites/team/team.html";
const SECTIONS_ID: &str = "teamSections";
const PORTRAIT_PARAMS: &str = "fm=webp&q=80&w=900";
const LINKEDIN_ICON: &str = "/assets/logos/social/LI-In-Bug.png";
const COLUMNS: usize = 4;

/// Known teams in display order.
pub const TEAM_PRIORITY: &[&str] = &["executive", "finance", "logistics", "marketing", "speaker"];

static TEAM_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*team\b").expect("valid regex"));

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamData {
    #[serde(default)]
    new_team_member_card_collection: Collection<TeamMemberCard>,
}

/// Members of one team, already sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamGroup {
    pub name: String,
    pub members: Vec<TeamMemberCard>,
}

/// Render the team page for the configured (or current) year.
pub fn render(ctx: &mut BuildContext) -> Result<PathBuf, RenderError> {
    let year = ctx
        .config
        .team
        .year
        .unwrap_or_else(|| i64::from(chrono::Local::now().year()));
    let query = ContentQuery::new("TeamByYear", TEAM_BY_YEAR_QUERY)
        .var("year", year)
        .var("limit", ctx.config.team.limit);
    let data: TeamData = decode(ctx.content.execute(&query)?)?;
    let members = data.new_team_member_card_collection.items;
    if members.is_empty() {
        return Err(RenderError::EmptyContent(format!(
            "No team members found for year {year}."
        )));
    }

    let mut doc = ctx.load(TEMPLATE)?;
    let container = doc
        .by_id_mut(SECTIONS_ID)
        .ok_or(RenderError::MissingElement(SECTIONS_ID))?;

    container.children.clear();
    let mut reveal_index = 0;
    for group in group_members(members) {
        container
            .children
            .extend(markup_nodes(team_section(&group, reveal_index)));
        reveal_index += group.members.len();
    }

    ctx.inject(&mut doc, &ResolveOptions::scan())?;
    ctx.write(TEMPLATE, &doc)
}

/// Position of `name` in [`TEAM_PRIORITY`]; unknown teams sort after all.
pub fn team_order(name: &str) -> usize {
    let lowered = name.trim().to_lowercase();
    let stripped = TEAM_WORD.replace(&lowered, "");
    let stripped = stripped.trim();
    TEAM_PRIORITY
        .iter()
        .position(|p| stripped.starts_with(p))
        .unwrap_or(TEAM_PRIORITY.len())
}

/// Group by trimmed team name and order teams and members.
pub fn group_members(members: Vec<TeamMemberCard>) -> Vec<TeamGroup> {
    let mut groups: Vec<TeamGroup> = Vec::new();
    for member in members {
        let name = member
            .team
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Team")
            .to_string();
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.members.push(member),
            None => groups.push(TeamGroup {
                name,
                members: vec![member],
            }),
        }
    }

    groups.sort_by(|a, b| {
        team_order(&a.name)
            .cmp(&team_order(&b.name))
            .then_with(|| sort_key(&a.name).cmp(&sort_key(&b.name)))
    });
    for group in &mut groups {
        group.members.sort_by(compare_members);
    }
    groups
}

fn compare_members(a: &TeamMemberCard, b: &TeamMemberCard) -> Ordering {
    b.is_lead()
        .cmp(&a.is_lead())
        .then_with(|| {
            let role = |m: &TeamMemberCard| sort_key(m.role().unwrap_or_default());
            role(a).cmp(&role(b))
        })
        .then_with(|| sort_key(&a.full_name()).cmp(&sort_key(&b.full_name())))
}

/// Section heading: "<name> Team" unless the name already says team.
pub fn team_label(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        "Team".to_string()
    } else if trimmed.to_lowercase().contains("team") {
        trimmed.to_string()
    } else {
        format!("{trimmed} Team")
    }
}

/// Add `https://` when the link has no http(s) scheme.
fn normalize_link(url: Option<&str>) -> Option<String> {
    let trimmed = url?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{trimmed}"))
    }
}

fn team_section(group: &TeamGroup, reveal_start: usize) -> Markup {
    let indexed: Vec<(usize, &TeamMemberCard)> = group
        .members
        .iter()
        .enumerate()
        .map(|(idx, m)| (reveal_start + idx, m))
        .collect();
    let columns = distribute(&indexed, COLUMNS);
    html! {
        section.team-section {
            header."team-section__header" {
                h2."team-section__title" { (team_label(&group.name)) }
            }
            div.team-grid {
                div.cols {
                    @for (idx, column) in columns.iter().enumerate() {
                        div class=(format!("col col-{}", idx + 1)) {
                            @for (index, member) in column.iter().copied() {
                                (team_card(member, *index))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn team_card(member: &TeamMemberCard, index: usize) -> Markup {
    let first = member.first_name().unwrap_or_default();
    let full = member.full_name();
    let display = if full.is_empty() { "Team member" } else { full.as_str() };
    let role = member.role().unwrap_or_default();
    let portrait = member
        .portrait
        .as_ref()
        .and_then(|p| Some((p.url()?, p.description())));
    let linkedin = normalize_link(member.linked_in_url.as_deref());

    html! {
        article.team-card data-sort-index=(index) {
            div."portrait-wrap"."animate-once" data-anim="slide-up" data-reveal-index=(index) {
                @if let Some((url, description)) = portrait {
                    @let alt = description.map(str::to_string)
                        .unwrap_or_else(|| format!("{display} — {role}").trim().to_string());
                    img.portrait src=(with_params(url, PORTRAIT_PARAMS)) alt=(alt) loading="lazy" decoding="async";
                } @else {
                    div.portrait."portrait--placeholder" aria-label=(display) {
                        (name_initial(display))
                    }
                }
                @if let Some(href) = linkedin {
                    a.linkedin href=(href) target="_blank" rel="noopener noreferrer" aria-label={ "LinkedIn " (display) } {
                        img src=(LINKEDIN_ICON) alt="LinkedIn";
                    }
                }
                div.card-label {
                    span.name {
                        (if first.is_empty() { display } else { first })
                        span.sup { "x" }
                    }
                    @if !role.is_empty() {
                        span.role { (role) }
                    }
                }
            }
        }
    }
}
