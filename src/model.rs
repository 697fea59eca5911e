//! Typed CMS records.
//!
//! Responses arrive as loosely shaped JSON. These types pin down the fields
//! each page reads; every field is optional because the CMS omits unset
//! fields or returns `null` for them.
//!
//! ## People
//!
//! Event collections (speakers, hosts, performers, team members) are GraphQL
//! unions: the same slot can hold a `Speaker`, `Host`, `Performer`,
//! `NewTeamMemberCard`, or legacy `TeamMember`, each with its own field names.
//! [`PersonRecord`] keeps one variant per source kind, and
//! [`PersonRecord::normalize`] collapses them into the common [`Person`] view
//! the renderers consume.

use serde::{Deserialize, Deserializer, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Image or file descriptor (`{ url, description }`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Asset {
    /// The URL, if present and non-blank.
    pub fn url(&self) -> Option<&str> {
        non_blank(self.url.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }
}

/// `sys { id }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sys {
    #[serde(default)]
    pub id: Option<String>,
}

/// A `*Collection { items }` wrapper. `null` items are dropped on decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    pub items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Collection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw<T> {
            #[serde(default = "Vec::new")]
            items: Vec<Option<T>>,
        }
        let raw = Option::<Raw<T>>::deserialize(deserializer)?;
        Ok(Self {
            items: raw
                .map(|r| r.items.into_iter().flatten().collect())
                .unwrap_or_default(),
        })
    }
}

/// Static image entry (`ImageStatic` content type), looked up by `code`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    #[serde(default)]
    pub code: Option<String>,
    /// Alt text. The CMS field really is spelled this way.
    #[serde(default, rename = "altDiscription")]
    pub alt_description: Option<String>,
    #[serde(default)]
    pub file: Option<Asset>,
}

/// Lightweight event entry from the list query.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    #[serde(default)]
    pub sys: Option<Sys>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub year_identifier: Option<i64>,
}

/// Full event detail.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub sys: Option<Sys>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub year_identifier: Option<i64>,
    /// Rich text already rendered to HTML.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub ticket_sale_link: Option<String>,
    #[serde(default)]
    pub hero_image: Option<Asset>,
    #[serde(default)]
    pub image: Option<Asset>,
    #[serde(default)]
    pub team_photo: Option<Asset>,
    #[serde(default)]
    pub speakers_collection: Collection<PersonRecord>,
    #[serde(default)]
    pub hosts_collection: Collection<PersonRecord>,
    #[serde(default)]
    pub performers_collection: Collection<PersonRecord>,
    #[serde(default)]
    pub teams_collection: Collection<TeamEntry>,
}

impl Event {
    /// First usable hero asset: `heroImage`, then `image`, then `teamPhoto`.
    pub fn hero(&self) -> Option<&Asset> {
        [&self.hero_image, &self.image, &self.team_photo]
            .into_iter()
            .flatten()
            .find(|a| a.url().is_some())
    }

    pub fn name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }
}

/// Entry of an event's `teamsCollection`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "__typename")]
pub enum TeamEntry {
    Team(Team),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub team_members_collection: Collection<PersonRecord>,
}

/// One item of a person-valued union field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "__typename")]
pub enum PersonRecord {
    Speaker(Speaker),
    Host(Host),
    Performer(Performer),
    #[serde(rename = "NewTeamMemberCard")]
    TeamMemberCard(TeamMemberCard),
    #[serde(rename = "TeamMember")]
    LegacyTeamMember(LegacyTeamMember),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub linked_in_profile_link: Option<String>,
    #[serde(default)]
    pub photo: Option<Asset>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub photo: Option<Asset>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub photo: Option<Asset>,
}

/// `NewTeamMemberCard`: the current team member content type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberCard {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub position_title: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub is_lead: Option<bool>,
    #[serde(default)]
    pub linked_in_url: Option<String>,
    #[serde(default)]
    pub portrait: Option<Asset>,
}

impl TeamMemberCard {
    pub fn first_name(&self) -> Option<&str> {
        non_blank(self.first_name.as_deref())
    }

    pub fn role(&self) -> Option<&str> {
        non_blank(self.position_title.as_deref()).map(str::trim)
    }

    pub fn is_lead(&self) -> bool {
        self.is_lead.unwrap_or(false)
    }

    /// "First Last", whichever parts exist.
    pub fn full_name(&self) -> String {
        join_names(&[self.first_name.as_deref(), self.last_name.as_deref()])
    }
}

/// Older `TeamMember` content type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTeamMember {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub photo: Option<Asset>,
}

/// Common display shape for anyone shown on an event page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    /// Display name; may be empty when the record carries no name at all.
    pub name: String,
    pub role: Option<String>,
    pub photo: Option<Asset>,
}

impl Person {
    /// Uppercased first character of the name, or `?`.
    pub fn initial(&self) -> String {
        name_initial(&self.name)
    }
}

/// Uppercased first character of `name`, or `?` when empty.
pub fn name_initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

/// Collation key for display-name ordering: case and accents are ignored,
/// so "Åsa" sorts with "asa".
pub fn sort_key(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

impl PersonRecord {
    /// Collapse any variant into a [`Person`]. `None` for unknown variants.
    pub fn normalize(&self) -> Option<Person> {
        let person = match self {
            Self::Speaker(s) => Person {
                name: trimmed(s.name.as_deref()),
                role: owned(s.job_title.as_deref()),
                photo: usable(&s.photo),
            },
            Self::Host(h) => Person {
                name: trimmed(h.name.as_deref()),
                role: None,
                photo: usable(&h.photo),
            },
            Self::Performer(p) => Person {
                name: non_blank(p.name.as_deref())
                    .or(non_blank(p.title.as_deref()))
                    .map(|n| n.trim().to_string())
                    .unwrap_or_default(),
                role: owned(p.title.as_deref()),
                photo: usable(&p.photo),
            },
            Self::TeamMemberCard(m) => Person {
                name: m.full_name(),
                role: owned(m.position_title.as_deref()),
                photo: usable(&m.portrait),
            },
            Self::LegacyTeamMember(m) => Person {
                name: trimmed(m.name.as_deref()),
                role: owned(m.title.as_deref()),
                photo: usable(&m.photo),
            },
            Self::Unknown => return None,
        };
        Some(person)
    }
}

/// Entry from the embedded-videos query.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    #[serde(default)]
    pub sys: Option<Sys>,
    #[serde(default)]
    pub video_title: Option<String>,
    #[serde(default)]
    pub event_year: Option<i64>,
    #[serde(default)]
    pub safe_embedding_code: Option<RichText>,
}

/// Rich text field; `json` is the document tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub json: Option<serde_json::Value>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn trimmed(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn owned(value: Option<&str>) -> Option<String> {
    non_blank(value).map(|v| v.trim().to_string())
}

fn usable(asset: &Option<Asset>) -> Option<Asset> {
    asset.as_ref().filter(|a| a.url().is_some()).cloned()
}

fn join_names(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .filter_map(|p| non_blank(*p))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people(value: serde_json::Value) -> Vec<Person> {
        let collection: Collection<PersonRecord> = serde_json::from_value(value).unwrap();
        collection
            .items
            .iter()
            .filter_map(PersonRecord::normalize)
            .collect()
    }

    #[test]
    fn collection_drops_null_items() {
        let c: Collection<Asset> =
            serde_json::from_value(json!({"items": [null, {"url": "//a"}, null]})).unwrap();
        assert_eq!(c.items.len(), 1);
    }

    #[test]
    fn null_collection_is_empty() {
        let event: Event = serde_json::from_value(json!({
            "name": "TEDxKI",
            "speakersCollection": null,
        }))
        .unwrap();
        assert!(event.speakers_collection.items.is_empty());
        assert!(event.teams_collection.items.is_empty());
    }

    #[test]
    fn each_variant_normalizes_to_common_shape() {
        let list = people(json!({"items": [
            {"__typename": "Speaker", "name": " Ada ", "jobTitle": "Researcher",
             "photo": {"url": "//img/ada.jpg", "description": "Ada on stage"}},
            {"__typename": "Host", "name": "Grace", "linkedin": "x"},
            {"__typename": "Performer", "title": "String Quartet"},
            {"__typename": "NewTeamMemberCard", "firstName": "Lin", "lastName": "Ng",
             "positionTitle": "Producer"},
            {"__typename": "TeamMember", "name": "Old", "title": "Volunteer",
             "photo": {"url": "", "description": "blank"}},
        ]}));

        assert_eq!(
            list.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["Ada", "Grace", "String Quartet", "Lin Ng", "Old"]
        );
        assert_eq!(list[0].role.as_deref(), Some("Researcher"));
        assert_eq!(list[0].photo.as_ref().and_then(|p| p.url()), Some("//img/ada.jpg"));
        assert_eq!(list[1].role, None);
        assert_eq!(list[2].role.as_deref(), Some("String Quartet"));
        assert_eq!(list[3].role.as_deref(), Some("Producer"));
        // Blank URL means no usable photo.
        assert!(list[4].photo.is_none());
    }

    #[test]
    fn unknown_typename_is_skipped() {
        let list = people(json!({"items": [
            {"__typename": "Sponsor", "name": "Acme"},
            {"__typename": "Host", "name": "Grace"},
        ]}));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Grace");
    }

    #[test]
    fn initial_falls_back_to_question_mark() {
        let p = Person::default();
        assert_eq!(p.initial(), "?");
        let p = Person {
            name: "émile".into(),
            ..Person::default()
        };
        assert_eq!(p.initial(), "É");
    }

    #[test]
    fn hero_prefers_hero_image_then_image_then_team_photo() {
        let event: Event = serde_json::from_value(json!({
            "image": {"url": null},
            "teamPhoto": {"url": "//team.jpg"},
        }))
        .unwrap();
        assert_eq!(event.hero().and_then(|a| a.url()), Some("//team.jpg"));

        let event: Event = serde_json::from_value(json!({
            "image": {"url": "//image.jpg"},
            "teamPhoto": {"url": "//team.jpg"},
        }))
        .unwrap();
        assert_eq!(event.hero().and_then(|a| a.url()), Some("//image.jpg"));
    }

    #[test]
    fn teams_collection_reads_nested_members() {
        let event: Event = serde_json::from_value(json!({
            "teamsCollection": {"items": [
                {"__typename": "Team", "name": "Finance",
                 "teamMembersCollection": {"items": [
                    {"__typename": "NewTeamMemberCard", "firstName": "A", "isLead": true}
                 ]}},
                {"__typename": "Other"}
            ]}
        }))
        .unwrap();
        assert_eq!(event.teams_collection.items.len(), 2);
        match &event.teams_collection.items[0] {
            TeamEntry::Team(team) => {
                assert_eq!(team.name.as_deref(), Some("Finance"));
                assert_eq!(team.team_members_collection.items.len(), 1);
            }
            TeamEntry::Unknown => panic!("expected a team"),
        }
        assert_eq!(event.teams_collection.items[1], TeamEntry::Unknown);
    }

    #[test]
    fn sort_key_folds_case_and_accents() {
        assert_eq!(sort_key("Åsa Öberg"), "asa oberg");
        assert_eq!(sort_key("ÉMILE"), "emile");
        assert!(sort_key("Ölund") < sort_key("Zeta"));
    }

    #[test]
    fn image_asset_reads_misspelled_alt_field() {
        let asset: ImageAsset = serde_json::from_value(json!({
            "code": "hero",
            "altDiscription": "Crowd",
            "file": {"url": "//cdn/hero.jpg"}
        }))
        .unwrap();
        assert_eq!(asset.alt_description.as_deref(), Some("Crowd"));
    }
}
