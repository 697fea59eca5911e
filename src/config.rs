//! Site configuration module.
//!
//! Handles loading, validating, and merging configuration. Configuration is
//! layered: stock defaults are overridden by an optional `site.toml` in the
//! project root, which is in turn overridden by environment variables.
//!
//! ```text
//! stock defaults  →  site.toml  →  environment (CONTENTFUL_*, EVENT_YEAR, ...)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [contentful]
//! space_id = ""             # Required before any page renders
//! access_token = ""         # Required before any page renders
//! environment = "master"
//! timeout_ms = 25000        # 0 disables the request timeout
//! api_base = "https://graphql.contentful.com/content/v1/spaces"
//!
//! [site]
//! brand = "TEDxKI"
//! static_entries = ["assets", "partials", "sites", "styles.css", "app.js", "README.md", "notes.md"]
//! static_pages = ["sites/contact/contact.html", "sites/sponsors/sponsors.html"]
//!
//! [landing]
//! hero_code = "hero-background"
//!
//! [events]
//! # year = 2025            # Initially selected event (default: newest)
//! list_limit = 20
//!
//! [team]
//! # year = 2025            # Roster year (default: current year)
//! limit = 400
//!
//! [watch]
//! video_limit = 200
//! ```
//!
//! Unknown keys are rejected to catch typos early. Credentials are never
//! required to load the config; they are checked when a content client is
//! built (see [`ContentfulConfig::credentials`]).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the optional config file in the project root.
pub const CONFIG_FILENAME: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Missing Contentful credentials: set {0} in your environment or site.toml")]
    MissingCredential(&'static str),
}

/// Site configuration.
///
/// All fields have defaults; user layers only specify what they override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Content API connection settings.
    pub contentful: ContentfulConfig,
    /// Site-wide settings shared by all pages.
    pub site: SiteSettings,
    pub landing: LandingConfig,
    pub events: EventsConfig,
    pub about: AboutConfig,
    pub team: TeamConfig,
    pub watch: WatchConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.events.list_limit == 0 {
            return Err(ConfigError::Validation(
                "events.list_limit must be at least 1".into(),
            ));
        }
        if self.team.limit == 0 {
            return Err(ConfigError::Validation(
                "team.limit must be at least 1".into(),
            ));
        }
        if self.watch.video_limit == 0 {
            return Err(ConfigError::Validation(
                "watch.video_limit must be at least 1".into(),
            ));
        }
        if self.contentful.environment.trim().is_empty() {
            return Err(ConfigError::Validation(
                "contentful.environment must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Content API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentfulConfig {
    pub space_id: String,
    pub access_token: String,
    pub environment: String,
    /// Request timeout in milliseconds. `0` disables the timeout.
    pub timeout_ms: u64,
    /// Base URL up to (not including) the space id.
    pub api_base: String,
}

impl Default for ContentfulConfig {
    fn default() -> Self {
        Self {
            space_id: String::new(),
            access_token: String::new(),
            environment: "master".to_string(),
            timeout_ms: 25_000,
            api_base: "https://graphql.contentful.com/content/v1/spaces".to_string(),
        }
    }
}

/// Space id and token, both guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub space_id: String,
    pub access_token: String,
}

impl ContentfulConfig {
    /// Return the credentials, failing if either is absent.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let space_id = self.space_id.trim();
        if space_id.is_empty() {
            return Err(ConfigError::MissingCredential("CONTENTFUL_SPACE_ID"));
        }
        let access_token = self.access_token.trim();
        if access_token.is_empty() {
            return Err(ConfigError::MissingCredential("CONTENTFUL_ACCESS_TOKEN"));
        }
        Ok(Credentials {
            space_id: space_id.to_string(),
            access_token: access_token.to_string(),
        })
    }

    /// GraphQL endpoint scoped to space and environment.
    pub fn endpoint(&self, space_id: &str) -> String {
        format!(
            "{}/{}/environments/{}",
            self.api_base.trim_end_matches('/'),
            space_id,
            self.environment
        )
    }
}

/// Site-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSettings {
    /// Brand label used in headings and fallbacks (e.g. "TEDxKI 2025").
    pub brand: String,
    /// Files and directories copied verbatim into the output directory.
    pub static_entries: Vec<String>,
    /// Template-only pages that just receive static image injection.
    pub static_pages: Vec<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            brand: "TEDxKI".to_string(),
            static_entries: [
                "assets",
                "partials",
                "sites",
                "styles.css",
                "app.js",
                "README.md",
                "notes.md",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            static_pages: vec![
                "sites/contact/contact.html".to_string(),
                "sites/sponsors/sponsors.html".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LandingConfig {
    pub hero_code: String,
    pub hero_params: String,
    pub hero_alt: String,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            hero_code: "hero-background".to_string(),
            hero_params: "fm=webp&q=86&w=1400".to_string(),
            hero_alt: "TEDxKI hero background".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventsConfig {
    /// Year selected when the page first loads. Newest event when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    /// How many events the list query asks for.
    pub list_limit: u32,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            year: None,
            list_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AboutConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_code: Option<String>,
    /// Explicit `[hero, story]` code list; overrides the two fields above.
    pub image_codes: Vec<String>,
    pub hero_params: String,
    pub story_params: String,
    pub hero_alt: String,
    pub story_alt: String,
}

impl Default for AboutConfig {
    fn default() -> Self {
        Self {
            hero_code: None,
            story_code: None,
            image_codes: Vec::new(),
            hero_params: "fm=webp&q=86&w=1400".to_string(),
            story_params: "fm=webp&q=84&w=1200".to_string(),
            hero_alt: "TEDxKI community".to_string(),
            story_alt: "TED community".to_string(),
        }
    }
}

impl AboutConfig {
    /// Resolve the `[hero, story]` code pair.
    ///
    /// `image_codes` wins when set; otherwise hero falls back to the landing
    /// hero code and story falls back to hero.
    pub fn codes(&self, landing_hero: &str) -> Vec<String> {
        let listed: Vec<String> = self
            .image_codes
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if !listed.is_empty() {
            return listed;
        }
        let hero = self
            .hero_code
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| landing_hero.to_string());
        let story = self
            .story_code
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| hero.clone());
        vec![hero, story]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TeamConfig {
    /// Roster year. Current calendar year when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    pub limit: u32,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            year: None,
            limit: 400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    pub video_limit: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { video_limit: 200 }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value. `Ok(None)` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// String-valued environment variables and the config key they set.
const ENV_STRINGS: &[(&str, &str, &str)] = &[
    ("CONTENTFUL_SPACE_ID", "contentful", "space_id"),
    ("CONTENTFUL_ACCESS_TOKEN", "contentful", "access_token"),
    ("CONTENTFUL_ENVIRONMENT", "contentful", "environment"),
    ("CONTENTFUL_API_BASE", "contentful", "api_base"),
    ("LANDING_HERO_ASSET_CODE", "landing", "hero_code"),
    ("ABOUT_HERO_IMAGE_CODE", "about", "hero_code"),
    ("ABOUT_STORY_IMAGE_CODE", "about", "story_code"),
];

/// Integer-valued environment variables and the config key they set.
const ENV_INTEGERS: &[(&str, &str, &str)] = &[
    ("CONTENTFUL_TIMEOUT_MS", "contentful", "timeout_ms"),
    ("EVENT_YEAR", "events", "year"),
    ("TEAM_YEAR", "team", "year"),
    ("WATCH_VIDEO_LIMIT", "watch", "video_limit"),
];

/// Build a TOML overlay from environment variables.
///
/// `lookup` abstracts the environment so tests don't touch process state.
/// Empty values are treated as unset.
pub fn env_overlay(lookup: impl Fn(&str) -> Option<String>) -> Result<toml::Value, ConfigError> {
    let mut root = toml::map::Map::new();
    let mut set = |section: &str, key: &str, value: toml::Value| {
        let table = root
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        if let toml::Value::Table(t) = table {
            t.insert(key.to_string(), value);
        }
    };

    let present = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    for &(var, section, key) in ENV_STRINGS {
        if let Some(value) = present(var) {
            set(section, key, toml::Value::String(value));
        }
    }
    for &(var, section, key) in ENV_INTEGERS {
        if let Some(value) = present(var) {
            let parsed: i64 = value.parse().map_err(|_| {
                ConfigError::Validation(format!("{var} must be an integer, got {value:?}"))
            })?;
            if parsed < 0 {
                return Err(ConfigError::Validation(format!(
                    "{var} must not be negative, got {parsed}"
                )));
            }
            set(section, key, toml::Value::Integer(parsed));
        }
    }
    if let Some(list) = present("ABOUT_IMAGE_CODES") {
        let codes = list
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| toml::Value::String(c.to_string()))
            .collect();
        set("about", "image_codes", toml::Value::Array(codes));
    }

    Ok(toml::Value::Table(root))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the full config: stock defaults, then `config_path` (if it exists),
/// then the process environment.
pub fn load_config(config_path: &Path) -> Result<SiteConfig, ConfigError> {
    let file = load_raw_config(config_path)?;
    let env = env_overlay(|var| std::env::var(var).ok())?;
    resolve_config(stock_defaults_value(), file.into_iter().chain([env]))
}

/// Returns a fully-commented stock `site.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# TEDx site configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Environment variables (noted per key) override this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Content API
# ---------------------------------------------------------------------------
[contentful]
# Space id and delivery token. Both are required before any page renders.
# Env: CONTENTFUL_SPACE_ID / CONTENTFUL_ACCESS_TOKEN
space_id = ""
access_token = ""

# Env: CONTENTFUL_ENVIRONMENT
environment = "master"

# Per-request timeout in milliseconds; 0 disables it.
# Env: CONTENTFUL_TIMEOUT_MS
timeout_ms = 25000

# Env: CONTENTFUL_API_BASE
api_base = "https://graphql.contentful.com/content/v1/spaces"

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
brand = "TEDxKI"

# Copied into the output directory as-is; missing entries are skipped.
static_entries = ["assets", "partials", "sites", "styles.css", "app.js", "README.md", "notes.md"]

# Pages that only receive static image injection; missing templates are skipped.
static_pages = ["sites/contact/contact.html", "sites/sponsors/sponsors.html"]

# ---------------------------------------------------------------------------
# Landing page
# ---------------------------------------------------------------------------
[landing]
# Env: LANDING_HERO_ASSET_CODE
hero_code = "hero-background"
hero_params = "fm=webp&q=86&w=1400"
hero_alt = "TEDxKI hero background"

# ---------------------------------------------------------------------------
# Events page
# ---------------------------------------------------------------------------
[events]
# Initially selected event year; newest event when unset.
# Env: EVENT_YEAR
# year = 2025
list_limit = 20

# ---------------------------------------------------------------------------
# About page
# ---------------------------------------------------------------------------
[about]
# Env: ABOUT_HERO_IMAGE_CODE (falls back to the landing hero code)
# hero_code = "hero-background"
# Env: ABOUT_STORY_IMAGE_CODE (falls back to the hero code)
# story_code = "hero-background"
# Env: ABOUT_IMAGE_CODES (comma separated, overrides both codes above)
image_codes = []
hero_params = "fm=webp&q=86&w=1400"
story_params = "fm=webp&q=84&w=1200"
hero_alt = "TEDxKI community"
story_alt = "TED community"

# ---------------------------------------------------------------------------
# Team page
# ---------------------------------------------------------------------------
[team]
# Roster year; current calendar year when unset.
# Env: TEAM_YEAR
# year = 2025
limit = 400

# ---------------------------------------------------------------------------
# Watch page
# ---------------------------------------------------------------------------
[watch]
# Env: WATCH_VIDEO_LIMIT
video_limit = 200
"##
}
