//! # TEDx Site
//!
//! Prerenders a TEDx event website from headless-CMS content. Hand-written
//! HTML templates stay the source of truth for layout; each build fills them
//! with events, speakers, team rosters, talk videos and static images fetched
//! from the Contentful GraphQL API, and writes plain HTML that any file
//! server can host.
//!
//! # Architecture: Sequenced Page Renders
//!
//! ```text
//! clean dist → copy static assets → landing → events → about → team → watch → static pages
//!                                       │
//!                                       ▼
//!             template ─▶ DOM ─▶ content queries ─▶ cards/sections ─▶ image injection ─▶ dist/
//! ```
//!
//! Every renderer follows the same shape: query the CMS through a
//! [`content::ContentSource`], decode into [`model`] records, load the page
//! template into a [`dom::Document`], splice in Maud-built markup, let the
//! [`assets::AssetResolver`] fill image `src`/`alt` by code, and write the
//! result under the output directory.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`build`] | Orchestrator: clean, static copy, timed render steps |
//! | [`pages`] | Per-page renderers and the shared [`pages::BuildContext`] |
//! | [`content`] | GraphQL client over HTTP, the `ContentSource` seam, query errors |
//! | [`queries`] | Fixed GraphQL documents |
//! | [`model`] | Typed CMS records; person variants normalized into one shape |
//! | [`assets`] | Static image resolver: alias attributes, batched per-build cache |
//! | [`video`] | YouTube URL and start-time parsing for the talk archive |
//! | [`dom`] | Owned HTML tree: parse, select, mutate, serialize |
//! | [`template`] | Template loading and output writing |
//! | [`config`] | Layered `site.toml` + environment configuration |
//! | [`output`] | CLI step and summary lines |
//!
//! # Design Decisions
//!
//! ## Templates Stay in HTML
//!
//! Designers edit the page templates directly; the build only touches
//! elements with known ids or image-code attributes. Sections whose content
//! is empty are hidden with the `hidden` attribute instead of removed, so
//! the page skeleton and its CSS hooks never change shape between builds.
//!
//! ## One Cache per Build
//!
//! Static images are looked up by code in a single batched query per page.
//! The cache lives on the [`pages::BuildContext`], so a full build asks for
//! each code at most once and nothing leaks between builds.
//!
//! ## Deterministic Output
//!
//! Given the same CMS responses, two builds write byte-identical files:
//! orderings are explicit (team priority, video year and title) and the
//! serializer emits attributes in source order.

pub mod assets;
pub mod build;
pub mod config;
pub mod content;
pub mod dom;
pub mod model;
pub mod output;
pub mod pages;
pub mod queries;
pub mod template;
pub mod video;

#[cfg(test)]
pub(crate) mod test_helpers;
