//! Build orchestrator.
//!
//! A build is a fixed sequence of named, timed steps:
//!
//! ```text
//! clean dist → copy static assets → landing → events → about → team → watch → static pages
//! ```
//!
//! Steps run one after another on one [`BuildContext`], so the asset cache is
//! shared across pages and dropped with the build. The first failing step
//! aborts the build with a [`BuildError::Step`] naming it; there is no
//! partial success.

use crate::config::SiteConfig;
use crate::content::ContentSource;
use crate::output;
use crate::pages::{self, BuildContext, RenderError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use walkdir::WalkDir;

pub const STEP_CLEAN: &str = "Cleaning dist";
pub const STEP_COPY: &str = "Copying static assets";
pub const STEP_LANDING: &str = "Rendering landing page";
pub const STEP_EVENTS: &str = "Rendering events page";
pub const STEP_ABOUT: &str = "Rendering about page";
pub const STEP_TEAM: &str = "Rendering team page";
pub const STEP_WATCH: &str = "Rendering watch page";
pub const STEP_STATIC_PAGES: &str = "Rendering static content pages";

#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("{label} failed: {source}")]
    Step {
        label: &'static str,
        #[source]
        source: StepError,
    },
}

impl BuildError {
    pub fn label(&self) -> &'static str {
        match self {
            BuildError::Step { label, .. } => label,
        }
    }
}

/// Timing of one completed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepTiming {
    pub label: &'static str,
    pub elapsed: Duration,
}

/// What a successful build did.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub steps: Vec<StepTiming>,
    pub pages: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Run `f` as a named step, printing start and completion lines.
pub fn run_step<T, E>(label: &'static str, f: impl FnOnce() -> Result<T, E>) -> Result<(T, StepTiming), BuildError>
where
    E: Into<StepError>,
{
    output::print_step_start(label);
    let started = Instant::now();
    let value = f().map_err(|e| BuildError::Step {
        label,
        source: e.into(),
    })?;
    let elapsed = started.elapsed();
    output::print_step_done(label, elapsed);
    Ok((value, StepTiming { label, elapsed }))
}

/// Remove the output directory. A missing directory is fine.
pub fn clean(dist: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dist) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Copy each `root/<entry>` to `dist/<entry>`. Missing entries are skipped;
/// directories are copied recursively. Returns the entries copied.
pub fn copy_static_assets(root: &Path, dist: &Path, entries: &[String]) -> io::Result<Vec<String>> {
    let mut copied = Vec::new();
    for entry in entries {
        let src = root.join(entry);
        let metadata = match fs::symlink_metadata(&src) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("static entry {entry} not present, skipping");
                continue;
            }
            Err(e) => return Err(e),
        };
        let dest = dist.join(entry);
        if metadata.is_dir() {
            copy_dir(&src, &dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&src, &dest)?;
        }
        copied.push(entry.clone());
    }
    Ok(copied)
}

fn copy_dir(src: &Path, dest: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Run the full pipeline into `dist`.
pub fn build(
    config: SiteConfig,
    root: &Path,
    dist: &Path,
    content: &dyn ContentSource,
) -> Result<BuildReport, BuildError> {
    let started = Instant::now();
    let mut ctx = BuildContext::new(config, root.to_path_buf(), dist.to_path_buf(), content);
    let mut steps = Vec::new();
    let mut written_pages = Vec::new();

    let ((), timing) = run_step(STEP_CLEAN, || clean(dist))?;
    steps.push(timing);

    let entries = ctx.config.site.static_entries.clone();
    let (copied, timing) = run_step(STEP_COPY, || copy_static_assets(root, dist, &entries))?;
    log::debug!("copied static entries: {}", copied.join(", "));
    steps.push(timing);

    let single_pages: [(&'static str, fn(&mut BuildContext) -> Result<PathBuf, RenderError>); 5] = [
        (STEP_LANDING, pages::landing::render),
        (STEP_EVENTS, pages::events::render),
        (STEP_ABOUT, pages::about::render),
        (STEP_TEAM, pages::team::render),
        (STEP_WATCH, pages::watch::render),
    ];
    for (label, render) in single_pages {
        let (path, timing) = run_step(label, || render(&mut ctx))?;
        output::print_written(std::slice::from_ref(&path), dist);
        written_pages.push(path);
        steps.push(timing);
    }

    let (written, timing) = run_step(STEP_STATIC_PAGES, || pages::static_pages::render(&mut ctx))?;
    output::print_written(&written, dist);
    written_pages.extend(written);
    steps.push(timing);

    let elapsed = started.elapsed();
    output::print_build_complete(elapsed, dist);
    Ok(BuildReport {
        steps,
        pages: written_pages,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentError;
    use crate::test_helpers::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn clean_removes_tree_and_tolerates_absence() {
        let tmp = TempDir::new().unwrap();
        let dist = tmp.path().join("dist");
        fs::create_dir_all(dist.join("a/b")).unwrap();
        fs::write(dist.join("a/b/c.html"), "x").unwrap();

        clean(&dist).unwrap();
        assert!(!dist.exists());
        clean(&dist).unwrap();
    }

    #[test]
    fn copies_files_and_directories_skipping_missing() {
        let site = setup_site();
        let dist = site.path().join("out");
        let entries: Vec<String> = ["assets", "styles.css", "notes.md"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let copied = copy_static_assets(site.path(), &dist, &entries).unwrap();

        assert_eq!(copied, vec!["assets", "styles.css"]);
        assert!(dist.join("styles.css").is_file());
        assert_eq!(
            fs::read(dist.join("assets/logos/social/LI-In-Bug.png")).unwrap(),
            fs::read(site.path().join("assets/logos/social/LI-In-Bug.png")).unwrap()
        );
    }

    #[test]
    fn run_step_wraps_failure_with_label() {
        let err = run_step(STEP_TEAM, || -> Result<(), RenderError> {
            Err(RenderError::EmptyContent("No team members found for year 2030.".into()))
        })
        .unwrap_err();
        assert_eq!(err.label(), STEP_TEAM);
        assert_eq!(
            err.to_string(),
            "Rendering team page failed: No team members found for year 2030."
        );
    }

    #[test]
    fn failing_step_aborts_remaining_steps() {
        let site = setup_site();
        let content = MockContent::new(|q| match q.name {
            "StaticImagesByCode" => Err(ContentError::Query("images down".into())),
            _ => Ok(json!({})),
        });
        let dist = site.path().join("dist");
        let err = build(SiteConfig::default(), site.path(), &dist, &content).unwrap_err();

        // Landing injects strictly, so the asset failure stops the build there.
        assert_eq!(err.label(), STEP_LANDING);
        assert_eq!(content.call_names(), vec!["StaticImagesByCode"]);
        assert!(dist.join("styles.css").is_file());
        // Copied verbatim, never rendered.
        assert_eq!(
            fs::read(dist.join(pages::events::TEMPLATE)).unwrap(),
            fs::read(site.path().join(pages::events::TEMPLATE)).unwrap()
        );
    }
}
