//! CLI output formatting for the build pipeline.
//!
//! Each build step prints a start line and a completion line with its
//! elapsed time; the orchestrator closes with a summary. Diagnostics (skipped
//! years, swallowed asset fetch failures) go through `log` instead and are
//! not part of this output.
//!
//! # Output Format
//!
//! ```text
//! ▶ Cleaning dist...
//! ✓ Cleaning dist (2ms)
//! ▶ Copying static assets...
//! ✓ Copying static assets (14ms)
//! ▶ Rendering landing page...
//! ✓ Rendering landing page (1.32s)
//!     index.html
//! ...
//! Build complete in 4.07s. Output in dist
//! ```
//!
//! # Architecture
//!
//! Each line kind has a `format_*` function for testability and a `print_*`
//! wrapper that writes to stdout. Format functions are pure: no I/O, no side
//! effects.

use std::path::Path;
use std::time::Duration;

/// `<n>ms` below one second, `<n.nn>s` from there on.
pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.2}s", ms as f64 / 1000.0)
    }
}

pub fn format_step_start(label: &str) -> String {
    format!("▶ {label}...")
}

pub fn format_step_done(label: &str, elapsed: Duration) -> String {
    format!("✓ {label} ({})", format_elapsed(elapsed))
}

/// Written pages, relative to the output directory where possible.
pub fn format_written(paths: &[impl AsRef<Path>], dist: &Path) -> Vec<String> {
    paths
        .iter()
        .map(|p| {
            let p = p.as_ref();
            let shown = p.strip_prefix(dist).unwrap_or(p);
            format!("    {}", shown.display())
        })
        .collect()
}

pub fn format_build_complete(elapsed: Duration, dist: &Path) -> String {
    format!(
        "Build complete in {}. Output in {}",
        format_elapsed(elapsed),
        dist.display()
    )
}

pub fn print_step_start(label: &str) {
    println!("{}", format_step_start(label));
}

pub fn print_step_done(label: &str, elapsed: Duration) {
    println!("{}", format_step_done(label, elapsed));
}

pub fn print_written(paths: &[impl AsRef<Path>], dist: &Path) {
    for line in format_written(paths, dist) {
        println!("{line}");
    }
}

pub fn print_build_complete(elapsed: Duration, dist: &Path) {
    println!("{}", format_build_complete(elapsed, dist));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn elapsed_under_a_second_is_milliseconds() {
        assert_eq!(format_elapsed(Duration::from_millis(0)), "0ms");
        assert_eq!(format_elapsed(Duration::from_micros(999_900)), "999ms");
    }

    #[test]
    fn elapsed_from_a_second_is_seconds() {
        assert_eq!(format_elapsed(Duration::from_millis(1000)), "1.00s");
        assert_eq!(format_elapsed(Duration::from_millis(4071)), "4.07s");
        assert_eq!(format_elapsed(Duration::from_secs(75)), "75.00s");
    }

    #[test]
    fn step_lines() {
        assert_eq!(format_step_start("Cleaning dist"), "▶ Cleaning dist...");
        assert_eq!(
            format_step_done("Rendering team page", Duration::from_millis(250)),
            "✓ Rendering team page (250ms)"
        );
    }

    #[test]
    fn written_paths_are_relative_to_dist() {
        let dist = PathBuf::from("/tmp/site/dist");
        let lines = format_written(
            &[dist.join("index.html"), PathBuf::from("/elsewhere/x.html")],
            &dist,
        );
        assert_eq!(lines, vec!["    index.html", "    /elsewhere/x.html"]);
    }

    #[test]
    fn summary_line() {
        assert_eq!(
            format_build_complete(Duration::from_millis(1500), Path::new("dist")),
            "Build complete in 1.50s. Output in dist"
        );
    }
}
