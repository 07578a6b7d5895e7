//! CLI output formatting for a partition run.
//!
//! Per-file activity goes through the log (`-v` shows every copy and link).
//! What lands on stdout is the end-of-run summary:
//!
//! ```text
//! Rich tree
//!     1 copied, 2 linked
//! Plain tree
//!     14 linked
//! Skipped
//!     3 already present
//! Unparsed front matter
//!     drafts/index.md
//!
//! Placed 17 files
//! ```
//!
//! With `--simulate` the last line reads `Would place 17 files (simulated)`.
//! `--json` prints the whole report instead.
//!
//! Format functions are pure and return lines; `print_*` wrappers write them.

use crate::place::{Action, Outcome, Tree};
use crate::route::RouteReport;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Counts for one tree, leaving out actions that never happened there.
fn tree_line(report: &RouteReport, tree: Tree) -> Option<String> {
    let copied = report.count(tree, Action::Copy);
    let linked = report.count(tree, Action::Link);
    let parts: Vec<String> = [(copied, "copied"), (linked, "linked")]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{n} {label}"))
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Format the end-of-run summary.
pub fn format_summary(report: &RouteReport) -> Vec<String> {
    let mut lines = Vec::new();

    for (label, tree) in [("Rich tree", Tree::Rich), ("Plain tree", Tree::Plain)] {
        if let Some(counts) = tree_line(report, tree) {
            lines.push(label.to_string());
            lines.push(format!("{}{}", indent(1), counts));
        }
    }

    let skipped = report.count_outcome(Outcome::Skipped);
    if skipped > 0 {
        lines.push("Skipped".to_string());
        lines.push(format!("{}{} already present", indent(1), skipped));
    }

    if !report.invalid_metadata.is_empty() {
        lines.push("Unparsed front matter".to_string());
        for path in &report.invalid_metadata {
            lines.push(format!("{}{}", indent(1), path.display()));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }

    let placed = report.count_outcome(Outcome::Placed);
    let simulated = report.count_outcome(Outcome::Simulated);
    if simulated > 0 {
        lines.push(format!(
            "Would place {} (simulated)",
            plural(simulated, "file")
        ));
    } else if placed > 0 {
        lines.push(format!("Placed {}", plural(placed, "file")));
    } else {
        lines.push("Nothing to place".to_string());
    }
    lines
}

pub fn print_summary(report: &RouteReport) {
    for line in format_summary(report) {
        println!("{}", line);
    }
}

/// The full report as pretty JSON.
pub fn format_json(report: &RouteReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
