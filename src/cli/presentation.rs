//! CLI presentation: plain-text rendering of command results.

use crate::session::PublishOutcome;
use crate::store::Commit;
use crate::tree::node::Tree;
use crate::types::ObjectId;
use crate::working_copy::Drift;
use chrono::{FixedOffset, TimeZone};

pub fn format_publish_outcome(outcome: &PublishOutcome, operations: usize) -> String {
    match outcome {
        PublishOutcome::Committed { commit, tree } => format!(
            "Published {} ({} operations, tree {})",
            commit.short(),
            operations,
            tree.short()
        ),
        PublishOutcome::Unchanged => "Nothing to publish: snapshot unchanged".to_string(),
    }
}

pub fn format_listing(tree: &Tree) -> String {
    tree.entries()
        .map(|entry| {
            let suffix = if entry.is_tree() { "/" } else { "" };
            format!("{} {} {}{}", entry.mode, entry.id.short(), entry.name, suffix)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_time(timestamp: i64, offset_minutes: i32) -> String {
    FixedOffset::east_opt(offset_minutes * 60)
        .and_then(|offset| offset.timestamp_opt(timestamp, 0).single())
        .map(|time| time.format("%Y-%m-%d %H:%M:%S %z").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

pub fn format_log(commits: &[(ObjectId, Commit)]) -> String {
    if commits.is_empty() {
        return "No commits yet".to_string();
    }
    commits
        .iter()
        .map(|(id, commit)| {
            let body: Vec<String> = commit
                .message
                .lines()
                .map(|line| format!("    {}", line))
                .collect();
            format!(
                "commit {}\nAuthor: {}\nDate:   {}\n\n{}",
                id,
                commit.author,
                format_time(commit.author.timestamp, commit.author.offset_minutes),
                body.join("\n")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_status(head: Option<ObjectId>, drift: &Drift) -> String {
    let mut lines = vec![match head {
        Some(id) => format!("On commit {}", id.short()),
        None => "No commits yet".to_string(),
    }];
    if drift.is_clean() {
        lines.push("Working directory matches the snapshot".to_string());
        return lines.join("\n");
    }
    for path in &drift.added {
        lines.push(format!("  untracked: {}", path));
    }
    for path in &drift.modified {
        lines.push(format!("  modified:  {}", path));
    }
    for path in &drift.deleted {
        lines.push(format!("  deleted:   {}", path));
    }
    lines.join("\n")
}
