// Chat-style presentation of persisted conversations.
//
// Rendering is a pure function over an explicit, serializable view state;
// the CLI handlers build the state from the repositories each invocation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{Conversation, Turn};

/// Snapshot of one conversation ready for display.
#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub conversation: Conversation,
    pub turns: Vec<Turn>,
}

/// Indent for right-aligned bubbles (the first speaker's side of the chat).
const RIGHT_INDENT: usize = 40;

/// Render a conversation as a chat transcript. The first speaker label
/// ("A") gets the right-hand side, everyone else the left, mirroring a
/// two-column chat layout.
pub fn render_transcript(view: &ConversationView) -> String {
    let conv = &view.conversation;
    let mut out = String::new();

    out.push_str(&format!(
        "{} | {} | {} turns | {} speakers\n",
        conv.filename,
        format_duration(conv.duration),
        conv.turns,
        conv.speakers
    ));
    out.push_str(&"-".repeat(72));
    out.push('\n');

    for turn in &view.turns {
        let indent = if turn.speaker.eq_ignore_ascii_case("a") {
            " ".repeat(RIGHT_INDENT)
        } else {
            String::new()
        };

        out.push_str(&format!(
            "{indent}{}  [{:.1}s - {:.1}s]\n",
            turn.speaker.to_uppercase(),
            turn.start_ms as f64 / 1000.0,
            turn.end_ms as f64 / 1000.0
        ));
        for line in turn.text.lines() {
            out.push_str(&format!("{indent}{line}\n"));
        }
        out.push('\n');
    }

    out
}

/// Render the history list, newest processed first (the repository already
/// orders it).
pub fn render_history(conversations: &[Conversation], now: DateTime<Utc>) -> String {
    if conversations.is_empty() {
        return "No conversations yet. Process an audio file to get started.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("{} conversation(s)\n\n", conversations.len()));

    for conv in conversations {
        out.push_str(&format!("{}  ({})\n", conv.filename, conv.id));
        out.push_str(&format!(
            "    processed {} | viewed {} | {} | {} turns | {} speakers\n",
            date_part(&conv.processed_at),
            time_ago(&conv.last_viewed, now),
            format_duration(conv.duration),
            conv.turns,
            conv.speakers
        ));
    }

    out
}

/// `M:SS` duration, truncated to whole seconds.
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0) as u64;
    let secs = (seconds % 60.0) as u64;
    format!("{}:{:02}", minutes, secs)
}

/// Human-readable distance from `timestamp` (RFC 3339) to `now`.
pub fn time_ago(timestamp: &str, now: DateTime<Utc>) -> String {
    if timestamp.is_empty() {
        return "Never".to_string();
    }

    let then = match DateTime::parse_from_rfc3339(timestamp) {
        Ok(t) => t.with_timezone(&Utc),
        Err(_) => return "Unknown".to_string(),
    };

    let diff = now.signed_duration_since(then);
    if diff.num_days() > 0 {
        format!("{}d ago", diff.num_days())
    } else if diff.num_hours() > 0 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_minutes() > 0 {
        format!("{}m ago", diff.num_minutes())
    } else {
        "Just now".to_string()
    }
}

fn date_part(rfc3339: &str) -> &str {
    rfc3339.get(..10).unwrap_or(rfc3339)
}
