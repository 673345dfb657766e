//! Plain-text rendering of envelopes and the status board.

use std::fmt::Write as _;

use beacon_core::ResultEnvelope;
use beacon_core::domain::{StatusBoard, time_ago};
use chrono::{DateTime, Utc};

pub const EMPTY_BOARD: &str = "No status updates yet. Be the first to share what you're up to!";

/// `connected (via relay)` or `error (...)`.
pub fn connection(envelope: &ResultEnvelope) -> String {
    match envelope.strategy_used() {
        Some(strategy) if envelope.is_success() => format!("connected (via {strategy})"),
        _ => format!("error ({})", failure(envelope)),
    }
}

/// One-line failure summary with the per-strategy trail.
pub fn failure(envelope: &ResultEnvelope) -> String {
    let kind = envelope
        .error_kind()
        .map(|k| k.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    if envelope.failures().is_empty() {
        return kind;
    }
    let trail: Vec<String> = envelope
        .failures()
        .iter()
        .map(|f| match f.http_status {
            0 => format!("{}: {} x{}", f.strategy, f.error_kind, f.attempts),
            status => format!("{}: {} {} x{}", f.strategy, f.error_kind, status, f.attempts),
        })
        .collect();
    format!("{kind}; {}", trail.join(", "))
}

pub fn board(board: &StatusBoard, now: DateTime<Utc>) -> String {
    if board.is_empty() {
        return format!("{EMPTY_BOARD}\n0 users online\n");
    }

    let width = board
        .statuses
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for record in &board.statuses {
        let _ = writeln!(
            out,
            "{:<width$}  {}  ({})",
            record.name,
            record.status,
            time_ago(&record.timestamp, now),
        );
    }
    let _ = writeln!(out, "{} users online", board.len());
    out
}
