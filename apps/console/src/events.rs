//! Rendering of list changes and controller events for the terminal.

use std::sync::Arc;

use client_core::{ControllerEvent, FailureKind, ListChange, QueryRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Unreachable,
    TimedOut,
    Server,
    BadResponse,
    Misconfigured,
    Cancelled,
}

pub fn classify_request_failure(kind: FailureKind) -> FailureCategory {
    match kind {
        FailureKind::Transport { timeout: true } => FailureCategory::TimedOut,
        FailureKind::Transport { timeout: false } => FailureCategory::Unreachable,
        FailureKind::Status { .. } => FailureCategory::Server,
        FailureKind::MalformedBody => FailureCategory::BadResponse,
        FailureKind::InvalidUrl => FailureCategory::Misconfigured,
        FailureKind::Cancelled => FailureCategory::Cancelled,
    }
}

pub fn describe_failure(kind: FailureKind, reason: &str) -> String {
    match classify_request_failure(kind) {
        FailureCategory::Unreachable => {
            "Prediction service unreachable; check the URL/network and retry.".to_string()
        }
        FailureCategory::TimedOut => "Prediction service timed out; retry later.".to_string(),
        FailureCategory::Server => format!("Prediction service error: {reason}"),
        FailureCategory::BadResponse => {
            format!("Prediction service sent an unusable response: {reason}")
        }
        FailureCategory::Misconfigured => format!("Service address is invalid: {reason}"),
        FailureCategory::Cancelled => "Request cancelled.".to_string(),
    }
}

pub fn render_record(position: usize, record: &QueryRecord) -> String {
    let marker = if record.is_editing.get() { "*" } else { " " };
    format!(
        "{marker}#{row:<3} {summary:<16} {confidence:>6.3}  {created}  {text}",
        row = position + 1,
        summary = record.summary(),
        confidence = record.confidence(),
        created = record.created_at().format("%H:%M:%S"),
        text = record.text.get(),
    )
}

pub fn render_change(change: &ListChange<Arc<QueryRecord>>) -> String {
    match change {
        ListChange::Inserted { index, item } => format!("+ {}", render_record(*index, item)),
        ListChange::Removed { index, item } => {
            format!("- #{} {}", index + 1, item.text.get())
        }
        ListChange::Cleared => "- (all rows)".to_string(),
    }
}

/// Notices worth showing for an event; list mutations are rendered from
/// the list itself, and validation alerts are shown synchronously.
pub fn render_event(event: &ControllerEvent) -> Option<String> {
    match event {
        ControllerEvent::RequestFailed {
            operation,
            text,
            kind,
            reason,
        } => Some(format!(
            "! {operation} of \"{text}\" failed. {}",
            describe_failure(*kind, reason)
        )),
        ControllerEvent::ValidationFailed { .. }
        | ControllerEvent::RecordAdded { .. }
        | ControllerEvent::RecordRemoved { .. } => None,
    }
}
