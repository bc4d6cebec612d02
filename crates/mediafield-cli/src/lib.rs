//! Helpers shared by the `mediafield` binary.

use std::path::Path;

use anyhow::{anyhow, Context};
use mediafield_core::{AttachmentEntry, MediaRecord, PendingUpload};
use mediafield_sync::ReconcileOutcome;
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Prefix marking a staged upload token in a desired-state entry.
pub const UPLOAD_PREFIX: &str = "upload:";

/// Parse one desired-state entry: a record uuid, or `upload:<token>`.
pub fn parse_entry(raw: &str) -> anyhow::Result<(String, AttachmentEntry)> {
    if let Some(token) = raw.strip_prefix(UPLOAD_PREFIX) {
        if token.is_empty() {
            return Err(anyhow!("Empty upload token in entry: {}", raw));
        }
        return Ok((
            raw.to_string(),
            AttachmentEntry::Pending(PendingUpload::new(token)),
        ));
    }

    let uuid = Uuid::parse_str(raw).with_context(|| format!("Invalid media uuid: {}", raw))?;
    Ok((uuid.to_string(), AttachmentEntry::Persisted(uuid)))
}

/// Mime type from a file extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[derive(Debug, Serialize)]
pub struct MediaSummary {
    pub uuid: Uuid,
    pub id: i64,
    pub name: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub order_column: i64,
}

impl From<&MediaRecord> for MediaSummary {
    fn from(record: &MediaRecord) -> Self {
        Self {
            uuid: record.uuid,
            id: record.id,
            name: record.display_name().to_string(),
            file_name: record.file_name.clone(),
            mime_type: record.mime_type.clone(),
            size_bytes: record.size_bytes,
            order_column: record.order_column,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SyncSummary {
    pub deleted: Vec<Uuid>,
    pub created: Vec<Uuid>,
    pub skipped: Vec<String>,
    pub unresolved: Vec<Uuid>,
    pub order: Vec<(Uuid, i64)>,
    pub errors: Vec<String>,
    pub state: JsonValue,
}

impl From<&ReconcileOutcome> for SyncSummary {
    fn from(outcome: &ReconcileOutcome) -> Self {
        Self {
            deleted: outcome.deleted.clone(),
            created: outcome.created.clone(),
            skipped: outcome.skipped.clone(),
            unresolved: outcome.unresolved.clone(),
            order: outcome.order.clone(),
            errors: outcome.errors.iter().map(|e| e.to_string()).collect(),
            state: outcome.state.to_hydrated(),
        }
    }
}

pub fn print_media_table(records: &[MediaRecord]) {
    if records.is_empty() {
        println!("No media found.");
        return;
    }

    println!(
        "{:<36} {:>6} {:<30} {:<20} {:>12}",
        "UUID", "Order", "Name", "Mime Type", "Size (bytes)"
    );
    println!("{}", "-".repeat(108));

    for record in records {
        println!(
            "{:<36} {:>6} {:<30} {:<20} {:>12}",
            record.uuid,
            record.order_column,
            truncate_string(record.display_name(), 30),
            truncate_string(&record.mime_type, 20),
            record.size_bytes
        );
    }
}
