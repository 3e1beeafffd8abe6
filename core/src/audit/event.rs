use crate::determinism::json_canonical;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    System,
    Annotator,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEvent {
    pub ts_utc: String, // RFC3339 UTC
    pub event_type: String,
    pub actor: Actor,
    pub details: serde_json::Value,
    pub prev_event_hash: String, // hex 64
    pub event_hash: String,      // hex 64
}

pub const ZERO_HASH_64: &str = "0000000000000000000000000000000000000000000000000000000000000000";

pub const SUBMISSION_ACCEPTED: &str = "SUBMISSION_ACCEPTED";
pub const SUBMISSION_REJECTED: &str = "SUBMISSION_REJECTED";
pub const EXPORT_GRANTED: &str = "EXPORT_GRANTED";
pub const EXPORT_FORBIDDEN: &str = "EXPORT_FORBIDDEN";

impl AuditEvent {
    /// Unchained event; `AuditLog::append` fills in both hashes.
    pub fn new(event_type: &str, actor: Actor, details: serde_json::Value) -> CoreResult<Self> {
        Ok(Self {
            ts_utc: now_rfc3339_utc()?,
            event_type: event_type.to_string(),
            actor,
            details,
            prev_event_hash: String::new(),
            event_hash: String::new(),
        })
    }
}

// event_hash = SHA-256 over the canonical JSON of the whole envelope, with
// event_hash itself set to ZERO_HASH_64 while hashing.
pub fn compute_event_hash(event: &AuditEvent) -> CoreResult<String> {
    let mut e = event.clone();
    e.event_hash = ZERO_HASH_64.to_string();
    let bytes = json_canonical::to_canonical_bytes(&e)?;
    let mut h = Sha256::new();
    h.update(bytes);
    Ok(hex::encode(h.finalize()))
}

pub fn finalize_event(mut event: AuditEvent) -> CoreResult<AuditEvent> {
    if !is_hex64(&event.prev_event_hash) {
        return Err(CoreError::InvalidInput(
            "prev_event_hash must be 64 hex chars".to_string(),
        ));
    }
    validate_event_taxonomy(&event)?;
    event.event_hash = compute_event_hash(&event)?;
    Ok(event)
}

pub(crate) fn is_hex64(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn validate_event_taxonomy(event: &AuditEvent) -> CoreResult<()> {
    let required = required_detail_keys(&event.event_type).ok_or_else(|| {
        CoreError::InvalidInput(format!("unknown event_type {}", event.event_type))
    })?;
    for k in required {
        if event.details.get(k).is_none() {
            return Err(CoreError::InvalidInput(format!(
                "event {} missing details.{}",
                event.event_type, k
            )));
        }
    }
    Ok(())
}

fn required_detail_keys(event_type: &str) -> Option<&'static [&'static str]> {
    match event_type {
        SUBMISSION_ACCEPTED => Some(&["comment_id", "annotator", "label", "comment_count"]),
        SUBMISSION_REJECTED => Some(&["comment_id", "annotator", "reason"]),
        EXPORT_GRANTED => Some(&["requester", "rows"]),
        EXPORT_FORBIDDEN => Some(&["requester", "reason"]),
        _ => None,
    }
}

fn now_rfc3339_utc() -> CoreResult<String> {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|e| CoreError::InvalidInput(format!("timestamp formatting failed: {}", e)))
}
