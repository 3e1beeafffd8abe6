pub mod render;
pub mod summary;

use crate::annotation::log::{AnnotationLog, LogSnapshot};
use crate::error::{CoreError, CoreResult};
use crate::identity::AnnotatorId;
use crate::policy::export_gate::evaluate_export_gate;
use crate::policy::types::AnnotationPolicy;
use tracing::{info, warn};

pub const DEFAULT_EXPORT_FILE_NAME: &str = "annotations_finales.csv";

/// Full log snapshot for the privileged identity; `Forbidden` for anyone else,
/// without touching the log.
pub fn export(
    log: &AnnotationLog,
    policy: &AnnotationPolicy,
    requester: &AnnotatorId,
) -> CoreResult<LogSnapshot> {
    if let Err(reason) = evaluate_export_gate(policy, requester) {
        warn!(requester = %requester, reason = ?reason, "export forbidden");
        return Err(CoreError::Forbidden);
    }
    let snapshot = log.snapshot()?;
    info!(requester = %requester, rows = snapshot.len(), "export granted");
    Ok(snapshot)
}
