use crate::identity::AnnotatorId;
use crate::policy::types::AnnotationPolicy;
use serde::{Deserialize, Serialize};

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExportBlockReason {
    NO_PRIVILEGED_IDENTITY,
    IDENTITY_MISMATCH,
}

pub fn evaluate_export_gate(
    policy: &AnnotationPolicy,
    requester: &AnnotatorId,
) -> Result<(), ExportBlockReason> {
    match policy.privileged_identity() {
        None => Err(ExportBlockReason::NO_PRIVILEGED_IDENTITY),
        Some(admin) if admin == requester => Ok(()),
        Some(_) => Err(ExportBlockReason::IDENTITY_MISMATCH),
    }
}
