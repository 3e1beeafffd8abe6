use crate::annotation::log::AnnotationLog;
use crate::annotation::model::{Annotation, Intensity, Label};
use crate::comments::store::CommentStore;
use crate::eligibility::engine::check_pair;
use crate::error::{CoreError, CoreResult, Rejection};
use crate::identity::AnnotatorId;
use crate::policy::types::AnnotationPolicy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What the presentation layer collected for one comment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Submission {
    pub comment_id: String,
    pub label: Label,
    pub intensity: Option<Intensity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Accepted {
    pub annotation: Annotation,
    /// Annotations on this comment after the append, own row included.
    pub comment_count: usize,
}

/// Validates and commits one submission.
///
/// Static checks (known comment, intensity rule) run first. Quota and
/// duplicate checks are evaluated against the log re-read under its exclusive
/// lock, so two sessions that both saw the comment as available cannot both
/// land.
pub fn submit(
    store: &CommentStore,
    log: &AnnotationLog,
    policy: &AnnotationPolicy,
    annotator: &AnnotatorId,
    submission: &Submission,
) -> CoreResult<Accepted> {
    let result = commit(store, log, policy, annotator, submission);
    match &result {
        Ok(accepted) => info!(
            comment_id = %submission.comment_id,
            annotator = %annotator,
            label = %submission.label,
            count = accepted.comment_count,
            "submission accepted"
        ),
        Err(CoreError::Rejected(reason)) => warn!(
            comment_id = %submission.comment_id,
            annotator = %annotator,
            reason = reason.code(),
            "submission rejected"
        ),
        Err(_) => {}
    }
    result
}

fn commit(
    store: &CommentStore,
    log: &AnnotationLog,
    policy: &AnnotationPolicy,
    annotator: &AnnotatorId,
    submission: &Submission,
) -> CoreResult<Accepted> {
    let comment = store
        .get(&submission.comment_id)
        .ok_or(Rejection::UnknownComment)?;
    let annotation = Annotation::new(comment, annotator, submission.label, submission.intensity)?;

    let quota = policy.quota();
    let after = log.append_checked(annotation.clone(), |fresh| {
        check_pair(fresh, &submission.comment_id, annotator, quota)
    })?;

    let comment_count = after
        .iter()
        .filter(|a| a.comment_id == submission.comment_id)
        .count();
    Ok(Accepted {
        annotation,
        comment_count,
    })
}
