use crate::annotation::log::{AnnotationLog, LogSnapshot};
use crate::audit::event::{
    Actor, AuditEvent, EXPORT_FORBIDDEN, EXPORT_GRANTED, SUBMISSION_ACCEPTED, SUBMISSION_REJECTED,
};
use crate::audit::log::AuditLog;
use crate::comments::model::Comment;
use crate::comments::store::CommentStore;
use crate::config::AnnotationConfig;
use crate::eligibility::assignment::{self, AssignmentStrategy, SessionCursor};
use crate::eligibility::engine::eligible;
use crate::error::{CoreError, CoreResult};
use crate::export::render::render_annotations_csv;
use crate::export::summary::{annotator_progress, summarize, AnnotatorProgress, LogSummary};
use crate::identity::AnnotatorId;
use crate::policy::export_gate::evaluate_export_gate;
use crate::policy::types::AnnotationPolicy;
use crate::submission::validator::{submit, Accepted, Submission};
use crate::validator::{check_journal, check_log, ValidationSummary};
use serde_json::json;
use tracing::{info, warn};

/// Wires the comment store, the shared log and the policy together.
///
/// Holds no per-annotator state; sessions keep their own cursor (see
/// `session::AnnotatorSession`), so one service can back any number of
/// concurrent sessions.
pub struct AnnotationService {
    store: CommentStore,
    log: AnnotationLog,
    policy: AnnotationPolicy,
    strategy: AssignmentStrategy,
    journal: Option<AuditLog>,
}

impl AnnotationService {
    pub fn new(
        store: CommentStore,
        log: AnnotationLog,
        policy: AnnotationPolicy,
        strategy: AssignmentStrategy,
    ) -> Self {
        Self {
            store,
            log,
            policy,
            strategy,
            journal: None,
        }
    }

    /// Loads the dataset and opens the log. A dataset schema error is fatal
    /// here; nothing partial is returned.
    pub fn open(cfg: &AnnotationConfig) -> CoreResult<Self> {
        let policy = cfg.policy()?;
        let store = CommentStore::load_csv(&cfg.data_file)?;
        let log = AnnotationLog::open_or_create(&cfg.log_file)?;
        let mut service = Self::new(store, log, policy, cfg.strategy);
        if let Some(path) = &cfg.journal_file {
            service = service.with_journal(AuditLog::open_or_create(path)?);
        }
        info!(
            comments = service.store.len(),
            quota = service.policy.quota(),
            strategy = ?service.strategy,
            "annotation service ready"
        );
        Ok(service)
    }

    pub fn with_journal(mut self, journal: AuditLog) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn store(&self) -> &CommentStore {
        &self.store
    }

    pub fn log(&self) -> &AnnotationLog {
        &self.log
    }

    pub fn policy(&self) -> &AnnotationPolicy {
        &self.policy
    }

    pub fn strategy(&self) -> AssignmentStrategy {
        self.strategy
    }

    pub fn journal(&self) -> Option<&AuditLog> {
        self.journal.as_ref()
    }

    pub fn eligible_for(&self, annotator: &AnnotatorId) -> CoreResult<Vec<&Comment>> {
        let snapshot = self.log.snapshot()?;
        Ok(eligible(&self.store, &snapshot, annotator, self.policy.quota()))
    }

    pub fn next_for(
        &self,
        annotator: &AnnotatorId,
        cursor: SessionCursor,
    ) -> CoreResult<(Option<&Comment>, SessionCursor)> {
        let pool = self.eligible_for(annotator)?;
        Ok(assignment::next(&pool, self.strategy, cursor))
    }

    pub fn advance(&self, cursor: SessionCursor) -> SessionCursor {
        assignment::advance(self.strategy, cursor)
    }

    pub fn submit(&self, annotator: &AnnotatorId, submission: &Submission) -> CoreResult<Accepted> {
        let result = submit(&self.store, &self.log, &self.policy, annotator, submission);
        match &result {
            Ok(accepted) => self.record(
                SUBMISSION_ACCEPTED,
                Actor::Annotator,
                json!({
                    "comment_id": submission.comment_id,
                    "annotator": annotator.as_str(),
                    "label": submission.label.as_str(),
                    "comment_count": accepted.comment_count
                }),
            ),
            Err(CoreError::Rejected(reason)) => self.record(
                SUBMISSION_REJECTED,
                Actor::Annotator,
                json!({
                    "comment_id": submission.comment_id,
                    "annotator": annotator.as_str(),
                    "reason": reason.code()
                }),
            ),
            Err(_) => {}
        }
        result
    }

    pub fn export(&self, requester: &AnnotatorId) -> CoreResult<LogSnapshot> {
        let snapshot = match crate::export::export(&self.log, &self.policy, requester) {
            Err(CoreError::Forbidden) => {
                let reason = evaluate_export_gate(&self.policy, requester).err();
                self.record(
                    EXPORT_FORBIDDEN,
                    Actor::Annotator,
                    json!({ "requester": requester.as_str(), "reason": reason }),
                );
                return Err(CoreError::Forbidden);
            }
            other => other?,
        };
        self.record(
            EXPORT_GRANTED,
            Actor::Admin,
            json!({ "requester": requester.as_str(), "rows": snapshot.len() }),
        );
        Ok(snapshot)
    }

    /// Downloadable artifact for the privileged identity.
    pub fn export_csv(&self, requester: &AnnotatorId) -> CoreResult<String> {
        render_annotations_csv(&self.export(requester)?)
    }

    /// Progress over the whole log; gated like the export.
    pub fn summary(&self, requester: &AnnotatorId) -> CoreResult<LogSummary> {
        evaluate_export_gate(&self.policy, requester).map_err(|_| CoreError::Forbidden)?;
        let snapshot = self.log.snapshot()?;
        Ok(summarize(&self.store, &snapshot, self.policy.quota()))
    }

    pub fn progress(&self, annotator: &AnnotatorId) -> CoreResult<AnnotatorProgress> {
        let snapshot = self.log.snapshot()?;
        Ok(annotator_progress(
            &self.store,
            &snapshot,
            annotator,
            self.policy.quota(),
        ))
    }

    /// Log invariant checks, plus the journal chain when one is configured.
    pub fn check(&self) -> CoreResult<ValidationSummary> {
        let snapshot = self.log.snapshot()?;
        let mut summary = check_log(&self.store, &snapshot, self.policy.quota());
        if let Some(journal) = &self.journal {
            summary.push(check_journal(journal)?);
        }
        Ok(summary)
    }

    // Journal failures never undo a committed decision; they are logged.
    fn record(&self, event_type: &str, actor: Actor, details: serde_json::Value) {
        let Some(journal) = &self.journal else {
            return;
        };
        if let Err(e) = AuditEvent::new(event_type, actor, details).and_then(|ev| journal.append(ev)) {
            warn!(event_type, error = %e, "failed to journal decision");
        }
    }
}
