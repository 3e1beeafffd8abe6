use crate::comments::model::Comment;
use crate::eligibility::assignment::SessionCursor;
use crate::error::CoreResult;
use crate::identity::AnnotatorId;
use crate::service::AnnotationService;
use crate::submission::validator::{Accepted, Submission};

/// One annotator's interaction state. Requires an identity up front, so no
/// labeling action is possible without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatorSession {
    annotator: AnnotatorId,
    cursor: SessionCursor,
}

impl AnnotatorSession {
    pub fn begin(raw_identity: &str) -> CoreResult<Self> {
        Ok(Self {
            annotator: AnnotatorId::parse(raw_identity)?,
            cursor: SessionCursor::start(),
        })
    }

    pub fn resume(annotator: AnnotatorId, cursor: SessionCursor) -> Self {
        Self { annotator, cursor }
    }

    pub fn annotator(&self) -> &AnnotatorId {
        &self.annotator
    }

    pub fn cursor(&self) -> SessionCursor {
        self.cursor
    }

    /// Comment to present now, from a fresh read of the log. `None` means
    /// this annotator is done.
    pub fn next<'s>(&mut self, service: &'s AnnotationService) -> CoreResult<Option<&'s Comment>> {
        let (pick, cursor) = service.next_for(&self.annotator, self.cursor)?;
        self.cursor = cursor;
        Ok(pick)
    }

    /// Commits a label; the cursor only moves when the submission lands.
    pub fn submit(
        &mut self,
        service: &AnnotationService,
        submission: &Submission,
    ) -> CoreResult<Accepted> {
        let accepted = service.submit(&self.annotator, submission)?;
        self.cursor = service.advance(self.cursor);
        Ok(accepted)
    }

    pub fn skip(&mut self, service: &AnnotationService) {
        self.cursor = service.advance(self.cursor);
    }
}
