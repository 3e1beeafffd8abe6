use crate::annotation::log::LogSnapshot;
use crate::comments::model::Comment;
use crate::comments::store::CommentStore;
use crate::error::Rejection;
use crate::identity::AnnotatorId;
use std::collections::{HashMap, HashSet};

/// Per-comment annotation counts plus the comments one annotator has already
/// labeled, aggregated in a single pass over the log.
#[derive(Debug, Clone, Default)]
pub struct EligibilityIndex {
    counts: HashMap<String, usize>,
    own: HashSet<String>,
}

impl EligibilityIndex {
    pub fn build(log: &LogSnapshot, annotator: &AnnotatorId) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut own = HashSet::new();
        for a in log.iter() {
            *counts.entry(a.comment_id.clone()).or_default() += 1;
            if annotator.matches_raw(&a.annotator) {
                own.insert(a.comment_id.clone());
            }
        }
        Self { counts, own }
    }

    pub fn count(&self, comment_id: &str) -> usize {
        self.counts.get(comment_id).copied().unwrap_or(0)
    }

    pub fn annotated_by_self(&self, comment_id: &str) -> bool {
        self.own.contains(comment_id)
    }

    pub fn check(&self, comment_id: &str, quota: usize) -> Result<(), Rejection> {
        if self.annotated_by_self(comment_id) {
            return Err(Rejection::AlreadyAnnotated);
        }
        if self.count(comment_id) >= quota {
            return Err(Rejection::QuotaExceeded);
        }
        Ok(())
    }

    pub fn is_eligible(&self, comment_id: &str, quota: usize) -> bool {
        self.check(comment_id, quota).is_ok()
    }
}

/// Comments `annotator` may still label, in dataset order.
///
/// The log may already be stale when this returns; the submission path
/// re-checks under the write lock.
pub fn eligible<'a>(
    store: &'a CommentStore,
    log: &LogSnapshot,
    annotator: &AnnotatorId,
    quota: usize,
) -> Vec<&'a Comment> {
    let index = EligibilityIndex::build(log, annotator);
    store
        .iter()
        .filter(|c| index.is_eligible(&c.comment_id, quota))
        .collect()
}

/// Eligibility of one (comment, annotator) pair.
pub fn check_pair(
    log: &LogSnapshot,
    comment_id: &str,
    annotator: &AnnotatorId,
    quota: usize,
) -> Result<(), Rejection> {
    let mut count = 0usize;
    for a in log.iter().filter(|a| a.comment_id == comment_id) {
        if annotator.matches_raw(&a.annotator) {
            return Err(Rejection::AlreadyAnnotated);
        }
        count += 1;
    }
    if count >= quota {
        return Err(Rejection::QuotaExceeded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::model::{Annotation, Label};

    fn store() -> CommentStore {
        CommentStore::from_comments(vec![
            Comment::from_text("one"),
            Comment::from_text("two"),
            Comment::from_text("three"),
        ])
    }

    fn ann(c: &Comment, who: &str) -> Annotation {
        Annotation {
            comment_id: c.comment_id.clone(),
            text: None,
            annotator: who.to_string(),
            label: Label::NonAbusive,
            intensity: None,
        }
    }

    fn who(s: &str) -> AnnotatorId {
        AnnotatorId::parse(s).unwrap()
    }

    #[test]
    fn empty_log_makes_everything_eligible() {
        let s = store();
        let out = eligible(&s, &LogSnapshot::default(), &who("u1@x"), 3);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn own_annotations_and_full_comments_are_excluded() {
        let s = store();
        let c = s.comments();
        let log = LogSnapshot::from_annotations(vec![
            ann(&c[0], "u1@x"),
            ann(&c[1], "u2@x"),
            ann(&c[1], "u3@x"),
            ann(&c[1], "u4@x"),
            ann(&c[2], "u2@x"),
        ]);
        let out: Vec<&str> = eligible(&s, &log, &who("u1@x"), 3)
            .into_iter()
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(out, ["three"]);

        let out: Vec<&str> = eligible(&s, &log, &who("u5@x"), 3)
            .into_iter()
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(out, ["one", "three"]);
    }

    #[test]
    fn identity_match_ignores_case_in_historical_rows() {
        let s = store();
        let log = LogSnapshot::from_annotations(vec![ann(&s.comments()[0], " U1@X ")]);
        assert_eq!(eligible(&s, &log, &who("u1@x"), 3).len(), 2);
    }

    #[test]
    fn pair_check_prefers_already_annotated() {
        let s = store();
        let c = &s.comments()[0];
        let log = LogSnapshot::from_annotations(vec![ann(c, "u1@x"), ann(c, "u2@x")]);
        assert_eq!(
            check_pair(&log, &c.comment_id, &who("u1@x"), 2),
            Err(Rejection::AlreadyAnnotated)
        );
        assert_eq!(
            check_pair(&log, &c.comment_id, &who("u3@x"), 2),
            Err(Rejection::QuotaExceeded)
        );
        assert_eq!(check_pair(&log, &c.comment_id, &who("u3@x"), 3), Ok(()));
    }

    #[test]
    fn index_and_pair_check_agree() {
        let s = store();
        let c = s.comments();
        let log = LogSnapshot::from_annotations(vec![
            ann(&c[0], "a@x"),
            ann(&c[0], "b@x"),
            ann(&c[2], "a@x"),
        ]);
        for annotator in ["a@x", "b@x", "c@x"] {
            let id = who(annotator);
            let index = EligibilityIndex::build(&log, &id);
            for comment in c {
                for quota in 1..=3 {
                    assert_eq!(
                        index.check(&comment.comment_id, quota),
                        check_pair(&log, &comment.comment_id, &id, quota)
                    );
                }
            }
        }
    }
}
