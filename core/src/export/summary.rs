use crate::annotation::log::LogSnapshot;
use crate::comments::store::CommentStore;
use crate::eligibility::engine::eligible;
use crate::identity::{normalize_identity, AnnotatorId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogSummary {
    pub quota: usize,
    pub total_annotations: usize,
    pub comments_total: usize,
    pub comments_complete: usize,
    pub comments_remaining: usize,
    /// Rows whose comment id is not in the loaded dataset.
    pub orphan_annotations: usize,
    pub per_annotator: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotatorProgress {
    pub annotator: String,
    pub labeled: usize,
    pub remaining: usize,
}

pub fn summarize(store: &CommentStore, snapshot: &LogSnapshot, quota: usize) -> LogSummary {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut per_annotator = BTreeMap::new();
    let mut orphan_annotations = 0;
    for a in snapshot.iter() {
        if store.contains(&a.comment_id) {
            *counts.entry(a.comment_id.as_str()).or_default() += 1;
        } else {
            orphan_annotations += 1;
        }
        *per_annotator
            .entry(normalize_identity(&a.annotator))
            .or_insert(0usize) += 1;
    }
    let comments_complete = store
        .iter()
        .filter(|c| counts.get(c.comment_id.as_str()).copied().unwrap_or(0) >= quota)
        .count();
    LogSummary {
        quota,
        total_annotations: snapshot.len(),
        comments_total: store.len(),
        comments_complete,
        comments_remaining: store.len() - comments_complete,
        orphan_annotations,
        per_annotator,
    }
}

pub fn annotator_progress(
    store: &CommentStore,
    snapshot: &LogSnapshot,
    annotator: &AnnotatorId,
    quota: usize,
) -> AnnotatorProgress {
    let labeled = snapshot
        .iter()
        .filter(|a| annotator.matches_raw(&a.annotator))
        .count();
    AnnotatorProgress {
        annotator: annotator.to_string(),
        labeled,
        remaining: eligible(store, snapshot, annotator, quota).len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::model::{Annotation, Label};
    use crate::comments::model::Comment;

    fn ann(cid: &str, who: &str) -> Annotation {
        Annotation {
            comment_id: cid.to_string(),
            text: None,
            annotator: who.to_string(),
            label: Label::NonAbusive,
            intensity: None,
        }
    }

    #[test]
    fn counts_complete_remaining_and_orphans() {
        let store = CommentStore::from_comments(vec![
            Comment::from_text("x"),
            Comment::from_text("y"),
        ]);
        let x = store.comments()[0].comment_id.clone();
        let y = store.comments()[1].comment_id.clone();
        let snap = LogSnapshot::from_annotations(vec![
            ann(&x, "a@x"),
            ann(&x, "B@x"),
            ann(&y, "a@x"),
            ann("0", "a@x"),
        ]);
        let s = summarize(&store, &snap, 2);
        assert_eq!(s.total_annotations, 4);
        assert_eq!(s.comments_complete, 1);
        assert_eq!(s.comments_remaining, 1);
        assert_eq!(s.orphan_annotations, 1);
        assert_eq!(s.per_annotator.get("a@x"), Some(&3));
        assert_eq!(s.per_annotator.get("b@x"), Some(&1));

        let p = annotator_progress(&store, &snap, &AnnotatorId::parse("b@x").unwrap(), 2);
        assert_eq!(p.labeled, 1);
        assert_eq!(p.remaining, 1);
    }
}
