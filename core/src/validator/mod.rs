use crate::annotation::log::LogSnapshot;
use crate::audit::log::AuditLog;
use crate::comments::store::CommentStore;
use crate::error::CoreResult;
use crate::identity::normalize_identity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const CHECKLIST_VERSION: &str = "annotation_log_checks_v1";

pub const CHK_QUOTA: &str = "CHK.LOG.QUOTA";
pub const CHK_NO_DOUBLE_LABEL: &str = "CHK.LOG.NO_DOUBLE_LABEL";
pub const CHK_INTENSITY: &str = "CHK.LOG.INTENSITY_CONSISTENT";
pub const CHK_KNOWN_COMMENTS: &str = "CHK.LOG.KNOWN_COMMENTS";
pub const CHK_JOURNAL_CHAIN: &str = "CHK.JOURNAL.CHAIN";

// Offending ids listed in a FAIL message before truncation.
const MAX_LISTED: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_id: String,
    pub severity: String, // BLOCKER|WARNING
    pub result: String,   // PASS|FAIL
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub checklist_version: String,
    pub quota: usize,
    pub overall: String, // PASS|FAIL
    pub checks: Vec<CheckResult>,
}

impl ValidationSummary {
    pub fn result_for_check(&self, check_id: &str) -> (String, String) {
        for c in &self.checks {
            if c.check_id == check_id {
                return (c.result.clone(), c.message.clone());
            }
        }
        (
            "FAIL".to_string(),
            format!("missing check result for {}", check_id),
        )
    }

    pub fn push(&mut self, check: CheckResult) {
        self.checks.push(check);
        self.overall = overall_of(&self.checks).to_string();
    }

    pub fn passed(&self) -> bool {
        self.overall == "PASS"
    }
}

/// Re-checks the log invariants after the fact. Only BLOCKER failures fail
/// the overall result; rows pointing at comments missing from the current
/// dataset are a WARNING.
pub fn check_log(store: &CommentStore, snapshot: &LogSnapshot, quota: usize) -> ValidationSummary {
    let checks = vec![
        check_quota(snapshot, quota),
        check_no_double_label(snapshot),
        check_intensity(snapshot),
        check_known_comments(store, snapshot),
    ];
    ValidationSummary {
        checklist_version: CHECKLIST_VERSION.to_string(),
        quota,
        overall: overall_of(&checks).to_string(),
        checks,
    }
}

pub fn check_journal(journal: &AuditLog) -> CoreResult<CheckResult> {
    let report = journal.verify_chain()?;
    Ok(match report.first_broken_line {
        None => pass(CHK_JOURNAL_CHAIN, "BLOCKER", format!("{} events", report.events)),
        Some(line) => fail(
            CHK_JOURNAL_CHAIN,
            "BLOCKER",
            format!("chain broken at line {}", line),
        ),
    })
}

fn overall_of(checks: &[CheckResult]) -> &'static str {
    if checks
        .iter()
        .any(|c| c.severity == "BLOCKER" && c.result != "PASS")
    {
        "FAIL"
    } else {
        "PASS"
    }
}

fn check_quota(snapshot: &LogSnapshot, quota: usize) -> CheckResult {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for a in snapshot.iter() {
        *counts.entry(a.comment_id.as_str()).or_default() += 1;
    }
    let over: Vec<String> = counts
        .into_iter()
        .filter(|(_, n)| *n > quota)
        .map(|(cid, n)| format!("{}={}", cid, n))
        .collect();
    if over.is_empty() {
        pass(CHK_QUOTA, "BLOCKER", "ok".to_string())
    } else {
        fail(
            CHK_QUOTA,
            "BLOCKER",
            format!("{} comment(s) over quota: {}", over.len(), listed(&over)),
        )
    }
}

fn check_no_double_label(snapshot: &LogSnapshot) -> CheckResult {
    let mut seen = BTreeSet::new();
    let mut dupes = BTreeSet::new();
    for a in snapshot.iter() {
        let key = (a.comment_id.clone(), normalize_identity(&a.annotator));
        if !seen.insert(key.clone()) {
            dupes.insert(format!("{}/{}", key.0, key.1));
        }
    }
    if dupes.is_empty() {
        pass(CHK_NO_DOUBLE_LABEL, "BLOCKER", "ok".to_string())
    } else {
        let dupes: Vec<String> = dupes.into_iter().collect();
        fail(
            CHK_NO_DOUBLE_LABEL,
            "BLOCKER",
            format!("{} duplicated pair(s): {}", dupes.len(), listed(&dupes)),
        )
    }
}

fn check_intensity(snapshot: &LogSnapshot) -> CheckResult {
    let bad: Vec<String> = snapshot
        .iter()
        .enumerate()
        .filter(|(_, a)| !a.is_consistent())
        .map(|(i, a)| format!("row {} ({})", i + 1, a.comment_id))
        .collect();
    if bad.is_empty() {
        pass(CHK_INTENSITY, "BLOCKER", "ok".to_string())
    } else {
        fail(
            CHK_INTENSITY,
            "BLOCKER",
            format!("{} inconsistent row(s): {}", bad.len(), listed(&bad)),
        )
    }
}

fn check_known_comments(store: &CommentStore, snapshot: &LogSnapshot) -> CheckResult {
    let unknown: BTreeSet<&str> = snapshot
        .iter()
        .filter(|a| !store.contains(&a.comment_id))
        .map(|a| a.comment_id.as_str())
        .collect();
    if unknown.is_empty() {
        pass(CHK_KNOWN_COMMENTS, "WARNING", "ok".to_string())
    } else {
        let unknown: Vec<String> = unknown.into_iter().map(str::to_string).collect();
        fail(
            CHK_KNOWN_COMMENTS,
            "WARNING",
            format!(
                "{} comment id(s) not in dataset: {}",
                unknown.len(),
                listed(&unknown)
            ),
        )
    }
}

fn listed(items: &[String]) -> String {
    let mut out = items
        .iter()
        .take(MAX_LISTED)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > MAX_LISTED {
        out.push_str(", ...");
    }
    out
}

fn pass(check_id: &str, severity: &str, message: String) -> CheckResult {
    CheckResult {
        check_id: check_id.to_string(),
        severity: severity.to_string(),
        result: "PASS".to_string(),
        message,
    }
}

fn fail(check_id: &str, severity: &str, message: String) -> CheckResult {
    CheckResult {
        check_id: check_id.to_string(),
        severity: severity.to_string(),
        result: "FAIL".to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::model::{Annotation, Intensity, Label};
    use crate::comments::model::Comment;

    fn ann(cid: &str, who: &str, label: Label, intensity: Option<Intensity>) -> Annotation {
        Annotation {
            comment_id: cid.to_string(),
            text: None,
            annotator: who.to_string(),
            label,
            intensity,
        }
    }

    #[test]
    fn clean_log_passes() {
        let store = CommentStore::from_comments(vec![Comment::from_text("x")]);
        let cid = store.comments()[0].comment_id.clone();
        let snap = LogSnapshot::from_annotations(vec![
            ann(&cid, "a@x", Label::Abusive, Some(Intensity::Low)),
            ann(&cid, "b@x", Label::NonAbusive, None),
        ]);
        let s = check_log(&store, &snap, 2);
        assert!(s.passed(), "{:?}", s.checks);
    }

    #[test]
    fn violations_are_reported_per_check() {
        let store = CommentStore::from_comments(vec![Comment::from_text("x")]);
        let cid = store.comments()[0].comment_id.clone();
        let snap = LogSnapshot::from_annotations(vec![
            ann(&cid, "a@x", Label::Abusive, None),
            ann(&cid, "A@x", Label::NonAbusive, None),
            ann(&cid, "b@x", Label::NonAbusive, None),
            ann("7", "b@x", Label::NonAbusive, None),
        ]);
        let s = check_log(&store, &snap, 2);
        assert!(!s.passed());
        assert_eq!(s.result_for_check(CHK_QUOTA).0, "FAIL");
        assert_eq!(s.result_for_check(CHK_NO_DOUBLE_LABEL).0, "FAIL");
        assert_eq!(s.result_for_check(CHK_INTENSITY).0, "FAIL");
        assert_eq!(s.result_for_check(CHK_KNOWN_COMMENTS).0, "FAIL");
    }

    #[test]
    fn unknown_comments_alone_only_warn() {
        let store = CommentStore::from_comments(vec![Comment::from_text("x")]);
        let snap =
            LogSnapshot::from_annotations(vec![ann("0", "a@x", Label::NonAbusive, None)]);
        let s = check_log(&store, &snap, 3);
        assert!(s.passed());
        assert_eq!(s.result_for_check(CHK_KNOWN_COMMENTS).0, "FAIL");
    }
}
