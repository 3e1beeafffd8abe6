use annot_core::annotation::log::AnnotationLog;
use annot_core::error::CoreError;
use annot_core::export::export;
use annot_core::identity::AnnotatorId;
use annot_core::policy::export_gate::{evaluate_export_gate, ExportBlockReason};
use annot_core::policy::types::AnnotationPolicy;

fn who(s: &str) -> AnnotatorId {
    AnnotatorId::parse(s).unwrap()
}

#[test]
fn mismatched_identity_is_blocked() {
    let policy = AnnotationPolicy::new(3, Some("admin@lab.org")).unwrap();
    let r = evaluate_export_gate(&policy, &who("annotator@lab.org"));
    assert_eq!(r.err(), Some(ExportBlockReason::IDENTITY_MISMATCH));
}

#[test]
fn missing_admin_configuration_blocks_every_requester() {
    let policy = AnnotationPolicy::new(3, Some("   ")).unwrap();
    let r = evaluate_export_gate(&policy, &who("admin@lab.org"));
    assert_eq!(r.err(), Some(ExportBlockReason::NO_PRIVILEGED_IDENTITY));
}

#[test]
fn admin_passes_regardless_of_case_and_padding() {
    let policy = AnnotationPolicy::new(3, Some("Admin@Lab.org")).unwrap();
    assert!(evaluate_export_gate(&policy, &who("  admin@lab.ORG ")).is_ok());
}

#[test]
fn forbidden_export_returns_no_rows() {
    let dir = tempfile::tempdir().unwrap();
    let log = AnnotationLog::open_or_create(dir.path().join("annotations.csv")).unwrap();
    let policy = AnnotationPolicy::new(3, Some("admin@lab.org")).unwrap();

    assert!(matches!(
        export(&log, &policy, &who("u1@lab.org")),
        Err(CoreError::Forbidden)
    ));
    assert!(export(&log, &policy, &who("admin@lab.org"))
        .unwrap()
        .is_empty());
}
