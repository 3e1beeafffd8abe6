use crate::annotation::log::LogSnapshot;
use crate::annotation::model::LOG_HEADER;
use crate::error::CoreResult;

/// Renders a snapshot in the persisted log format (canonical header, LF line
/// endings, append order).
pub fn render_annotations_csv(snapshot: &LogSnapshot) -> CoreResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    wtr.write_record(LOG_HEADER)?;
    for a in snapshot.iter() {
        wtr.write_record([
            a.comment_id.as_str(),
            a.text.as_deref().unwrap_or(""),
            a.annotator.as_str(),
            a.label.as_str(),
            a.intensity.map(|i| i.as_str()).unwrap_or(""),
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::model::{Annotation, Intensity, Label};

    #[test]
    fn renders_header_then_rows_in_log_order() {
        let snap = LogSnapshot::from_annotations(vec![
            Annotation {
                comment_id: "c_2".to_string(),
                text: Some("quoted, text".to_string()),
                annotator: "b@x".to_string(),
                label: Label::Abusive,
                intensity: Some(Intensity::High),
            },
            Annotation {
                comment_id: "c_1".to_string(),
                text: None,
                annotator: "a@x".to_string(),
                label: Label::NonAbusive,
                intensity: None,
            },
        ]);
        let csv = render_annotations_csv(&snap).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "comment_id,text,email,label,intensite");
        assert_eq!(lines[1], "c_2,\"quoted, text\",b@x,abusive,élevée");
        assert_eq!(lines[2], "c_1,,a@x,non abusive,");
    }

    #[test]
    fn empty_snapshot_is_header_only() {
        let csv = render_annotations_csv(&LogSnapshot::default()).unwrap();
        assert_eq!(csv, "comment_id,text,email,label,intensite\n");
    }
}
