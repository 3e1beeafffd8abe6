use super::model::{Annotation, LOG_HEADER};
use crate::error::{CoreError, CoreResult, Rejection};
use fd_lock::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const REQUIRED_COLUMNS: [&str; 3] = ["comment_id", "email", "label"];

/// Point-in-time copy of the log, in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSnapshot {
    annotations: Vec<Annotation>,
}

impl LogSnapshot {
    pub fn from_annotations(annotations: Vec<Annotation>) -> Self {
        Self { annotations }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn into_inner(self) -> Vec<Annotation> {
        self.annotations
    }
}

/// Shared, append-only CSV annotation log.
///
/// Every operation opens its own handle and takes an OS advisory lock on the
/// file: shared for reads, exclusive for appends. Writers in other threads and
/// other processes are therefore serialized against each other, and readers
/// never see a half-written row.
#[derive(Debug, Clone)]
pub struct AnnotationLog {
    path: PathBuf,
}

impl AnnotationLog {
    /// Opens the log, creating it with the canonical header if missing or empty.
    pub fn open_or_create(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;
        let mut lock = RwLock::new(file);
        {
            let mut guard = lock.write()?;
            let file: &mut File = &mut guard;
            if file.metadata()?.len() == 0 {
                file.write_all(&header_bytes()?)?;
                file.sync_data()?;
                debug!(path = %path.display(), "annotation log created");
            } else {
                let bytes = read_all(file)?;
                parse_log_bytes(&bytes)?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole log under a shared lock.
    pub fn snapshot(&self) -> CoreResult<LogSnapshot> {
        let file = File::open(&self.path)?;
        let lock = RwLock::new(file);
        let guard = lock.read()?;
        let mut bytes = Vec::new();
        (&*guard).read_to_end(&mut bytes)?;
        drop(guard);
        let parsed = parse_log_bytes(&bytes)?;
        debug!(rows = parsed.annotations.len(), "annotation log read");
        Ok(LogSnapshot::from_annotations(parsed.annotations))
    }

    /// Check-then-append as one critical section.
    ///
    /// `check` runs against the log as it is *after* the exclusive lock is
    /// taken; a rejection leaves the file untouched. On success exactly one row
    /// is written and flushed before the lock is released. Returns the log as
    /// it stands after the append.
    pub fn append_checked<F>(&self, annotation: Annotation, check: F) -> CoreResult<LogSnapshot>
    where
        F: FnOnce(&LogSnapshot) -> Result<(), Rejection>,
    {
        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        let mut lock = RwLock::new(file);
        let mut guard = lock.write()?;
        let file: &mut File = &mut guard;

        let mut bytes = read_all(file)?;
        let parsed = parse_log_bytes(&bytes)?;
        let mut current = LogSnapshot::from_annotations(parsed.annotations);

        check(&current)?;

        if parsed.valid_len < bytes.len() {
            warn!(
                path = %self.path.display(),
                dropped_bytes = bytes.len() - parsed.valid_len,
                "truncating torn final row before append"
            );
            file.set_len(parsed.valid_len as u64)?;
            bytes.truncate(parsed.valid_len);
        }

        let mut out = Vec::new();
        if is_blank(&bytes) {
            out.extend_from_slice(&header_bytes()?);
        } else if !bytes.ends_with(b"\n") {
            warn!(path = %self.path.display(), "annotation log lacked trailing newline");
            out.push(b'\n');
        }
        out.extend_from_slice(&encode_row(&annotation, &parsed.columns)?);
        file.write_all(&out)?;
        file.flush()?;
        file.sync_data()?;

        current.annotations.push(annotation);
        Ok(current)
    }
}

struct ParsedLog {
    columns: Vec<String>,
    annotations: Vec<Annotation>,
    /// Length of the prefix made of complete rows.
    valid_len: usize,
}

fn read_all(file: &mut File) -> CoreResult<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| b.is_ascii_whitespace())
}

fn parse_log_bytes(bytes: &[u8]) -> CoreResult<ParsedLog> {
    if is_blank(bytes) {
        return Ok(ParsedLog {
            columns: LOG_HEADER.iter().map(|c| c.to_string()).collect(),
            annotations: Vec::new(),
            valid_len: bytes.len(),
        });
    }
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);
    let columns: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|c| c == required) {
            return Err(CoreError::SchemaError(format!(
                "annotation log is missing the '{}' column",
                required
            )));
        }
    }
    let headers = csv::StringRecord::from(columns.clone());
    rdr.set_headers(headers.clone());

    let mut annotations = Vec::new();
    let mut valid_len = bytes.len();
    let mut record = csv::StringRecord::new();
    loop {
        let start = rdr.position().byte() as usize;
        let row = rdr.read_record(&mut record).and_then(|more| {
            if more {
                record.deserialize::<Annotation>(Some(&headers)).map(Some)
            } else {
                Ok(None)
            }
        });
        match row {
            Ok(Some(annotation)) => annotations.push(annotation),
            Ok(None) => break,
            // An unterminated last row that does not parse is a torn write.
            Err(e) if is_torn_tail(bytes, start) => {
                warn!(error = %e, offset = start, "ignoring torn final row in annotation log");
                valid_len = start;
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let inconsistent = annotations.iter().filter(|a| !a.is_consistent()).count();
    if inconsistent > 0 {
        warn!(
            rows = inconsistent,
            "annotation log holds rows with inconsistent label/intensity"
        );
    }
    Ok(ParsedLog {
        columns,
        annotations,
        valid_len,
    })
}

fn is_torn_tail(bytes: &[u8], start: usize) -> bool {
    start < bytes.len() && !bytes[start..].contains(&b'\n')
}

fn header_bytes() -> CoreResult<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    wtr.write_record(LOG_HEADER)?;
    wtr.into_inner().map_err(|e| CoreError::Io(e.into_error()))
}

/// Encodes one row following the column layout of the file being appended to,
/// so logs written with an older header stay aligned.
fn encode_row(annotation: &Annotation, columns: &[String]) -> CoreResult<Vec<u8>> {
    let fields: Vec<&str> = columns
        .iter()
        .map(|c| match c.as_str() {
            "comment_id" => annotation.comment_id.as_str(),
            "text" => annotation.text.as_deref().unwrap_or(""),
            "email" => annotation.annotator.as_str(),
            "label" => annotation.label.as_str(),
            "intensite" => annotation.intensity.map(|i| i.as_str()).unwrap_or(""),
            _ => "",
        })
        .collect();
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    wtr.write_record(&fields)?;
    wtr.into_inner().map_err(|e| CoreError::Io(e.into_error()))
}
