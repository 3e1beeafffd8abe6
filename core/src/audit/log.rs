use crate::audit::event::{compute_event_hash, finalize_event, AuditEvent, ZERO_HASH_64};
use crate::error::{CoreError, CoreResult};
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Hash-chained NDJSON journal of annotation decisions.
///
/// The chain tail is re-read under the file's exclusive lock on every append,
/// so several processes writing the same journal still extend one chain.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainReport {
    pub events: usize,
    /// 1-based line of the first event whose hash or back-link is wrong.
    pub first_broken_line: Option<usize>,
}

impl ChainReport {
    pub fn is_intact(&self) -> bool {
        self.first_broken_line.is_none()
    }
}

impl AuditLog {
    pub fn open_or_create(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        OpenOptions::new().append(true).create(true).open(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, mut event: AuditEvent) -> CoreResult<AuditEvent> {
        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        let mut lock = RwLock::new(file);
        let mut guard = lock.write()?;
        let file: &mut File = &mut guard;

        event.prev_event_hash = last_event_hash(file)?;
        let event = finalize_event(event)?;
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        file.write_all(&line)?;
        file.sync_data()?;
        Ok(event)
    }

    pub fn read_events(&self) -> CoreResult<Vec<AuditEvent>> {
        let file = File::open(&self.path)?;
        let lock = RwLock::new(file);
        let guard = lock.read()?;
        let mut events = Vec::new();
        for line in BufReader::new(&*guard).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }
        Ok(events)
    }

    /// Re-hashes every event and checks each back-link.
    pub fn verify_chain(&self) -> CoreResult<ChainReport> {
        let events = self.read_events()?;
        let mut expected_prev = ZERO_HASH_64.to_string();
        for (i, e) in events.iter().enumerate() {
            if e.prev_event_hash != expected_prev || compute_event_hash(e)? != e.event_hash {
                return Ok(ChainReport {
                    events: events.len(),
                    first_broken_line: Some(i + 1),
                });
            }
            expected_prev = e.event_hash.clone();
        }
        Ok(ChainReport {
            events: events.len(),
            first_broken_line: None,
        })
    }
}

fn last_event_hash(file: &mut File) -> CoreResult<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut raw = String::new();
    file.read_to_string(&mut raw)?;
    let Some(line) = raw.lines().rev().find(|l| !l.trim().is_empty()) else {
        return Ok(ZERO_HASH_64.to_string());
    };
    let v: serde_json::Value = serde_json::from_str(line)?;
    v.get("event_hash")
        .and_then(|x| x.as_str())
        .map(str::to_string)
        .ok_or_else(|| CoreError::InvalidInput("journal line missing event_hash".to_string()))
}
