use super::model::Comment;
use crate::error::{CoreError, CoreResult};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

pub const TEXT_COLUMN: &str = "text";
pub const VIDEO_ID_COLUMN: &str = "video_id";
pub const AUTHOR_COLUMN: &str = "author";
pub const PUBLISHED_COLUMN: &str = "published";

/// The loaded comment set, in dataset order, with O(1) lookup by id.
#[derive(Debug, Clone, Default)]
pub struct CommentStore {
    comments: Vec<Comment>,
    index: HashMap<String, usize>,
}

impl CommentStore {
    pub fn load_csv(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let store = Self::from_csv_reader(file)?;
        debug!(
            path = %path.display(),
            comments = store.len(),
            "comment dataset loaded"
        );
        Ok(store)
    }

    /// Parses a CSV dataset with a header row. Only `text` is required.
    pub fn from_csv_reader<R: Read>(reader: R) -> CoreResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let text_idx = position(TEXT_COLUMN).ok_or_else(|| {
            CoreError::SchemaError(format!(
                "dataset must contain a '{}' column (found: {})",
                TEXT_COLUMN,
                headers.join(",")
            ))
        })?;
        let video_idx = position(VIDEO_ID_COLUMN);
        let author_idx = position(AUTHOR_COLUMN);
        let published_idx = position(PUBLISHED_COLUMN);
        let known = [Some(text_idx), video_idx, author_idx, published_idx];

        let mut comments = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let field = |idx: Option<usize>| {
                idx.and_then(|i| record.get(i))
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            };

            let Some(text) = field(Some(text_idx)) else {
                warn!(row = row + 1, "skipping dataset row with empty text");
                continue;
            };

            let mut attributes = BTreeMap::new();
            for (i, value) in record.iter().enumerate() {
                if known.contains(&Some(i)) {
                    continue;
                }
                if let Some(name) = headers.get(i) {
                    attributes.insert(name.clone(), value.to_string());
                }
            }

            let mut comment = Comment::new(
                text,
                field(video_idx),
                field(author_idx),
                field(published_idx),
            );
            comment.attributes = attributes;
            comments.push(comment);
        }

        Ok(Self::from_comments(comments))
    }

    /// Builds a store, collapsing records whose identifiers collide onto the
    /// first occurrence.
    pub fn from_comments(comments: Vec<Comment>) -> Self {
        let mut kept = Vec::with_capacity(comments.len());
        let mut index = HashMap::with_capacity(comments.len());
        for comment in comments {
            if index.contains_key(&comment.comment_id) {
                warn!(
                    comment_id = %comment.comment_id,
                    "duplicate dataset record collapsed onto first occurrence"
                );
                continue;
            }
            index.insert(comment.comment_id.clone(), kept.len());
            kept.push(comment);
        }
        Self {
            comments: kept,
            index,
        }
    }

    pub fn get(&self, comment_id: &str) -> Option<&Comment> {
        self.index.get(comment_id).map(|&i| &self.comments[i])
    }

    pub fn contains(&self, comment_id: &str) -> bool {
        self.index.contains_key(comment_id)
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}
