use crate::determinism::content_id::comment_id_from_natural_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One source comment, immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub comment_id: String,
    pub text: String,
    pub video_id: Option<String>,
    pub author: Option<String>,
    pub published: Option<String>,
    /// Remaining dataset columns, carried through untouched.
    pub attributes: BTreeMap<String, String>,
}

impl Comment {
    pub fn new(
        text: impl Into<String>,
        video_id: Option<String>,
        author: Option<String>,
        published: Option<String>,
    ) -> Self {
        let text = text.into();
        let comment_id = comment_id_from_natural_key(
            video_id.as_deref(),
            author.as_deref(),
            published.as_deref(),
            &text,
        );
        Self {
            comment_id,
            text,
            video_id,
            author,
            published,
            attributes: BTreeMap::new(),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(text, None, None, None)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
