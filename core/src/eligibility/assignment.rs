use crate::comments::model::Comment;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategy {
    /// First eligible comment in dataset order, recomputed on every request.
    #[default]
    StatelessFirst,
    /// Per-session position into the eligible list.
    Cursor,
}

impl FromStr for AssignmentStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "stateless_first" | "first" => Ok(AssignmentStrategy::StatelessFirst),
            "cursor" => Ok(AssignmentStrategy::Cursor),
            other => Err(CoreError::InvalidInput(format!(
                "unknown assignment strategy '{}'",
                other
            ))),
        }
    }
}

/// Session-scoped assignment state. Owned by the caller and threaded through
/// every `next` call; nothing is kept process-wide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCursor {
    pub position: usize,
}

impl SessionCursor {
    pub fn start() -> Self {
        Self::default()
    }
}

/// Picks the comment to present and returns the cursor to keep for next time.
///
/// `None` means the annotator has nothing left; it is not an error. A cursor
/// past the end of a shrunken list wraps to 0 before it is read.
pub fn next<'a>(
    eligible: &[&'a Comment],
    strategy: AssignmentStrategy,
    cursor: SessionCursor,
) -> (Option<&'a Comment>, SessionCursor) {
    if eligible.is_empty() {
        return (None, SessionCursor::start());
    }
    match strategy {
        AssignmentStrategy::StatelessFirst => (Some(eligible[0]), SessionCursor::start()),
        AssignmentStrategy::Cursor => {
            let position = if cursor.position >= eligible.len() {
                debug!(
                    position = cursor.position,
                    eligible = eligible.len(),
                    "cursor out of range, wrapping to start"
                );
                0
            } else {
                cursor.position
            };
            (Some(eligible[position]), SessionCursor { position })
        }
    }
}

/// Cursor to use after an accepted submission or a skip.
pub fn advance(strategy: AssignmentStrategy, cursor: SessionCursor) -> SessionCursor {
    match strategy {
        AssignmentStrategy::StatelessFirst => SessionCursor::start(),
        AssignmentStrategy::Cursor => SessionCursor {
            position: cursor.position.saturating_add(1),
        },
    }
}
