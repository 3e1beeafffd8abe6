use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Self-reported annotator identity (an email-like string, never verified).
///
/// Surrounding whitespace is dropped and ASCII letters are lowercased, so
/// `" Ana@Example.org"` and `"ana@example.org"` are the same annotator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct AnnotatorId(String);

impl AnnotatorId {
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let normalized = normalize_identity(raw);
        if normalized.is_empty() {
            return Err(CoreError::NoIdentity);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against a raw value read back from the log.
    pub fn matches_raw(&self, raw: &str) -> bool {
        normalize_identity(raw) == self.0
    }
}

impl TryFrom<String> for AnnotatorId {
    type Error = CoreError;

    fn try_from(raw: String) -> CoreResult<Self> {
        Self::parse(&raw)
    }
}

impl From<AnnotatorId> for String {
    fn from(id: AnnotatorId) -> Self {
        id.0
    }
}

impl fmt::Display for AnnotatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn normalize_identity(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identity_is_rejected() {
        assert!(matches!(AnnotatorId::parse(""), Err(CoreError::NoIdentity)));
        assert!(matches!(
            AnnotatorId::parse("   \t"),
            Err(CoreError::NoIdentity)
        ));
    }

    #[test]
    fn identity_is_trimmed_and_lowercased() {
        let a = AnnotatorId::parse("  Ana@Example.ORG ").unwrap();
        assert_eq!(a.as_str(), "ana@example.org");
        assert!(a.matches_raw("ANA@example.org"));
        assert!(!a.matches_raw("bob@example.org"));
    }

    #[test]
    fn deserializing_goes_through_parse() {
        let a: AnnotatorId = serde_json::from_str("\" Ana@Example.org\"").unwrap();
        assert_eq!(a.as_str(), "ana@example.org");
        assert!(serde_json::from_str::<AnnotatorId>("\"  \"").is_err());
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"ana@example.org\"");
    }
}
