use crate::comments::model::Comment;
use crate::error::{CoreError, CoreResult, Rejection};
use crate::identity::AnnotatorId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log column order. Part of the external contract; do not reorder.
pub const LOG_HEADER: [&str; 5] = ["comment_id", "text", "email", "label", "intensite"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Label {
    #[serde(rename = "abusive")]
    Abusive,
    #[serde(rename = "non abusive", alias = "non-abusive", alias = "non_abusive")]
    NonAbusive,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Abusive => "abusive",
            Label::NonAbusive => "non abusive",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abusive" => Ok(Label::Abusive),
            "non abusive" | "non-abusive" | "non_abusive" => Ok(Label::NonAbusive),
            other => Err(CoreError::InvalidInput(format!("unknown label '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Intensity {
    #[serde(rename = "faible", alias = "low")]
    Low,
    #[serde(rename = "moyenne", alias = "medium")]
    Medium,
    #[serde(rename = "élevée", alias = "elevee", alias = "high")]
    High,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "faible",
            Intensity::Medium => "moyenne",
            Intensity::High => "élevée",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intensity {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "faible" | "low" => Ok(Intensity::Low),
            "moyenne" | "medium" => Ok(Intensity::Medium),
            "élevée" | "elevee" | "high" => Ok(Intensity::High),
            other => Err(CoreError::InvalidInput(format!(
                "unknown intensity '{}'",
                other
            ))),
        }
    }
}

/// Intensity is required for abusive labels and forbidden otherwise.
pub fn check_intensity(label: Label, intensity: Option<Intensity>) -> Result<(), Rejection> {
    match (label, intensity) {
        (Label::Abusive, Some(_)) | (Label::NonAbusive, None) => Ok(()),
        _ => Err(Rejection::IntensityMismatch),
    }
}

/// One row of the annotation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Annotation {
    pub comment_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "email")]
    pub annotator: String,
    pub label: Label,
    #[serde(rename = "intensite", default)]
    pub intensity: Option<Intensity>,
}

impl Annotation {
    pub fn new(
        comment: &Comment,
        annotator: &AnnotatorId,
        label: Label,
        intensity: Option<Intensity>,
    ) -> Result<Self, Rejection> {
        check_intensity(label, intensity)?;
        Ok(Self {
            comment_id: comment.comment_id.clone(),
            text: Some(comment.text.clone()),
            annotator: annotator.as_str().to_string(),
            label,
            intensity,
        })
    }

    pub fn is_consistent(&self) -> bool {
        check_intensity(self.label, self.intensity).is_ok()
    }
}
