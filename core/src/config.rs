use crate::eligibility::assignment::AssignmentStrategy;
use crate::error::{CoreError, CoreResult};
use crate::policy::types::{AnnotationPolicy, DEFAULT_QUOTA};
use std::path::PathBuf;

pub const ENV_DATA_FILE: &str = "ANNOT_DATA_FILE";
pub const ENV_LOG_FILE: &str = "ANNOT_LOG_FILE";
pub const ENV_JOURNAL_FILE: &str = "ANNOT_JOURNAL_FILE";
pub const ENV_QUOTA: &str = "ANNOT_QUOTA";
pub const ENV_ADMIN_EMAIL: &str = "ANNOT_ADMIN_EMAIL";
pub const ENV_STRATEGY: &str = "ANNOT_STRATEGY";

/// Runtime configuration for one annotation deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationConfig {
    /// Source comment dataset (CSV with a `text` column).
    pub data_file: PathBuf,
    /// Shared annotation log.
    pub log_file: PathBuf,
    /// Optional hash-chained decision journal.
    pub journal_file: Option<PathBuf>,
    /// Maximum independent annotations per comment.
    pub quota: usize,
    /// Identity allowed to export the full log.
    pub admin_email: Option<String>,
    pub strategy: AssignmentStrategy,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data.csv"),
            log_file: PathBuf::from("annotations.csv"),
            journal_file: None,
            quota: DEFAULT_QUOTA,
            admin_email: None,
            strategy: AssignmentStrategy::StatelessFirst,
        }
    }
}

impl AnnotationConfig {
    /// Defaults overridden by `ANNOT_*` environment variables.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let quota = match get(ENV_QUOTA) {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                CoreError::InvalidInput(format!(
                    "{} must be a positive integer, got '{}'",
                    ENV_QUOTA, raw
                ))
            })?,
            None => default.quota,
        };
        let strategy = match get(ENV_STRATEGY) {
            Some(raw) => raw.parse()?,
            None => default.strategy,
        };

        let cfg = Self {
            data_file: get(ENV_DATA_FILE).map(PathBuf::from).unwrap_or(default.data_file),
            log_file: get(ENV_LOG_FILE).map(PathBuf::from).unwrap_or(default.log_file),
            journal_file: get(ENV_JOURNAL_FILE).map(PathBuf::from),
            quota,
            admin_email: get(ENV_ADMIN_EMAIL),
            strategy,
        };
        cfg.policy()?;
        Ok(cfg)
    }

    pub fn policy(&self) -> CoreResult<AnnotationPolicy> {
        AnnotationPolicy::new(self.quota, self.admin_email.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_without_env() {
        let cfg = AnnotationConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, AnnotationConfig::default());
        assert_eq!(cfg.quota, 3);
    }

    #[test]
    fn env_overrides_are_read() {
        let cfg = AnnotationConfig::from_lookup(lookup(&[
            (ENV_QUOTA, "5"),
            (ENV_ADMIN_EMAIL, "Admin@X.org"),
            (ENV_STRATEGY, "cursor"),
            (ENV_LOG_FILE, "/tmp/ann.csv"),
        ]))
        .unwrap();
        assert_eq!(cfg.quota, 5);
        assert_eq!(cfg.strategy, AssignmentStrategy::Cursor);
        assert_eq!(cfg.log_file, PathBuf::from("/tmp/ann.csv"));
        let policy = cfg.policy().unwrap();
        assert_eq!(policy.privileged_identity().unwrap().as_str(), "admin@x.org");
    }

    #[test]
    fn invalid_quota_is_refused() {
        assert!(AnnotationConfig::from_lookup(lookup(&[(ENV_QUOTA, "three")])).is_err());
        assert!(AnnotationConfig::from_lookup(lookup(&[(ENV_QUOTA, "0")])).is_err());
    }
}
