use crate::error::{CoreError, CoreResult};
use crate::identity::AnnotatorId;

pub const DEFAULT_QUOTA: usize = 3;

/// Decision constants handed to the eligibility, submission and export paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationPolicy {
    quota: usize,
    privileged: Option<AnnotatorId>,
}

impl AnnotationPolicy {
    /// `quota` must be at least 1. A blank privileged identity means nobody
    /// may export.
    pub fn new(quota: usize, privileged: Option<&str>) -> CoreResult<Self> {
        if quota == 0 {
            return Err(CoreError::InvalidInput(
                "annotation quota must be at least 1".to_string(),
            ));
        }
        let privileged = match privileged {
            Some(raw) if !raw.trim().is_empty() => Some(AnnotatorId::parse(raw)?),
            _ => None,
        };
        Ok(Self { quota, privileged })
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    pub fn privileged_identity(&self) -> Option<&AnnotatorId> {
        self.privileged.as_ref()
    }
}

impl Default for AnnotationPolicy {
    fn default() -> Self {
        Self {
            quota: DEFAULT_QUOTA,
            privileged: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quota_is_refused() {
        assert!(AnnotationPolicy::new(0, None).is_err());
    }

    #[test]
    fn blank_admin_means_none() {
        let p = AnnotationPolicy::new(3, Some("  ")).unwrap();
        assert!(p.privileged_identity().is_none());
        let p = AnnotationPolicy::new(2, Some("Admin@X.org")).unwrap();
        assert_eq!(p.quota(), 2);
        assert_eq!(p.privileged_identity().unwrap().as_str(), "admin@x.org");
    }
}
