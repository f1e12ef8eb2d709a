/*!
# Helper Patterns

Statements that create a derived context through a known helper get their
discarded context result named without asking anyone.
*/

use regex::Regex;

use crate::config::HelperPattern;
use crate::{PropagateError, Result};

/// Compiled helper patterns, tried in configuration order
#[derive(Debug, Clone, Default)]
pub struct HelperMatcher {
    helpers: Vec<(Regex, String)>,
}

impl HelperMatcher {
    pub fn new(patterns: &[HelperPattern]) -> Result<Self> {
        let mut helpers = Vec::with_capacity(patterns.len());
        for helper in patterns {
            let regex = Regex::new(&helper.pattern).map_err(|e| {
                PropagateError::Config(format!("invalid helper pattern {:?}: {}", helper.pattern, e))
            })?;
            helpers.push((regex, helper.name.clone()));
        }
        Ok(Self { helpers })
    }

    /// Name for a discarded result of `statement`, if a helper matches
    pub fn name_for(&self, statement: &str) -> Option<&str> {
        self.helpers
            .iter()
            .find(|(regex, _)| regex.is_match(statement))
            .map(|(_, name)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropagateConfig;

    #[test]
    fn test_default_helper() {
        let matcher = HelperMatcher::new(&PropagateConfig::default().helpers).unwrap();
        assert_eq!(
            matcher.name_for("span, _ := tracer.CreateSpanFromContext(ctx, \"load\")"),
            Some("childCtx")
        );
        assert_eq!(matcher.name_for("_, cancel := context.WithCancel(ctx)"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let matcher = HelperMatcher::new(&[
            HelperPattern {
                pattern: r"trace\.Start".to_string(),
                name: "spanCtx".to_string(),
            },
            HelperPattern {
                pattern: r"\.Start".to_string(),
                name: "other".to_string(),
            },
        ])
        .unwrap();
        assert_eq!(matcher.len(), 2);
        assert_eq!(matcher.name_for("_, span := trace.Start(ctx)"), Some("spanCtx"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = HelperMatcher::new(&[HelperPattern {
            pattern: "(".to_string(),
            name: "x".to_string(),
        }])
        .unwrap_err();
        assert!(matches!(err, PropagateError::Config(_)));
    }
}
