//! Run configuration
//!
//! Every field has a default so a configuration file only needs to name what
//! it changes. Files are JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{PropagateError, Result};

/// Core ctxprop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagateConfig {
    /// The type threaded through call sites
    pub propagated: PropagatedType,
    /// Which files in the target directory are rewritten
    pub files: FileFilter,
    /// Statements whose discarded context result is named automatically
    pub helpers: Vec<HelperPattern>,
    /// Result signatures of functions outside the analysed package
    pub signatures: Vec<ExternalSignature>,
    /// Formatter run once over the directory; `None` disables it
    pub formatter: Option<FormatterConfig>,
    /// Who settles ambiguous rewrites
    pub mode: DecisionMode,
    /// Analyse and report without touching any file
    pub dry_run: bool,
}

impl Default for PropagateConfig {
    fn default() -> Self {
        Self {
            propagated: PropagatedType::default(),
            files: FileFilter::default(),
            helpers: vec![HelperPattern {
                pattern: r"tracer\.CreateSpanFromContext".to_string(),
                name: "childCtx".to_string(),
            }],
            signatures: default_signatures(),
            formatter: Some(FormatterConfig::default()),
            mode: DecisionMode::Automatic,
            dry_run: false,
        }
    }
}

impl PropagateConfig {
    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| PropagateError::io(path, e))?;
        Self::from_json(&content)
            .map_err(|e| PropagateError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a configuration from JSON text
    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

/// Signature of the propagated type, matched by qualified-name suffix
///
/// A variable is propagated when its qualified type ends with
/// `<package_suffix>.<type_name>`; a package qualifier is when its import path
/// ends with `package_suffix`. Vendored copies match too, and so do unrelated
/// packages that happen to share the suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagatedType {
    pub package_suffix: String,
    pub type_name: String,
}

impl PropagatedType {
    pub fn new(package_suffix: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            package_suffix: package_suffix.into(),
            type_name: type_name.into(),
        }
    }

    /// `context.Context` for the default signature
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package_suffix, self.type_name)
    }
}

impl Default for PropagatedType {
    fn default() -> Self {
        Self::new("context", "Context")
    }
}

/// File selection markers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFilter {
    pub extension: String,
    pub test_suffix: String,
    pub mock_prefix: String,
    pub mock_suffix: String,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            extension: "go".to_string(),
            test_suffix: "_test.go".to_string(),
            mock_prefix: "mock_".to_string(),
            mock_suffix: "mock.go".to_string(),
        }
    }
}

impl FileFilter {
    /// Whether the path is a source file at all (parsed and indexed)
    pub fn is_source(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy() == self.extension.as_str())
            .unwrap_or(false)
    }

    /// Whether a parsed source file may be rewritten
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        if name.ends_with(&self.test_suffix) {
            return false;
        }
        !(name.starts_with(&self.mock_prefix) || name.ends_with(&self.mock_suffix))
    }
}

/// A statement pattern that names a discarded context result without asking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelperPattern {
    /// Regular expression matched against the rendered statement
    pub pattern: String,
    /// Name given to the discarded result
    pub name: String,
}

/// Result types of a function the resolver cannot see
///
/// `function` is matched as a suffix of `<import path>.<Func>`. A `null` result
/// is a position of unknown type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSignature {
    pub function: String,
    pub results: Vec<Option<String>>,
}

impl ExternalSignature {
    pub fn new(function: &str, results: &[Option<&str>]) -> Self {
        Self {
            function: function.to_string(),
            results: results.iter().map(|r| r.map(str::to_string)).collect(),
        }
    }
}

/// Signatures of the standard context constructors plus the tracing helper
pub fn default_signatures() -> Vec<ExternalSignature> {
    const CTX: Option<&str> = Some("context.Context");
    vec![
        ExternalSignature::new("context.Background", &[CTX]),
        ExternalSignature::new("context.TODO", &[CTX]),
        ExternalSignature::new("context.WithValue", &[CTX]),
        ExternalSignature::new("context.WithoutCancel", &[CTX]),
        ExternalSignature::new("context.WithCancel", &[CTX, Some("context.CancelFunc")]),
        ExternalSignature::new(
            "context.WithCancelCause",
            &[CTX, Some("context.CancelCauseFunc")],
        ),
        ExternalSignature::new("context.WithDeadline", &[CTX, Some("context.CancelFunc")]),
        ExternalSignature::new("context.WithTimeout", &[CTX, Some("context.CancelFunc")]),
        ExternalSignature::new("tracer.CreateSpanFromContext", &[None, CTX]),
    ]
}

/// Formatter command; the target directory is appended as the last argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            program: "gofmt".to_string(),
            args: vec!["-s".to_string(), "-w".to_string()],
        }
    }
}

/// How ambiguous rewrites are settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionMode {
    /// Always the most recently registered candidate
    #[default]
    Automatic,
    /// Ask an operator
    Interactive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_signature() {
        let config = PropagateConfig::default();
        assert_eq!(config.propagated.qualified_name(), "context.Context");
        assert_eq!(config.mode, DecisionMode::Automatic);
        assert!(!config.dry_run);
        assert_eq!(config.formatter.unwrap().program, "gofmt");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PropagateConfig::from_json(
            r#"{ "mode": "interactive", "formatter": null, "propagated": { "package_suffix": "x/net/context" } }"#,
        )
        .unwrap();
        assert_eq!(config.mode, DecisionMode::Interactive);
        assert!(config.formatter.is_none());
        assert_eq!(config.propagated.qualified_name(), "x/net/context.Context");
        assert_eq!(config.files, FileFilter::default());
        assert_eq!(config.signatures, default_signatures());
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(PropagateConfig::from_json(r#"{ "mode": "sometimes" }"#).is_err());
    }

    #[test]
    fn test_file_filter() {
        let filter = FileFilter::default();
        assert!(filter.accepts(Path::new("pkg/handler.go")));
        assert!(!filter.accepts(Path::new("pkg/handler_test.go")));
        assert!(!filter.accepts(Path::new("pkg/mock_store.go")));
        assert!(!filter.accepts(Path::new("pkg/storemock.go")));

        assert!(filter.is_source(Path::new("pkg/handler.go")));
        assert!(!filter.is_source(Path::new("pkg/README.md")));
    }
}
