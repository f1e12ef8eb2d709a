/*!
# FileTracer - Directory Driver

Parses a directory, builds a package index per package, walks every file the
filter accepts and replaces the files that changed. The formatter runs once at
the end when anything was written.
*/

use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use super::decision::{AutomaticDecider, DecisionProvider};
use super::engine::RewriteEngine;
use super::formatter::Formatter;
use super::patterns::HelperMatcher;
use super::visitor::{FileOutcome, PropagationVisitor};
use super::writer::replace_file;
use crate::classify::TypeClassifier;
use crate::config::PropagateConfig;
use crate::notifier::{DefaultNotifier, PropagationNotifier};
use crate::parser::{parse_directory, SourceFile};
use crate::symbols::{resolve_file, PackageIndex};
use crate::{PropagateError, Result};

/// Propagation driver over one directory
pub struct FileTracer {
    config: PropagateConfig,
    classifier: TypeClassifier,
    helpers: HelperMatcher,
    formatter: Option<Formatter>,
    decider: Box<dyn DecisionProvider>,
    notifier: Box<dyn PropagationNotifier>,
}

impl FileTracer {
    /// A tracer deciding automatically and reporting to the console
    pub fn new(config: PropagateConfig) -> Result<Self> {
        let helpers = HelperMatcher::new(&config.helpers)?;
        Ok(Self {
            classifier: TypeClassifier::new(&config.propagated),
            formatter: config.formatter.as_ref().map(Formatter::from_config),
            helpers,
            config,
            decider: Box::new(AutomaticDecider),
            notifier: Box::new(DefaultNotifier::new()),
        })
    }

    pub fn with_decider(mut self, decider: Box<dyn DecisionProvider>) -> Self {
        self.decider = decider;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn PropagationNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &PropagateConfig {
        &self.config
    }

    /// Propagate through every accepted file directly inside `dir`
    ///
    /// An unreadable directory or a file that does not parse aborts the run
    /// before anything is written; so does closed operator input. Failing to
    /// write one file is recorded and the run goes on.
    pub fn transform_directory(&mut self, dir: impl AsRef<Path>) -> Result<TracerSummary> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(PropagateError::io(
                dir,
                io::Error::new(io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        let packages = parse_directory(dir, &self.config.files)?;
        let mut summary = TracerSummary::new();

        for package in &packages {
            self.notifier.on_package(&package.name);
            summary.packages += 1;
            let index = PackageIndex::build(package, &self.config.signatures);

            for file in &package.files {
                if !self.config.files.accepts(&file.path) {
                    debug!(path = %file.path.display(), "skipping test or mock file");
                    summary.files_skipped += 1;
                    continue;
                }
                summary.merge(self.process_file(file, &index)?);
            }
        }

        if summary.files_rewritten > 0 && !self.config.dry_run {
            self.run_formatter(dir, &mut summary);
        }

        info!(
            packages = summary.packages,
            files = summary.files_processed,
            rewritten = summary.files_rewritten,
            rewrites = summary.rewrites,
            errors = summary.errors.len(),
            dry_run = self.config.dry_run,
            "propagation finished"
        );
        Ok(summary)
    }

    /// Analyse one parsed file without touching the disk
    pub fn transform_source(&mut self, file: &SourceFile, index: &PackageIndex) -> Result<FileOutcome> {
        let table = resolve_file(file, index);
        let engine = RewriteEngine::new(
            &self.classifier,
            self.decider.as_mut(),
            self.notifier.as_ref(),
        );
        PropagationVisitor::new(file, &table, &self.helpers, engine).run()
    }

    fn process_file(&mut self, file: &SourceFile, index: &PackageIndex) -> Result<TracerSummary> {
        self.notifier.on_file(&file.path);
        let mut summary = TracerSummary::new();
        summary.files_processed = 1;

        let outcome = self.transform_source(file, index)?;
        summary.reverted_renames = outcome.reverted_renames;
        if !outcome.modified() {
            return Ok(summary);
        }

        let rewrites = outcome.argument_rewrites();
        if self.config.dry_run {
            info!(path = %file.path.display(), rewrites, "would rewrite");
            summary.files_rewritten = 1;
            summary.rewrites = rewrites;
            return Ok(summary);
        }

        match replace_file(&file.path, &outcome.render(&file.source)) {
            Ok(()) => {
                summary.files_rewritten = 1;
                summary.rewrites = rewrites;
            }
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "failed to write file");
                self.notifier.on_error(&e.to_string());
                // the new content is in place, only cleanup failed
                if e.is_installed() {
                    summary.files_rewritten = 1;
                    summary.rewrites = rewrites;
                }
                summary.errors.push(format!("{}: {}", file.path.display(), e));
            }
        }
        Ok(summary)
    }

    fn run_formatter(&self, dir: &Path, summary: &mut TracerSummary) {
        let Some(formatter) = &self.formatter else {
            return;
        };
        if let Err(e) = formatter.format_directory(dir) {
            warn!(error = %e, "formatter failed");
            self.notifier.on_error(&e.to_string());
            summary.formatter_error = Some(e.to_string());
        }
    }
}

/// Summary of one run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TracerSummary {
    pub packages: u64,
    pub files_processed: u64,
    pub files_skipped: u64,
    /// Files replaced on disk, or that would have been in a dry run
    pub files_rewritten: u64,
    /// Call arguments rewritten
    pub rewrites: usize,
    pub reverted_renames: usize,
    /// Per-file write failures
    pub errors: Vec<String>,
    pub formatter_error: Option<String>,
}

impl TracerSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: TracerSummary) {
        self.packages += other.packages;
        self.files_processed += other.files_processed;
        self.files_skipped += other.files_skipped;
        self.files_rewritten += other.files_rewritten;
        self.rewrites += other.rewrites;
        self.reverted_renames += other.reverted_renames;
        self.errors.extend(other.errors);
        if other.formatter_error.is_some() {
            self.formatter_error = other.formatter_error;
        }
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty() && self.formatter_error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_merge() {
        let mut total = TracerSummary::new();
        total.merge(TracerSummary {
            files_processed: 1,
            files_rewritten: 1,
            rewrites: 2,
            ..Default::default()
        });
        total.merge(TracerSummary {
            files_processed: 1,
            errors: vec!["a.go: failed".to_string()],
            ..Default::default()
        });

        assert_eq!(total.files_processed, 2);
        assert_eq!(total.files_rewritten, 1);
        assert_eq!(total.rewrites, 2);
        assert!(!total.success());
    }

    #[test]
    fn test_invalid_helper_rejected() {
        let mut config = PropagateConfig::default();
        config.helpers[0].pattern = "[".to_string();
        assert!(matches!(
            FileTracer::new(config),
            Err(PropagateError::Config(_))
        ));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracer = FileTracer::new(PropagateConfig::default()).unwrap();
        let err = tracer.transform_directory(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, PropagateError::Io { .. }));
    }
}
