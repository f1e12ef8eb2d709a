//! # ctxprop core
//!
//! Engine behind `ctxprop`, a refactoring tool that threads an already visible
//! `context.Context` through Go call sites instead of letting each call build a
//! fresh one. The crate provides:
//! - Go parsing on top of tree-sitter
//! - A package index and a scoped symbol resolver
//! - Classification of the propagated type
//! - Candidate scope tracking, statement analysis and argument rewriting
//! - Transactional file replacement and the post-format pass
//!
//! The command-line front end lives in `ctxprop-cli`; everything here can be
//! driven programmatically through [`FileTracer`].

#![warn(clippy::all)]

use std::path::PathBuf;

pub mod classify;
pub mod config;
pub mod notifier;
pub mod parser;
pub mod symbols;
pub mod tracer;

// Re-export commonly used types
pub use classify::TypeClassifier;
pub use config::{DecisionMode, FileFilter, FormatterConfig, PropagateConfig, PropagatedType};
pub use notifier::{DefaultNotifier, PropagationNotifier, SilentNotifier};
pub use parser::{GoParser, SourceFile, SourcePackage, Span};
pub use symbols::{PackageIndex, Symbol, SymbolTable};
pub use tracer::{
    AutomaticDecider, DecisionProvider, FileTracer, InteractiveDecider, LineReader,
    PropagationCandidate, RewriteAction, Scope, ScriptedReader, Selection, TracerSummary,
};

/// ctxprop version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for ctxprop components
///
/// `RUST_LOG` takes precedence; without it the core crate logs at `info`.
pub fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "ctxprop_core=info".parse() {
        filter = filter.add_directive(directive);
    }
    // A second initialisation (tests, embedding) is not an error worth reporting.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Error types for ctxprop core operations
#[derive(thiserror::Error, Debug)]
pub enum PropagateError {
    /// Filesystem error tied to a specific path
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file could not be parsed cleanly
    #[error("Parse error in {path} at {line}:{column}")]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
    },

    /// The Go grammar could not be loaded into tree-sitter
    #[error("Parser setup error: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading an operator answer failed
    #[error("Prompt error: {0}")]
    Prompt(#[source] std::io::Error),

    /// The operator's input stream ended while a prompt was pending
    #[error("Input closed while waiting for an answer to: {prompt}")]
    InputClosed { prompt: String },
}

impl PropagateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for ctxprop core operations
pub type Result<T> = std::result::Result<T, PropagateError>;
