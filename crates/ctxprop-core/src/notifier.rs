//! Progress and audit notifications
//!
//! Provides a trait-based system for reporting what a run is doing, allowing
//! different output backends (console, test recorder, nothing) to be plugged in.

use std::path::Path;

use crate::tracer::PropagationCandidate;

/// Trait for handling run notifications
pub trait PropagationNotifier {
    /// A package is about to be processed
    fn on_package(&self, name: &str);

    /// A file is about to be processed
    fn on_file(&self, path: &Path);

    /// A declaration scope was entered
    fn on_declaration(&self, name: &str, signature: &str);

    /// A rewritable argument was found; lists the candidates visible there
    fn on_candidates(&self, statement: &str, candidates: &[PropagationCandidate]);

    /// Regular output
    fn on_output(&self, content: &str);

    /// Non-fatal error output
    fn on_error(&self, content: &str);
}

/// Default console-based notifier
pub struct DefaultNotifier;

impl DefaultNotifier {
    /// Create a new default notifier
    pub fn new() -> Self {
        Self
    }
}

impl PropagationNotifier for DefaultNotifier {
    fn on_package(&self, name: &str) {
        println!("Processing Package {}", name);
    }

    fn on_file(&self, path: &Path) {
        println!("Processing File: {}\n", path.display());
    }

    fn on_declaration(&self, name: &str, signature: &str) {
        println!("\nEntering: {} {}", name, signature);
    }

    fn on_candidates(&self, statement: &str, candidates: &[PropagationCandidate]) {
        println!("At: {:?}.", statement);
        println!(" Earlier context values are:");
        for (idx, candidate) in candidates.iter().enumerate() {
            println!("  {}: {} => {}", idx, candidate.name, candidate.provenance);
        }
        println!();
    }

    fn on_output(&self, content: &str) {
        if !content.is_empty() {
            println!("{}", content);
        }
    }

    fn on_error(&self, content: &str) {
        eprintln!("{}", content);
    }
}

impl Default for DefaultNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifier that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl PropagationNotifier for SilentNotifier {
    fn on_package(&self, _name: &str) {}
    fn on_file(&self, _path: &Path) {}
    fn on_declaration(&self, _name: &str, _signature: &str) {}
    fn on_candidates(&self, _statement: &str, _candidates: &[PropagationCandidate]) {}
    fn on_output(&self, _content: &str) {}
    fn on_error(&self, _content: &str) {}
}
