/*!
# Tracer - Context Propagation Engine

Walks Go files declaration by declaration, tracks which values of the
propagated type are visible, and rewrites call arguments that build a fresh
value so they reuse a visible one instead.

## Architecture

- `FileTracer`: directory driver; parses, indexes, walks, writes, formats
- `PropagationVisitor`: declaration walk owning one `Scope` at a time
- `RewriteEngine`: argument classification and replacement decisions
- `DecisionProvider`: automatic or operator-driven choices
- `Patch`: span edits against the unchanged source
- `FileTransaction`: crash-safe file replacement

## Example Usage

```no_run
use ctxprop_core::{FileTracer, PropagateConfig};

let mut tracer = FileTracer::new(PropagateConfig::default())?;
let summary = tracer.transform_directory("service/handlers")?;
println!("{} arguments rewritten", summary.rewrites);
# Ok::<(), ctxprop_core::PropagateError>(())
```
*/

pub mod decision;
pub mod engine;
pub mod file_tracer;
pub mod formatter;
pub mod patch;
pub mod patterns;
pub mod scope;
mod statements;
pub mod visitor;
pub mod writer;

// Re-export main types
pub use decision::{
    AutomaticDecider, DecisionProvider, InteractiveDecider, LineReader, Replacement,
    ReplacementRequest, ScriptedReader, Selection, UnignoreRequest,
};
pub use engine::{ArgumentKind, CallSite, RewriteAction, RewriteEngine};
pub use file_tracer::{FileTracer, TracerSummary};
pub use formatter::{FormatError, Formatter};
pub use patch::{Edit, EditId, EditKind, Patch};
pub use patterns::HelperMatcher;
pub use scope::{PropagationCandidate, Scope};
pub use visitor::{FileOutcome, PropagationVisitor};
pub use writer::{replace_file, FileTransaction, WriteError};
