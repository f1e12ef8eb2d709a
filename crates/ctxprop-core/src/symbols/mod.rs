//! Symbol and type information for Go sources
//!
//! A small front end standing in for a full type checker: [`PackageIndex`]
//! collects package-level declarations across every file of a package, and
//! [`resolve_file`] walks one file with a lexical scope stack, recording what
//! each identifier denotes and what each resolvable call returns.
//!
//! Types are plain qualified names (`context.Context`,
//! `golang.org/x/net/context.Context`, `*svc.Server`); classification works on
//! these strings by suffix.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::parser::Span;

pub mod index;
pub mod resolver;

pub use index::{Imports, PackageIndex, TypeResolver};
pub use resolver::resolve_file;

/// Result types of a call, one entry per result; `None` when unknown
pub type Results = Vec<Option<String>>;

/// What an identifier occurrence denotes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// An imported package
    Package { path: String },
    /// A variable, parameter or named result
    Var { ty: Option<String> },
    /// A package-level function
    Func { results: Results },
}

impl Symbol {
    pub fn var(ty: impl Into<String>) -> Self {
        Symbol::Var {
            ty: Some(ty.into()),
        }
    }

    /// Declared or inferred type of a variable
    pub fn var_type(&self) -> Option<&str> {
        match self {
            Symbol::Var { ty } => ty.as_deref(),
            _ => None,
        }
    }
}

/// Resolution results for one file, keyed by node span
#[derive(Debug, Default)]
pub struct SymbolTable {
    idents: HashMap<Span, Symbol>,
    calls: HashMap<Span, Results>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbol denoted by an identifier (or package identifier) node
    pub fn symbol_at(&self, node: Node<'_>) -> Option<&Symbol> {
        self.idents.get(&Span::from(node))
    }

    /// Result types of a call expression whose target resolved
    pub fn call_results(&self, call: Node<'_>) -> Option<&[Option<String>]> {
        self.calls.get(&Span::from(call)).map(Vec::as_slice)
    }

    pub fn record_symbol(&mut self, span: Span, symbol: Symbol) {
        self.idents.insert(span, symbol);
    }

    pub fn record_call(&mut self, span: Span, results: Results) {
        self.calls.insert(span, results);
    }

    /// Number of identifier occurrences resolved
    pub fn len(&self) -> usize {
        self.idents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idents.is_empty()
    }
}
