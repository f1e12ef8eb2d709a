/*!
# Patch - Span Edits Over Unchanged Source

The syntax tree is never mutated. Every rewrite is an [`Edit`] replacing a byte
span of the original text, and rendering a file or a statement applies the edits
that fall inside the rendered range.

Renames of discarded results are speculative: they stay revertible through the
[`EditId`] returned when they were pushed.
*/

use crate::parser::Span;

/// What an edit does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// A call argument replaced by a candidate
    Argument,
    /// A discard target given a name
    Rename,
}

/// Replacement of one source span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Span,
    pub text: String,
    pub kind: EditKind,
}

impl Edit {
    pub fn argument(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
            kind: EditKind::Argument,
        }
    }

    pub fn rename(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
            kind: EditKind::Rename,
        }
    }
}

/// Handle to a pushed edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditId(usize);

/// Ordered set of edits against one source text
#[derive(Debug, Default, Clone)]
pub struct Patch {
    edits: Vec<Option<Edit>>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edit: Edit) -> EditId {
        self.edits.push(Some(edit));
        EditId(self.edits.len() - 1)
    }

    /// Withdraw an edit; reverting twice is a no-op
    pub fn revert(&mut self, id: EditId) -> Option<Edit> {
        self.edits.get_mut(id.0).and_then(Option::take)
    }

    pub fn get(&self, id: EditId) -> Option<&Edit> {
        self.edits.get(id.0).and_then(Option::as_ref)
    }

    /// Edits still in effect, in push order
    pub fn edits(&self) -> impl Iterator<Item = &Edit> {
        self.edits.iter().flatten()
    }

    /// Whether `span` lies inside a replaced argument
    pub fn is_replaced(&self, span: Span) -> bool {
        self.edits()
            .any(|edit| edit.kind == EditKind::Argument && edit.span.contains(span))
    }

    /// Whether rendering would change the source at all
    pub fn has_rewrites(&self) -> bool {
        self.edits().next().is_some()
    }

    pub fn argument_rewrites(&self) -> usize {
        self.edits()
            .filter(|edit| edit.kind == EditKind::Argument)
            .count()
    }

    pub fn render(&self, source: &str) -> String {
        self.render_range(source, Span::new(0, source.len()))
    }

    /// Render `range` of `source` with the edits inside it applied
    ///
    /// An edit nested in an earlier applied edit is dropped with the text it
    /// would have touched.
    pub fn render_range(&self, source: &str, range: Span) -> String {
        let mut edits: Vec<&Edit> = self
            .edits()
            .filter(|edit| range.contains(edit.span))
            .collect();
        edits.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then(b.span.end.cmp(&a.span.end))
        });

        let mut out = String::with_capacity(range.len());
        let mut cursor = range.start;
        for edit in edits {
            if edit.span.start < cursor {
                continue;
            }
            out.push_str(&source[cursor..edit.span.start]);
            out.push_str(&edit.text);
            cursor = edit.span.end;
        }
        out.push_str(&source[cursor..range.end]);
        out
    }
}
