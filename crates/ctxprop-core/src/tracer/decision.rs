/*!
# Decision Providers

Who settles a rewrite when the answer is not forced: which candidate replaces
an argument, and what a discarded context result should be called.

[`AutomaticDecider`] is deterministic and never blocks. [`InteractiveDecider`]
asks an operator through a [`LineReader`], accepting only answers from a closed
set and asking again otherwise.
*/

use std::collections::VecDeque;
use std::io;

use super::scope::PropagationCandidate;
use crate::{PropagateError, Result};

/// How a replacement was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Automatic,
    Operator,
}

/// An argument that may be replaced by one of the visible candidates
#[derive(Debug)]
pub struct ReplacementRequest<'r> {
    /// Rendered statement containing the argument
    pub statement: &'r str,
    /// Source text of the argument
    pub argument: &'r str,
    pub candidates: &'r [PropagationCandidate],
}

/// Answer to a [`ReplacementRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    /// Replace with the candidate at this index
    Candidate(usize),
    /// Leave the argument alone
    Keep,
}

/// A propagated result assigned to the discard target
#[derive(Debug)]
pub struct UnignoreRequest<'r> {
    pub statement: &'r str,
    /// Result position of the discarded value
    pub position: usize,
}

/// Settles rewrites that need a choice
pub trait DecisionProvider {
    fn selection(&self) -> Selection;

    fn choose_replacement(&mut self, request: &ReplacementRequest<'_>) -> Result<Replacement>;

    /// Name for a discarded result, or `None` to leave it discarded
    fn name_discarded(&mut self, request: &UnignoreRequest<'_>) -> Result<Option<String>>;
}

/// Always the most recent candidate; discards stay discarded
#[derive(Debug, Default, Clone, Copy)]
pub struct AutomaticDecider;

impl DecisionProvider for AutomaticDecider {
    fn selection(&self) -> Selection {
        Selection::Automatic
    }

    fn choose_replacement(&mut self, request: &ReplacementRequest<'_>) -> Result<Replacement> {
        Ok(match request.candidates.len() {
            0 => Replacement::Keep,
            len => Replacement::Candidate(len - 1),
        })
    }

    fn name_discarded(&mut self, _request: &UnignoreRequest<'_>) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Source of operator answers
pub trait LineReader {
    /// Read one answer; `Ok(None)` when the input is exhausted
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Show a message that needs no answer
    fn show(&mut self, message: &str);
}

const ANSWER_PROMPT: &str = "  => ";

/// Asks an operator for every choice
pub struct InteractiveDecider<R> {
    reader: R,
}

impl<R: LineReader> InteractiveDecider<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_reader(self) -> R {
        self.reader
    }

    /// Ask `question` until `accept` takes the trimmed answer
    fn ask<T>(&mut self, question: &str, accept: impl Fn(&str) -> Option<T>) -> Result<T> {
        self.reader.show(question);
        loop {
            let line = self
                .reader
                .read_line(ANSWER_PROMPT)
                .map_err(PropagateError::Prompt)?
                .ok_or_else(|| PropagateError::InputClosed {
                    prompt: question.trim().to_string(),
                })?;
            let answer = line.trim();
            if let Some(value) = accept(answer) {
                return Ok(value);
            }
            self.reader
                .show(&format!("Invalid input {}, try again", answer));
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.ask(question, |answer| match answer {
            "y" => Some(true),
            "n" => Some(false),
            _ => None,
        })
    }
}

impl<R: LineReader> DecisionProvider for InteractiveDecider<R> {
    fn selection(&self) -> Selection {
        Selection::Operator
    }

    fn choose_replacement(&mut self, request: &ReplacementRequest<'_>) -> Result<Replacement> {
        let question = format!(" Replace this context arg? {} (y/n)", request.statement);
        if !self.confirm(&question)? {
            return Ok(Replacement::Keep);
        }

        let count = request.candidates.len();
        let idx = self.ask(" Which context to replace with?", |answer| {
            // Only the canonical spelling of an index is valid.
            answer
                .parse::<usize>()
                .ok()
                .filter(|idx| *idx < count && idx.to_string() == answer)
        })?;
        Ok(Replacement::Candidate(idx))
    }

    fn name_discarded(&mut self, request: &UnignoreRequest<'_>) -> Result<Option<String>> {
        let question = format!(
            "  Unignore returned context value at position '{}' ? {} (y/n)",
            request.position, request.statement
        );
        if !self.confirm(&question)? {
            return Ok(None);
        }

        let name = self.ask("  what do you want to name it?", |answer| {
            is_identifier(answer).then(|| answer.to_string())
        })?;
        Ok(Some(name))
    }
}

/// Whether `name` can be bound: a Go identifier that is neither `_` nor a keyword
pub fn is_identifier(name: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "break", "case", "chan", "const", "continue", "default", "defer", "else",
        "fallthrough", "for", "func", "go", "goto", "if", "import", "interface", "map",
        "package", "range", "return", "select", "struct", "switch", "type", "var",
    ];

    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
        && name != "_"
        && !KEYWORDS.contains(&name)
}

/// Line reader answering from a fixed script; records everything shown
#[derive(Debug, Default)]
pub struct ScriptedReader {
    answers: VecDeque<String>,
    pub prompts: Vec<String>,
    pub shown: Vec<String>,
}

impl ScriptedReader {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl LineReader for ScriptedReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }

    fn show(&mut self, message: &str) {
        self.shown.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Span;

    fn candidates() -> Vec<PropagationCandidate> {
        vec![
            PropagationCandidate::parameter("ctx", Span::new(0, 3), "f"),
            PropagationCandidate::binding("child", Span::new(10, 15), "child := g(ctx)"),
        ]
    }

    fn request(candidates: &[PropagationCandidate]) -> ReplacementRequest<'_> {
        ReplacementRequest {
            statement: "err := h(context.Background())",
            argument: "context.Background()",
            candidates,
        }
    }

    #[test]
    fn test_automatic_picks_last() {
        let candidates = candidates();
        let mut decider = AutomaticDecider;
        assert_eq!(
            decider.choose_replacement(&request(&candidates)).unwrap(),
            Replacement::Candidate(1)
        );
        assert_eq!(decider.choose_replacement(&request(&[])).unwrap(), Replacement::Keep);
        let unignore = UnignoreRequest {
            statement: "_, cancel := context.WithCancel(ctx)",
            position: 0,
        };
        assert_eq!(decider.name_discarded(&unignore).unwrap(), None);
    }

    #[test]
    fn test_interactive_reprompts_until_valid() {
        let candidates = candidates();
        let reader = ScriptedReader::new(["maybe", "y", "2", "01", "0"]);
        let mut decider = InteractiveDecider::new(reader);

        let answer = decider.choose_replacement(&request(&candidates)).unwrap();
        assert_eq!(answer, Replacement::Candidate(0));

        let reader = decider.into_reader();
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.prompts.len(), 5);
        let invalid: Vec<&String> = reader
            .shown
            .iter()
            .filter(|m| m.starts_with("Invalid input"))
            .collect();
        assert_eq!(invalid.len(), 3);
        assert_eq!(invalid[0], "Invalid input maybe, try again");
    }

    #[test]
    fn test_interactive_decline() {
        let candidates = candidates();
        let mut decider = InteractiveDecider::new(ScriptedReader::new(["n"]));
        assert_eq!(
            decider.choose_replacement(&request(&candidates)).unwrap(),
            Replacement::Keep
        );
    }

    #[test]
    fn test_unignore_validates_name() {
        let mut decider = InteractiveDecider::new(ScriptedReader::new(["y", "_", "2ctx", "func", "spanCtx"]));
        let unignore = UnignoreRequest {
            statement: "span, _ := trace.Start(ctx)",
            position: 1,
        };
        assert_eq!(
            decider.name_discarded(&unignore).unwrap(),
            Some("spanCtx".to_string())
        );
    }

    #[test]
    fn test_closed_input_aborts() {
        let candidates = candidates();
        let mut decider = InteractiveDecider::new(ScriptedReader::new(["y"]));
        let err = decider.choose_replacement(&request(&candidates)).unwrap_err();
        match err {
            PropagateError::InputClosed { prompt } => {
                assert_eq!(prompt, "Which context to replace with?")
            }
            other => panic!("Expected closed input, got {other:?}"),
        }
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("childCtx"));
        assert!(is_identifier("_ctx2"));
        assert!(!is_identifier("_"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("go"));
        assert!(!is_identifier("child-ctx"));
    }
}
