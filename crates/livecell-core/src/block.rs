//! Per-cell evaluation state and the default wire data model.
//!
//! `NodeEvalStatus`/`NodeState` are fully generic over the cell input and
//! output types. `SourceBlock`, `Lexeme` and friends are the concrete `I`/`O`
//! this workspace ships a parser and evaluator for (see `livecell-watch`);
//! they also fix the JSON wire shape a downstream consumer plugs into.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A cell's evaluation status.
///
/// Externally tagged (the default representation): `Waiting` and `Running`
/// serialize as bare strings, `Complete(o)` as `{"Complete": o}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeEvalStatus<O> {
    Waiting,
    Running,
    Complete(O),
}

/// A cell's parsed input paired with its current evaluation status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState<I, O> {
    pub input: I,
    pub status: NodeEvalStatus<O>,
}

impl<I, O> NodeState<I, O> {
    pub fn waiting(input: I) -> Self {
        NodeState {
            input,
            status: NodeEvalStatus::Waiting,
        }
    }
}

/// Whether a highlight span covers a whole syntactic group or a single
/// leaf token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Group,
    Leaf,
}

/// A half-open byte range within a block's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// One token produced by tokenizing a block's source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexeme {
    pub text: String,
    pub span: Span,
}

/// A parsed, independently-evaluable source fragment.
///
/// `eq` (implemented below) compares by `text` only: two blocks are the
/// "same cell" for prefix-diffing purposes exactly when their source text
/// matches, regardless of where the block currently sits in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceBlock {
    /// 1-based starting line in the source file.
    pub line: u32,
    /// The block's own id, redundantly included for client convenience
    /// (clients otherwise only see it as a `NodeList` key).
    pub block_id: u64,
    /// Raw source text of the block.
    pub text: String,
    pub lexemes: Vec<Lexeme>,
    /// child lexeme index -> parent lexeme index.
    pub focus: HashMap<usize, usize>,
    /// parent lexeme index -> highlight spans.
    pub highlights: HashMap<usize, Vec<(HighlightKind, Span)>>,
    /// lexeme index -> hover text.
    pub hover_info: HashMap<usize, String>,
    /// Pre-rendered HTML for this block's source (not its result).
    pub html: String,
}

impl PartialEq for SourceBlock {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}
impl Eq for SourceBlock {}

/// The result of evaluating a [`SourceBlock`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellOutput {
    pub text: Option<String>,
    pub html: Option<String>,
}

impl CellOutput {
    pub fn text(text: impl Into<String>) -> Self {
        CellOutput {
            text: Some(text.into()),
            html: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_block_equality_ignores_position() {
        let a = SourceBlock {
            line: 1,
            block_id: 0,
            text: "a".into(),
            lexemes: vec![],
            focus: HashMap::new(),
            highlights: HashMap::new(),
            hover_info: HashMap::new(),
            html: String::new(),
        };
        let mut b = a.clone();
        b.line = 5;
        b.block_id = 7;
        assert_eq!(a, b);

        let mut c = a.clone();
        c.text = "b".into();
        assert_ne!(a, c);
    }
}
