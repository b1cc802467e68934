//! The concrete evaluator this CLI plugs into the engine.
//!
//! The parser and evaluator are external collaborators — the engine itself
//! doesn't know or care what a cell means. This binary needs *something* to
//! run, so it ships a tiny demo language alongside
//! `livecell_watch::LineCellGrammar`: each blank-line-delimited block is
//! summed as whitespace-separated integers, and the running total carries
//! forward as the environment handed to the next cell. Non-numeric tokens
//! are ignored rather than treated as a parse error: a language-level
//! failure is the evaluator's own business, encoded in its `Result`, never
//! surfaced by the core as a special case.

use async_trait::async_trait;
use livecell_core::{AbortHandle, CellEvaluator, CellOutput, SourceBlock};

/// `Env` is the running sum of every integer seen in every cell evaluated
/// so far; each cell's `Result` reports its own sum plus the total.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunningTotal(pub i64);

pub struct SumEvaluator;

#[async_trait]
impl CellEvaluator<RunningTotal, SourceBlock, CellOutput> for SumEvaluator {
    async fn eval(
        &self,
        env: RunningTotal,
        input: &SourceBlock,
        _abort: AbortHandle,
    ) -> (CellOutput, RunningTotal) {
        let cell_sum: i64 = input
            .lexemes
            .iter()
            .filter_map(|lex| lex.text.parse::<i64>().ok())
            .sum();
        let total = env.0 + cell_sum;
        let text = format!("cell sum = {cell_sum}, running total = {total}");
        (CellOutput::text(text), RunningTotal(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecell_core::{Lexeme, Span};
    use std::collections::HashMap;

    fn block(text: &str) -> SourceBlock {
        let lexemes = text
            .split_whitespace()
            .map(|t| Lexeme {
                text: t.to_string(),
                span: Span { start: 0, end: 0 },
            })
            .collect();
        SourceBlock {
            line: 1,
            block_id: 0,
            text: text.to_string(),
            lexemes,
            focus: HashMap::new(),
            highlights: HashMap::new(),
            hover_info: HashMap::new(),
            html: String::new(),
        }
    }

    #[tokio::test]
    async fn sums_cells_and_threads_the_running_total() {
        let evaluator = SumEvaluator;
        let abort = AbortHandle::new();

        let (first, env1) = evaluator.eval(RunningTotal(0), &block("1 2 3"), abort.clone()).await;
        assert_eq!(env1, RunningTotal(6));
        assert_eq!(first.text.unwrap(), "cell sum = 6, running total = 6");

        let (second, env2) = evaluator.eval(env1, &block("4 not-a-number 5"), abort).await;
        assert_eq!(env2, RunningTotal(15));
        assert_eq!(second.text.unwrap(), "cell sum = 9, running total = 15");
    }
}
