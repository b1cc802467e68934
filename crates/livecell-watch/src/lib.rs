//! Watches a file, parses it into cells, and wires the result into a DAG
//! evaluator: the default, fully-batteries front end for `livecell-core`.
//!
//! ```text
//! path ──► FileWatcher ──► CellParser ──► DagEvaluator ──► subscribers
//!          Overwrite<Text>  NodeList<I>    NodeList<NodeState<I,O>>
//! ```

mod error;
mod parser;
mod watcher;

pub use error::{Error, Result};
pub use parser::{subscribe_parser, CellGrammar, LineCellGrammar, ParserMsg};
pub use watcher::FileWatcher;

use std::path::Path;
use std::sync::Arc;

use livecell_core::{launch_evaluator, CellEvaluator, EvaluatorMsg, Mailbox};

/// Entry point: start watching `path`, parse it with `grammar`, and drive
/// evaluation with `eval_fn` starting from `initial_env`.
///
/// Returns the evaluator's mailbox; callers subscribe to it (via
/// [`livecell_core::Mailbox::subscribe_evaluator`]) to get the current
/// per-cell state plus a feed of future diffs. The watcher and parser run
/// as independent background actors for the lifetime of the process.
pub async fn watch_and_eval_file<Env, G, O>(
    path: impl AsRef<Path>,
    grammar: G,
    eval_fn: Arc<dyn CellEvaluator<Env, G::Cell, O>>,
    initial_env: Env,
) -> Result<Mailbox<EvaluatorMsg<Env, G::Cell, O>>>
where
    Env: Clone + Send + Sync + 'static,
    G: CellGrammar,
    O: Clone + Send + Sync + 'static,
{
    let watcher = FileWatcher::spawn(path)?;
    let (initial_text, text_rx) = watcher.subscribe().await;

    let parser_mb = parser::launch_parser(grammar, initial_text, text_rx);
    let (initial_cells, cell_rx) = parser::subscribe_parser(&parser_mb).await;

    Ok(launch_evaluator(initial_cells, cell_rx, eval_fn, initial_env))
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecell_core::AbortHandle;
    use tempfile::TempDir;

    struct EchoEvaluator;

    #[async_trait::async_trait]
    impl CellEvaluator<(), livecell_core::SourceBlock, String> for EchoEvaluator {
        async fn eval(&self, env: (), input: &livecell_core::SourceBlock, _abort: AbortHandle) -> (String, ()) {
            (input.text.clone(), env)
        }
    }

    #[tokio::test]
    async fn watch_and_eval_produces_a_running_evaluator() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("cells.txt");
        tokio::fs::write(&file, "hello\n\nworld").await.unwrap();

        let mb = watch_and_eval_file(&file, LineCellGrammar, Arc::new(EchoEvaluator), ())
            .await
            .unwrap();

        let (_, mut diff_rx) = mb
            .subscribe_evaluator::<(), livecell_core::SourceBlock, String>()
            .await
            .unwrap();

        for _ in 0..2 {
            tokio::time::timeout(std::time::Duration::from_secs(2), diff_rx.recv())
                .await
                .expect("evaluator should make progress")
                .expect("channel open");
        }
    }
}
