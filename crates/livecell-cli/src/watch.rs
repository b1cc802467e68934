//! `watch` command: drive the watcher/parser/evaluator pipeline directly
//! and print each diff to stdout, without starting an HTTP server. Useful
//! for scripting and for eyeballing the incremental pipeline by hand.

use std::path::Path;
use std::sync::Arc;

use livecell_core::{MapEltUpdate, NodeEvalStatus};
use livecell_watch::LineCellGrammar;

use crate::colors;
use crate::demo::{RunningTotal, SumEvaluator};

/// Watch `path`, printing every cell-status diff as it is produced.
pub async fn execute(path: &str) -> anyhow::Result<()> {
    let path = Path::new(path);
    if !path.exists() {
        anyhow::bail!("file not found: {}", path.display());
    }

    println!("\n{}livecell watch{}", colors::BOLD, colors::RESET);
    println!("{}", "─".repeat(50));
    println!(
        "{}  ◆ Watching:{} {}",
        colors::CYAN,
        colors::RESET,
        path.display()
    );
    println!(
        "{}Press Ctrl+C to stop{}\n",
        colors::DIM,
        colors::RESET
    );

    let evaluator = livecell_watch::watch_and_eval_file(
        path,
        LineCellGrammar,
        Arc::new(SumEvaluator),
        RunningTotal(0),
    )
    .await?;

    let (snapshot, mut diff_rx) = evaluator
        .subscribe_evaluator::<RunningTotal, livecell_core::SourceBlock, livecell_core::CellOutput>()
        .await
        .expect("evaluator is running");

    println!(
        "{}initial snapshot{}: {} cell(s)",
        colors::YELLOW,
        colors::RESET,
        snapshot.len()
    );
    for (id, state) in snapshot.entries() {
        print_status(id, &state.status);
    }

    let mut ctrl_c = Box::pin(tokio::signal::ctrl_c());
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!("\n{}stopped{}", colors::GREEN, colors::RESET);
                break;
            }
            diff = diff_rx.recv() => {
                let Some(diff) = diff else { break };
                if diff.tail.num_dropped > 0 || !diff.tail.new_tail.is_empty() {
                    println!(
                        "{}diff{}: dropped {}, appended {}",
                        colors::YELLOW,
                        colors::RESET,
                        diff.tail.num_dropped,
                        diff.tail.new_tail.len()
                    );
                }
                for (id, elt) in diff.map.0 {
                    match elt {
                        MapEltUpdate::Create(state) | MapEltUpdate::Update(state) => {
                            print_status(id, &state.status);
                        }
                        MapEltUpdate::Delete => {
                            println!("  {} deleted", id);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_status(
    id: livecell_core::NodeId,
    status: &NodeEvalStatus<livecell_core::CellOutput>,
) {
    match status {
        NodeEvalStatus::Waiting => println!("  {} {}waiting{}", id, colors::DIM, colors::RESET),
        NodeEvalStatus::Running => println!("  {} {}running{}", id, colors::YELLOW, colors::RESET),
        NodeEvalStatus::Complete(output) => {
            let text = output.text.as_deref().unwrap_or("");
            println!("  {} {}complete{}: {}", id, colors::GREEN, colors::RESET, text);
        }
    }
}
