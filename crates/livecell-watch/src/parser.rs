//! Turns watched file text into a [`NodeList<SourceBlock>`], preserving
//! node identity for any prefix of cells whose text hasn't changed.
//!
//! A stateful parser object re-derives cell boundaries from source text on
//! every edit, keyed against a pluggable, pure, total text grammar rather
//! than a fixed language extractor: this crate ships exactly one grammar,
//! [`LineCellGrammar`], splitting on blank lines.

use livecell_core::{
    common_prefix_length, launch_actor, Mailbox, MapEltUpdate, MapUpdate, NodeList, NodeListUpdate,
    Overwrite, TailUpdate,
};
use livecell_core::{FreshNames, Lexeme, SourceBlock, Span};
use rustc_hash::FxHashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// A pluggable source grammar: pure, total, and equality-comparable on its
/// output so the parser can diff one parse against the next.
pub trait CellGrammar: Send + 'static {
    type Cell: Clone + Eq + Send + Sync + 'static;

    fn parse(&self, text: &str) -> Vec<Self::Cell>;

    /// Stamp a freshly-allocated cell with the [`livecell_core::NodeId`] it
    /// was just given. Default no-op; grammars whose cell type redundantly
    /// carries its own id (e.g. `SourceBlock::block_id`) override this so
    /// the two never drift apart.
    fn assign_id(&self, _cell: &mut Self::Cell, _id: livecell_core::NodeId) {}
}

/// Splits source text into blank-line-delimited paragraphs. Each paragraph
/// becomes one [`SourceBlock`]; tokens are whitespace-separated words with
/// no further structural analysis.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineCellGrammar;

impl CellGrammar for LineCellGrammar {
    type Cell = SourceBlock;

    fn parse(&self, text: &str) -> Vec<SourceBlock> {
        let mut blocks = Vec::new();
        let mut cur_lines: Vec<&str> = Vec::new();
        let mut cur_start_line = 1u32;
        let mut line_no = 1u32;

        for line in text.lines() {
            if line.trim().is_empty() {
                flush_block(&mut cur_lines, cur_start_line, &mut blocks);
                cur_start_line = line_no + 1;
            } else {
                if cur_lines.is_empty() {
                    cur_start_line = line_no;
                }
                cur_lines.push(line);
            }
            line_no += 1;
        }
        flush_block(&mut cur_lines, cur_start_line, &mut blocks);
        blocks
    }

    fn assign_id(&self, cell: &mut SourceBlock, id: livecell_core::NodeId) {
        cell.block_id = id.as_raw();
    }
}

fn flush_block(lines: &mut Vec<&str>, start: u32, out: &mut Vec<SourceBlock>) {
    if lines.is_empty() {
        return;
    }
    let block_text = lines.join("\n");
    out.push(make_block(start, &block_text));
    lines.clear();
}

fn make_block(line: u32, text: &str) -> SourceBlock {
    let mut lexemes = Vec::new();
    let mut start = 0usize;
    for word in text.split_whitespace() {
        if let Some(offset) = text[start..].find(word) {
            let begin = start + offset;
            let end = begin + word.len();
            lexemes.push(Lexeme {
                text: word.to_string(),
                span: Span { start: begin, end },
            });
            start = end;
        }
    }
    SourceBlock {
        line,
        // Patched to its real NodeId by `assign_id` once the parser has
        // allocated one for this cell.
        block_id: 0,
        text: text.to_string(),
        lexemes,
        focus: Default::default(),
        highlights: Default::default(),
        hover_info: Default::default(),
        html: html_escape(text),
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub enum ParserMsg<C> {
    SourceChanged(Overwrite<String>),
    Subscribe(oneshot::Sender<(NodeList<C>, mpsc::UnboundedReceiver<NodeListUpdate<C>>)>),
}

/// Ask a running parser for its current cell list and a feed of future
/// diffs.
pub async fn subscribe_parser<C: Send + 'static>(
    mailbox: &Mailbox<ParserMsg<C>>,
) -> (NodeList<C>, mpsc::UnboundedReceiver<NodeListUpdate<C>>) {
    let (tx, rx) = oneshot::channel();
    mailbox.send(ParserMsg::Subscribe(tx));
    rx.await.expect("parser actor is still running")
}

/// Spawn the cell parser actor: subscribes to a watcher's text feed and
/// republishes a [`NodeList`] of parsed cells, preserving NodeIds across
/// edits via longest-common-prefix diffing.
pub fn launch_parser<G: CellGrammar>(
    grammar: G,
    initial_text: Overwrite<String>,
    mut text_rx: mpsc::UnboundedReceiver<Overwrite<String>>,
) -> Mailbox<ParserMsg<G::Cell>> {
    launch_actor(move |mut rx, self_mb| async move {
        let names = FreshNames::new();
        let mut old_vals: Vec<G::Cell> = Vec::new();
        let mut server: livecell_core::IncrementalServer<NodeList<G::Cell>, NodeListUpdate<G::Cell>> =
            livecell_core::IncrementalServer::new(NodeList::new());
        let mut cells: NodeList<G::Cell> = NodeList::new();

        if let Overwrite::OverwriteWith(text) = &initial_text {
            apply_text(&grammar, text, &names, &mut old_vals, &mut cells, &mut server);
        }

        let forward = self_mb.lift(ParserMsg::SourceChanged);
        tokio::spawn(async move {
            while let Some(update) = text_rx.recv().await {
                forward.send(update);
            }
        });

        while let Some(msg) = rx.recv().await {
            match msg {
                ParserMsg::SourceChanged(Overwrite::OverwriteWith(text)) => {
                    apply_text(&grammar, &text, &names, &mut old_vals, &mut cells, &mut server);
                }
                ParserMsg::SourceChanged(Overwrite::NoChange) => {}
                ParserMsg::Subscribe(reply) => {
                    let (snapshot, rx) = server.subscribe_channel();
                    let _ = reply.send((snapshot, rx));
                }
            }
        }
    })
}

fn apply_text<C: Clone + Eq + Send + Sync + 'static>(
    grammar: &impl CellGrammar<Cell = C>,
    text: &str,
    names: &FreshNames,
    old_vals: &mut Vec<C>,
    cells: &mut NodeList<C>,
    server: &mut livecell_core::IncrementalServer<NodeList<C>, NodeListUpdate<C>>,
) {
    let mut new_cells = grammar.parse(text);
    let prefix = common_prefix_length(old_vals, &new_cells);

    let old_ordered = cells.ordered_ids().to_vec();
    let n_dropped = old_ordered.len() - prefix;
    let fresh_count = new_cells.len() - prefix;
    let fresh_ids = names.fresh_many(fresh_count);

    for (cell, id) in new_cells[prefix..].iter_mut().zip(fresh_ids.iter()) {
        grammar.assign_id(cell, *id);
    }

    let mut map = FxHashMap::default();
    for id in &old_ordered[prefix..] {
        map.insert(*id, MapEltUpdate::Delete);
    }
    for (id, cell) in fresh_ids.iter().zip(new_cells[prefix..].iter()) {
        map.insert(*id, MapEltUpdate::Create(cell.clone()));
    }

    let update = NodeListUpdate::new(TailUpdate::new(n_dropped, fresh_ids), MapUpdate(map));
    debug!(dropped = n_dropped, preserved = prefix, "reparsed source");

    cells.apply_update(&update);
    server.update(update);
    server.flush_diffs(|s, u| s.apply_update(u));

    *old_vals = new_cells;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_grammar_splits_on_blank_lines() {
        let grammar = LineCellGrammar;
        let blocks = grammar.parse("one\ntwo\n\nthree\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "one\ntwo");
        assert_eq!(blocks[0].line, 1);
        assert_eq!(blocks[1].text, "three");
        assert_eq!(blocks[1].line, 4);
    }

    #[test]
    fn line_grammar_equality_ignores_line_number() {
        let grammar = LineCellGrammar;
        let a = &grammar.parse("hello")[0];
        let b = &grammar.parse("\n\nhello")[0];
        assert_eq!(a, b);
        assert_ne!(a.line, b.line);
    }

    #[tokio::test]
    async fn unchanged_prefix_preserves_node_ids() {
        let (text_tx, text_rx) = mpsc::unbounded_channel();
        let mb = launch_parser(
            LineCellGrammar,
            Overwrite::OverwriteWith("a\n\nb\n\nc".to_string()),
            text_rx,
        );

        let (snapshot, mut diff_rx) = {
            let (tx, rx) = oneshot::channel();
            mb.send(ParserMsg::Subscribe(tx));
            rx.await.unwrap()
        };
        assert_eq!(snapshot.len(), 3);
        let first_id = snapshot.ordered_ids()[0];

        text_tx
            .send(Overwrite::OverwriteWith("a\n\nb2\n\nc".to_string()))
            .unwrap();

        let update = diff_rx.recv().await.unwrap();
        // "a" survives (prefix length 1); "b" and "c" are dropped and
        // replaced with fresh ids for "b2" and "c".
        assert_eq!(update.tail.num_dropped, 2);
        assert_eq!(update.tail.new_tail.len(), 2);
        assert!(!update.tail.new_tail.contains(&first_id));
        drop(text_tx);
    }
}
