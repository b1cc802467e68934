//! Core, transport-agnostic building blocks for live incremental evaluation:
//! an actor runtime, a generic incremental state server, the monoid algebra
//! its diffs are built from, and the DAG evaluator that ties them together
//! into a stream of per-cell results.
//!
//! Crates that plug in a concrete source grammar (`livecell-watch`) or a
//! transport (`livecell-server`) depend on this crate and never reach past
//! its public API into private state.

pub mod abort;
pub mod actor;
pub mod block;
pub mod diff;
pub mod error;
pub mod evaluator;
pub mod ids;
pub mod incremental;
pub mod list;
pub mod monoid;

pub use abort::AbortHandle;
pub use actor::{launch_actor, Lifted, Mailbox, Sink};
pub use block::{CellOutput, HighlightKind, Lexeme, NodeEvalStatus, NodeState, SourceBlock, Span};
pub use diff::{MapEltUpdate, MapUpdate, NodeListUpdate, Overwrite, TailUpdate};
pub use error::{Error, Result};
pub use evaluator::{launch_evaluator, CellEvaluator, EvaluatorMsg};
pub use ids::{FreshNames, NodeId};
pub use incremental::IncrementalServer;
pub use list::{common_prefix_length, NodeList};
pub use monoid::Monoid;
