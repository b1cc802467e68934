//! The DAG evaluator: the actor that turns a stream of parsed cells into a
//! stream of per-cell results.
//!
//! It subscribes to a cell parser's [`NodeList<I>`] and maintains an outward
//! [`NodeList<NodeState<I,O>>`] plus private state tracking the environment
//! produced by each completed cell and the (at most one) job currently
//! running. Cells depend linearly on everything above them: editing cell `k`
//! invalidates every environment computed from cell `k` onward, even if a
//! later cell happens to still parse identically.

use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::abort::AbortHandle;
use crate::actor::{launch_actor, Mailbox, Sink};
use crate::block::{NodeEvalStatus, NodeState};
use crate::diff::{MapEltUpdate, MapUpdate, NodeListUpdate, TailUpdate};
use crate::ids::NodeId;
use crate::incremental::IncrementalServer;
use crate::list::NodeList;
use crate::monoid::Monoid;

/// How a single cell is evaluated: given the environment produced by every
/// cell above it and this cell's own parsed input, produce a result and the
/// environment to hand to the next cell.
///
/// Implementations that run for a long time must poll `abort` at their own
/// safe points; the evaluator additionally aborts the underlying task on
/// invalidation, so an implementation that never polls `abort` is still cut
/// off at its next `.await`, just not necessarily before doing more work.
#[async_trait]
pub trait CellEvaluator<Env, I, O>: Send + Sync
where
    Env: Clone + Send + Sync + 'static,
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    async fn eval(&self, env: Env, input: &I, abort: AbortHandle) -> (O, Env);
}

#[async_trait]
impl<Env, I, O, F, Fut> CellEvaluator<Env, I, O> for F
where
    Env: Clone + Send + Sync + 'static,
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
    F: Fn(Env, &I, AbortHandle) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = (O, Env)> + Send,
{
    async fn eval(&self, env: Env, input: &I, abort: AbortHandle) -> (O, Env) {
        self(env, input, abort).await
    }
}

/// Messages the evaluator actor understands.
pub enum EvaluatorMsg<Env, I, O> {
    /// A diff from the upstream cell parser.
    SourceUpdate(NodeListUpdate<I>),
    /// A worker task finished. Carries the generation it was launched under
    /// so the evaluator can tell a legitimate completion from a zombie.
    JobComplete {
        generation: u64,
        env: Env,
        result: O,
    },
    /// A downstream client wants the current snapshot and a feed of future
    /// diffs.
    Subscribe(oneshot::Sender<(NodeList<NodeState<I, O>>, tokio::sync::mpsc::UnboundedReceiver<NodeListUpdate<NodeState<I, O>>>)>),
}

/// The one job the evaluator may have in flight at a time.
struct RunningJob {
    generation: u64,
    node_id: NodeId,
    job_index: usize,
    abort: AbortHandle,
    join: tokio::task::JoinHandle<()>,
}

/// Private evaluator state: not exposed to subscribers, reconstructed from
/// scratch on every restart.
struct EvaluatorPrivate<Env> {
    prev_envs: Vec<Env>,
    next_generation: u64,
    cur_running_job: Option<RunningJob>,
}

impl<Env: Clone> EvaluatorPrivate<Env> {
    fn new(initial_env: Env) -> Self {
        EvaluatorPrivate {
            prev_envs: vec![initial_env],
            next_generation: 0,
            cur_running_job: None,
        }
    }

    fn fresh_generation(&mut self) -> u64 {
        let g = self.next_generation;
        self.next_generation += 1;
        g
    }
}

/// Spawn the DAG evaluator actor.
///
/// `cell_list` is the full upstream snapshot at subscribe time, `cell_rx`
/// the feed of subsequent diffs; `eval_fn` is the pluggable per-cell
/// evaluation function and `initial_env` the environment handed to the
/// first cell.
pub fn launch_evaluator<Env, I, O>(
    cell_list: NodeList<I>,
    mut cell_rx: tokio::sync::mpsc::UnboundedReceiver<NodeListUpdate<I>>,
    eval_fn: Arc<dyn CellEvaluator<Env, I, O>>,
    initial_env: Env,
) -> Mailbox<EvaluatorMsg<Env, I, O>>
where
    Env: Clone + Send + Sync + 'static,
    I: Clone + Eq + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    launch_actor(move |mut rx, self_mb| async move {
        let initial_state: NodeList<NodeState<I, O>> = lift_node_list(&cell_list);
        let mut server: IncrementalServer<NodeList<NodeState<I, O>>, NodeListUpdate<NodeState<I, O>>> =
            IncrementalServer::new(initial_state);
        let mut cells = cell_list;
        let mut priv_state = EvaluatorPrivate::new(initial_env);

        maybe_launch_next_job(&mut priv_state, &cells, &self_mb, eval_fn.clone());

        let forward = self_mb.lift(EvaluatorMsg::SourceUpdate);
        loop {
            tokio::select! {
                biased;
                Some(update) = cell_rx.recv() => {
                    // Coalesce any further parser diffs that are already
                    // sitting in the channel by the time we get to the
                    // first one: several edits landing before this actor
                    // has a chance to react collapse into one composite
                    // `SourceUpdate`, so subscribers only ever see the net
                    // effect, never an intermediate state.
                    let mut combined = update;
                    while let Ok(next) = cell_rx.try_recv() {
                        combined = combined.combine(&next);
                    }
                    forward.send(combined);
                }
                Some(msg) = rx.recv() => {
                    match msg {
                        EvaluatorMsg::SourceUpdate(update) => {
                            handle_source_update(
                                &mut server,
                                &mut cells,
                                &mut priv_state,
                                update,
                                &self_mb,
                                eval_fn.clone(),
                            );
                        }
                        EvaluatorMsg::JobComplete { generation, env, result } => {
                            handle_job_complete(
                                &mut server,
                                &cells,
                                &mut priv_state,
                                generation,
                                env,
                                result,
                                &self_mb,
                                eval_fn.clone(),
                            );
                        }
                        EvaluatorMsg::Subscribe(reply) => {
                            let (snapshot, rx) = server.subscribe_channel();
                            let _ = reply.send((snapshot, rx));
                        }
                    }
                }
                else => break,
            }
        }
    })
}

fn lift_node_list<I: Clone, O: Clone>(cells: &NodeList<I>) -> NodeList<NodeState<I, O>> {
    let mut out: NodeList<NodeState<I, O>> = NodeList::new();
    let update = cells.full_creation_diff();
    let lifted = lift_update::<I, O>(&update);
    out.apply_update(&lifted);
    out
}

/// Wrap every `Create`d `I` in a fresh `NodeState(I, Waiting)`; `Delete`s
/// pass through unchanged.
fn lift_update<I: Clone, O>(update: &NodeListUpdate<I>) -> NodeListUpdate<NodeState<I, O>> {
    let mut map = FxHashMap::default();
    for (id, elt) in &update.map.0 {
        let lifted = match elt {
            MapEltUpdate::Create(v) => MapEltUpdate::Create(NodeState::waiting(v.clone())),
            MapEltUpdate::Update(v) => MapEltUpdate::Update(NodeState::waiting(v.clone())),
            MapEltUpdate::Delete => MapEltUpdate::Delete,
        };
        map.insert(*id, lifted);
    }
    NodeListUpdate::new(update.tail.clone(), MapUpdate(map))
}

fn handle_source_update<Env, I, O>(
    server: &mut IncrementalServer<NodeList<NodeState<I, O>>, NodeListUpdate<NodeState<I, O>>>,
    cells: &mut NodeList<I>,
    priv_state: &mut EvaluatorPrivate<Env>,
    update: NodeListUpdate<I>,
    self_mb: &Mailbox<EvaluatorMsg<Env, I, O>>,
    eval_fn: Arc<dyn CellEvaluator<Env, I, O>>,
) where
    Env: Clone + Send + Sync + 'static,
    I: Clone + Eq + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    let n_dropped = update.tail.num_dropped;
    let n_total_before = cells.len();
    let n_valid = n_total_before.saturating_sub(n_dropped);

    cells.apply_update(&update);

    // Environments past the surviving prefix no longer correspond to any
    // cell; keep prevEnvs[0..=n_valid].
    priv_state.prev_envs.truncate(n_valid + 1);

    let outward = lift_update::<I, O>(&update);
    server.update(outward);

    match &priv_state.cur_running_job {
        None => {
            maybe_launch_next_job(priv_state, cells, self_mb, eval_fn);
        }
        Some(job) if job.job_index >= n_valid => {
            debug!(job_index = job.job_index, n_valid, "running job invalidated by edit, aborting");
            job.abort.abort();
            job.join.abort();
            priv_state.cur_running_job = None;
            maybe_launch_next_job(priv_state, cells, self_mb, eval_fn);
        }
        Some(_) => {
            trace!("running job still valid, leaving it in place");
        }
    }

    server.flush_diffs(|s, u| s.apply_update(u));
}

fn maybe_launch_next_job<Env, I, O>(
    priv_state: &mut EvaluatorPrivate<Env>,
    cells: &NodeList<I>,
    self_mb: &Mailbox<EvaluatorMsg<Env, I, O>>,
    eval_fn: Arc<dyn CellEvaluator<Env, I, O>>,
) where
    Env: Clone + Send + Sync + 'static,
    I: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    let job_index = priv_state.prev_envs.len() - 1;
    if job_index >= cells.len() {
        return;
    }
    let node_id = cells.ordered_ids()[job_index];
    let input = cells.get(node_id).expect("NodeList invariant").clone();
    let env = priv_state.prev_envs[job_index].clone();
    let abort = AbortHandle::new();
    let generation = priv_state.fresh_generation();

    let job_abort = abort.clone();
    let job_mb = self_mb.clone();
    let join = tokio::spawn(async move {
        let (result, env) = eval_fn.eval(env, &input, job_abort).await;
        job_mb.send(EvaluatorMsg::JobComplete {
            generation,
            env,
            result,
        });
    });

    priv_state.cur_running_job = Some(RunningJob {
        generation,
        node_id,
        job_index,
        abort,
        join,
    });
}

fn handle_job_complete<Env, I, O>(
    server: &mut IncrementalServer<NodeList<NodeState<I, O>>, NodeListUpdate<NodeState<I, O>>>,
    cells: &NodeList<I>,
    priv_state: &mut EvaluatorPrivate<Env>,
    generation: u64,
    env: Env,
    result: O,
    self_mb: &Mailbox<EvaluatorMsg<Env, I, O>>,
    eval_fn: Arc<dyn CellEvaluator<Env, I, O>>,
) where
    Env: Clone + Send + Sync + 'static,
    I: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    let legitimate = matches!(&priv_state.cur_running_job, Some(job) if job.generation == generation);
    if !legitimate {
        warn!(generation, "discarding zombie job completion");
        return;
    }
    let job = priv_state.cur_running_job.take().expect("checked above");

    let mut map = FxHashMap::default();
    map.insert(job.node_id, MapEltUpdate::Update(NodeState {
        input: cells.get(job.node_id).expect("node present").clone(),
        status: NodeEvalStatus::Complete(result),
    }));
    let outward = NodeListUpdate::new(TailUpdate::new(0, Vec::new()), MapUpdate(map));
    server.update(outward);

    priv_state.prev_envs.push(env);
    maybe_launch_next_job(priv_state, cells, self_mb, eval_fn);
    server.flush_diffs(|s, u| s.apply_update(u));
}

impl<M: Send + 'static> Mailbox<M> {
    /// Ask a running evaluator for its current snapshot plus a feed of
    /// future diffs. Convenience over sending a raw [`EvaluatorMsg::Subscribe`].
    pub async fn subscribe_evaluator<Env, I, O>(
        &self,
    ) -> Option<(NodeList<NodeState<I, O>>, tokio::sync::mpsc::UnboundedReceiver<NodeListUpdate<NodeState<I, O>>>)>
    where
        M: From<EvaluatorMsg<Env, I, O>>,
        Env: Send + 'static,
        I: Send + 'static,
        O: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.send(EvaluatorMsg::Subscribe(tx).into());
        rx.await.ok()
    }
}
