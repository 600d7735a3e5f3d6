//! Shared RL training engine plus the two policy variants.

use super::config::RlConfig;
use crate::graph::{NetworkGraph, NodeId};
use crate::metrics::{evaluate, Weights};
use crate::optimize::{finish, validate_request, OptimizeContext, Optimizer, RouteRequest, RouteResult};
use crate::random::create_rng;
use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::FxHashMap;
use std::time::Instant;

/// Flat value table keyed by `(state, action)` node pairs. Missing entries
/// read as 0.
#[derive(Default)]
struct QTable {
    values: FxHashMap<(NodeId, NodeId), f64>,
}

impl QTable {
    fn get(&self, state: NodeId, action: NodeId) -> f64 {
        self.values.get(&(state, action)).copied().unwrap_or(0.0)
    }

    fn nudge(&mut self, state: NodeId, action: NodeId, eta: f64, target: f64) {
        let q = self.values.entry((state, action)).or_insert(0.0);
        *q += eta * (target - *q);
    }

    /// Greedy value over the bandwidth-feasible actions of `state`
    /// (visitation is ignored for bootstrapping).
    fn best_value(&self, graph: &NetworkGraph, state: NodeId, demand: f64) -> f64 {
        graph
            .neighbors(state)
            .iter()
            .copied()
            .filter(|&v| {
                demand <= 0.0
                    || graph
                        .edge(state, v)
                        .is_some_and(|e| e.bandwidth >= demand)
            })
            .map(|v| self.get(state, v))
            .fold(f64::NEG_INFINITY, f64::max)
            .max(0.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Policy {
    OffPolicy,
    OnPolicy,
}

/// Q-Learning: off-policy temporal-difference control.
pub struct QLearning {
    config: RlConfig,
}

/// SARSA: on-policy temporal-difference control.
pub struct Sarsa {
    config: RlConfig,
}

impl QLearning {
    /// # Panics
    /// Panics on an invalid configuration; call [`RlConfig::validate`] first
    /// for a descriptive error.
    pub fn new(config: RlConfig) -> Self {
        config.validate().expect("invalid RlConfig");
        Self { config }
    }

    pub fn config(&self) -> &RlConfig {
        &self.config
    }
}

impl Sarsa {
    /// # Panics
    /// Panics on an invalid configuration; call [`RlConfig::validate`] first
    /// for a descriptive error.
    pub fn new(config: RlConfig) -> Self {
        config.validate().expect("invalid RlConfig");
        Self { config }
    }

    pub fn config(&self) -> &RlConfig {
        &self.config
    }
}

impl Default for QLearning {
    fn default() -> Self {
        Self::new(RlConfig::default())
    }
}

impl Default for Sarsa {
    fn default() -> Self {
        Self::new(RlConfig::default())
    }
}

impl Optimizer for QLearning {
    fn name(&self) -> &'static str {
        "QLearning"
    }

    fn optimize(
        &self,
        graph: &NetworkGraph,
        request: &RouteRequest,
        seed: u64,
        ctx: &OptimizeContext,
    ) -> RouteResult {
        train(graph, request, seed, ctx, &self.config, Policy::OffPolicy)
    }
}

impl Optimizer for Sarsa {
    fn name(&self) -> &'static str {
        "SARSA"
    }

    fn optimize(
        &self,
        graph: &NetworkGraph,
        request: &RouteRequest,
        seed: u64,
        ctx: &OptimizeContext,
    ) -> RouteResult {
        train(graph, request, seed, ctx, &self.config, Policy::OnPolicy)
    }
}

fn train(
    graph: &NetworkGraph,
    request: &RouteRequest,
    seed: u64,
    ctx: &OptimizeContext,
    config: &RlConfig,
    policy: Policy,
) -> RouteResult {
    let start = Instant::now();
    if let Err(failure) = validate_request(graph, request, seed, start) {
        return *failure;
    }

    let mut rng = create_rng(seed);
    let mut table = QTable::default();
    let max_steps = 3 * graph.node_count();
    let report_every = (config.episodes / 20).max(1);

    let mut epsilon = config.epsilon_start;
    let mut best_episode: Option<(Vec<NodeId>, f64, usize)> = None;
    let mut timed_out = false;

    for episode in 0..config.episodes {
        if ctx.should_stop() {
            timed_out = true;
            break;
        }

        let path = match policy {
            Policy::OffPolicy => {
                run_episode_off_policy(graph, request, config, &mut table, epsilon, max_steps, &mut rng)
            }
            Policy::OnPolicy => {
                run_episode_on_policy(graph, request, config, &mut table, epsilon, max_steps, &mut rng)
            }
        };

        if let Some(path) = path {
            let cost = evaluate(graph, &path, &request.weights, request.demand).cost;
            if cost.is_finite()
                && best_episode
                    .as_ref()
                    .is_none_or(|(_, best_cost, _)| cost < *best_cost)
            {
                best_episode = Some((path, cost, episode));
            }
        }

        if episode % report_every == 0 {
            let best = best_episode
                .as_ref()
                .map_or(f64::INFINITY, |(_, cost, _)| *cost);
            ctx.report(episode, best);
        }

        epsilon = (epsilon * config.epsilon_decay).max(config.epsilon_end);
    }

    // Greedy rollout first; the best observed episode is the fallback when
    // the learned policy cycles or dead-ends.
    let best = greedy_rollout(graph, request, &table, max_steps)
        .filter(|path| {
            evaluate(graph, path, &request.weights, request.demand)
                .cost
                .is_finite()
        })
        .map(|path| (path, config.episodes))
        .or_else(|| best_episode.map(|(path, _, episode)| (path, episode)));

    finish(graph, request, best, seed, start, timed_out)
}

/// One off-policy (Q-Learning) episode. Returns the traversed path when the
/// destination was reached.
fn run_episode_off_policy(
    graph: &NetworkGraph,
    request: &RouteRequest,
    config: &RlConfig,
    table: &mut QTable,
    epsilon: f64,
    max_steps: usize,
    rng: &mut StdRng,
) -> Option<Vec<NodeId>> {
    let mut visited = vec![false; graph.node_count()];
    visited[request.source] = true;
    let mut state = request.source;
    let mut path = vec![request.source];
    let mut last_transition: Option<(NodeId, NodeId)> = None;

    for _ in 0..max_steps {
        if state == request.destination {
            return Some(path);
        }
        let actions = feasible_actions(graph, state, &visited, request.demand);
        let Some(action) = choose_action(table, state, &actions, epsilon, rng) else {
            // Dead end: punish the transition that led here.
            if let Some((s, a)) = last_transition {
                table.nudge(s, a, config.learning_rate, -config.dead_end_penalty);
            }
            return None;
        };

        let mut reward = step_reward(graph, &request.weights, state, action);
        let terminal = action == request.destination;
        if terminal {
            reward += config.goal_reward;
        }
        let target = if terminal {
            reward
        } else {
            reward + config.discount * table.best_value(graph, action, request.demand)
        };
        table.nudge(state, action, config.learning_rate, target);

        last_transition = Some((state, action));
        visited[action] = true;
        path.push(action);
        state = action;
    }

    (state == request.destination).then_some(path)
}

/// One on-policy (SARSA) episode: the bootstrap uses the ε-greedy action
/// actually chosen at the successor state.
fn run_episode_on_policy(
    graph: &NetworkGraph,
    request: &RouteRequest,
    config: &RlConfig,
    table: &mut QTable,
    epsilon: f64,
    max_steps: usize,
    rng: &mut StdRng,
) -> Option<Vec<NodeId>> {
    let mut visited = vec![false; graph.node_count()];
    visited[request.source] = true;
    let mut state = request.source;
    let mut path = vec![request.source];

    let actions = feasible_actions(graph, state, &visited, request.demand);
    let Some(mut action) = choose_action(table, state, &actions, epsilon, rng) else {
        return None;
    };

    for _ in 0..max_steps {
        let mut reward = step_reward(graph, &request.weights, state, action);
        let next_state = action;
        visited[next_state] = true;
        path.push(next_state);

        if next_state == request.destination {
            reward += config.goal_reward;
            table.nudge(state, action, config.learning_rate, reward);
            return Some(path);
        }

        let next_actions = feasible_actions(graph, next_state, &visited, request.demand);
        match choose_action(table, next_state, &next_actions, epsilon, rng) {
            Some(next_action) => {
                let target =
                    reward + config.discount * table.get(next_state, next_action);
                table.nudge(state, action, config.learning_rate, target);
                state = next_state;
                action = next_action;
            }
            None => {
                table.nudge(
                    state,
                    action,
                    config.learning_rate,
                    reward - config.dead_end_penalty,
                );
                return None;
            }
        }
    }

    None
}

/// Unvisited neighbors whose incident edge satisfies the demand.
fn feasible_actions(
    graph: &NetworkGraph,
    state: NodeId,
    visited: &[bool],
    demand: f64,
) -> Vec<NodeId> {
    graph
        .neighbors(state)
        .iter()
        .copied()
        .filter(|&v| {
            !visited[v]
                && (demand <= 0.0
                    || graph
                        .edge(state, v)
                        .is_some_and(|e| e.bandwidth >= demand))
        })
        .collect()
}

/// ε-greedy over the feasible actions; exploitation breaks ties toward the
/// lowest node id (the neighbor cache is sorted).
fn choose_action(
    table: &QTable,
    state: NodeId,
    actions: &[NodeId],
    epsilon: f64,
    rng: &mut StdRng,
) -> Option<NodeId> {
    if actions.is_empty() {
        return None;
    }
    if rng.random_range(0.0..1.0) < epsilon {
        return Some(actions[rng.random_range(0..actions.len())]);
    }
    let mut best = actions[0];
    let mut best_q = table.get(state, best);
    for &a in &actions[1..] {
        let q = table.get(state, a);
        if q > best_q {
            best_q = q;
            best = a;
        }
    }
    Some(best)
}

/// Per-edge shaped reward: the negative of the weighted, per-edge-normalized
/// cost of crossing `(u, v)`.
fn step_reward(graph: &NetworkGraph, weights: &Weights, u: NodeId, v: NodeId) -> f64 {
    let edge = graph.edge(u, v).expect("actions come from the neighbor cache");
    let norm_delay = edge.delay / 100.0;
    let combined_rel = edge.reliability * graph.node(v).reliability;
    let norm_rel = ((1.0 - combined_rel) * 10.0).min(1.0);
    let norm_res = (1000.0 / edge.bandwidth.max(1.0)) / 100.0;
    -(weights.delay * norm_delay + weights.reliability * norm_rel + weights.resource * norm_res)
}

/// Follows the learned policy greedily. `None` when it dead-ends or exceeds
/// the step cap (a cycle cannot occur — visited nodes are excluded).
fn greedy_rollout(
    graph: &NetworkGraph,
    request: &RouteRequest,
    table: &QTable,
    max_steps: usize,
) -> Option<Vec<NodeId>> {
    let mut visited = vec![false; graph.node_count()];
    visited[request.source] = true;
    let mut state = request.source;
    let mut path = vec![request.source];

    for _ in 0..max_steps {
        if state == request.destination {
            return Some(path);
        }
        let actions = feasible_actions(graph, state, &visited, request.demand);
        if actions.is_empty() {
            return None;
        }
        let mut best = actions[0];
        let mut best_q = table.get(state, best);
        for &a in &actions[1..] {
            let q = table.get(state, a);
            if q > best_q {
                best_q = q;
                best = a;
            }
        }
        visited[best] = true;
        path.push(best);
        state = best;
    }

    (state == request.destination).then_some(path)
}
