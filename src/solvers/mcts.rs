//! SP-MCTS tree search.
//!
//! One decision per agent (in a possibly shuffled visiting order), each
//! decision choosing a task. The search runs level by level: at each depth
//! a budgeted number of simulations grows a fresh subtree rooted at that
//! depth, the most-visited action is committed, and the next depth starts
//! over — no tree ever spans the whole episode, which bounds memory at the
//! cost of sharing statistics across depths only through the incumbent
//! value every score normalizes by. Below the frontier, episodes finish
//! with a configurable rollout; the tail can be brute-forced exactly once
//! few enough agents remain.

use serde::{Deserialize, Serialize};

use crate::core::{Deadline, SolverRng, Value};
use crate::oracle::ValueOracle;
use crate::solution::Solution;

use super::greedy::hill_climb;
use super::policy::{SelectionPolicy, SpUctPolicy};
use super::Solver;

/// How an episode is completed below the tree frontier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RolloutKind {
    /// Uniformly random task per remaining agent.
    Random,
    /// Each remaining agent takes the task with the best marginal value.
    Greedy,
}

/// SP-MCTS configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MctsConfig {
    /// Seconds; negative runs a single pass over all depths.
    pub time_limit: f64,
    pub seed: Option<u64>,

    /// Weight of the exploration term.
    pub exploration_weight: f32,
    /// Weight inside the variance bonus.
    pub variance_weight: f32,
    /// Weight of the external-estimate term.
    pub estimation_weight: f32,

    /// Simulations before committing a depth's action.
    pub simulations_per_depth: u32,
    /// Samples of an action before its child node materializes.
    pub expansion_threshold: u32,
    /// Exact brute-force finish once this many agents remain.
    pub brute_force_depth: u32,
    pub rollout: RolloutKind,
    /// Reshuffle the agent visiting order before each pass.
    pub shuffle_each_pass: bool,
    /// Polish each new incumbent with a hill climb.
    pub hill_climb: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            time_limit: -1.0,
            seed: None,
            exploration_weight: -0.18,
            variance_weight: 0.33,
            estimation_weight: 1.0,
            simulations_per_depth: 2000,
            expansion_threshold: 1,
            brute_force_depth: 0,
            rollout: RolloutKind::Random,
            shuffle_each_pass: true,
            hill_climb: false,
        }
    }
}

impl MctsConfig {
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_simulations_per_depth(mut self, simulations: u32) -> Self {
        self.simulations_per_depth = simulations;
        self
    }

    pub fn with_rollout(mut self, rollout: RolloutKind) -> Self {
        self.rollout = rollout;
        self
    }

    pub fn with_brute_force_depth(mut self, depth: u32) -> Self {
        self.brute_force_depth = depth;
        self
    }
}

/// SP-MCTS solver.
#[derive(Clone, Debug, Default)]
pub struct MctsSolver {
    pub config: MctsConfig,
}

impl MctsSolver {
    #[must_use]
    pub fn new(config: MctsConfig) -> Self {
        Self { config }
    }
}

struct Node {
    policy: SpUctPolicy,
    /// Child arena index per action; 0 means unexpanded (the root lives
    /// at index 0 and is never anyone's child).
    children: Vec<u32>,
}

struct Search<'a> {
    oracle: &'a dyn ValueOracle,
    config: &'a MctsConfig,
    n_agents: u32,
    n_tasks: u32,
    brute_force_depth: u32,

    nodes: Vec<Node>,
    agent_order: Vec<u32>,
    temp: Solution,
    best: Solution,

    rng: SolverRng,
    deadline: Deadline,
    evaluated: u64,
}

impl<'a> Search<'a> {
    fn new_node(&self) -> Node {
        Node {
            policy: SpUctPolicy::new(
                self.n_tasks,
                self.config.exploration_weight,
                self.config.variance_weight,
                self.config.estimation_weight,
            ),
            children: vec![0; self.n_tasks as usize],
        }
    }

    /// Exact enumeration of the remaining tail; updates the incumbent at
    /// every complete assignment.
    fn brute_force(&mut self, position: u32) -> Value {
        if position >= self.n_agents {
            self.evaluated += 1;
            self.temp.recalculate_value(self.oracle);
            if self.temp.value > self.best.value {
                self.best = self.temp.clone();
                if self.config.hill_climb {
                    let mut order = self.agent_order.clone();
                    hill_climb(&mut self.best, self.oracle, &mut order, &mut self.rng, false, 25);
                }
            }
            return self.temp.value;
        }

        let agent = self.agent_order[position as usize];
        let mut best_value = Value::MIN;
        for task in 0..self.n_tasks {
            self.temp.add_agent(agent, task);
            best_value = best_value.max(self.brute_force(position + 1));
            self.temp.remove_agent(agent, task);
            if self.deadline.reached() {
                break;
            }
        }
        best_value
    }

    fn greedy_rollout(&mut self, position: u32) -> Value {
        if position + self.brute_force_depth >= self.n_agents {
            return self.brute_force(position);
        }

        let agent = self.agent_order[position as usize];
        let mut best_task = 0;
        let mut best_delta = Value::MIN;
        for task in 0..self.n_tasks {
            let before = self.temp.coalition_value(self.oracle, task);
            self.temp.add_agent(agent, task);
            let after = self.temp.coalition_value(self.oracle, task);
            self.temp.remove_agent(agent, task);
            if after - before > best_delta {
                best_delta = after - before;
                best_task = task;
            }
        }

        self.temp.add_agent(agent, best_task);
        let value = self.greedy_rollout(position + 1);
        self.temp.remove_agent(agent, best_task);
        value
    }

    fn random_rollout(&mut self, position: u32) -> Value {
        if position + self.brute_force_depth >= self.n_agents {
            return self.brute_force(position);
        }

        let agent = self.agent_order[position as usize];
        let task = self.rng.gen_below(self.n_tasks);
        self.temp.add_agent(agent, task);
        let value = self.random_rollout(position + 1);
        self.temp.remove_agent(agent, task);
        value
    }

    fn rollout(&mut self, position: u32) -> Value {
        match self.config.rollout {
            RolloutKind::Random => self.random_rollout(position),
            RolloutKind::Greedy => self.greedy_rollout(position),
        }
    }

    /// One simulation: descend by policy score, expand, roll out, record.
    fn tree_policy(&mut self, node: u32, position: u32) -> Value {
        if position + self.brute_force_depth >= self.n_agents {
            return self.brute_force(position);
        }

        let best_value = self.best.value;
        let action = self.nodes[node as usize].policy.next_action(best_value);

        if self.nodes[node as usize].policy.visits(action) == self.config.expansion_threshold
            && self.nodes[node as usize].children[action as usize] == 0
        {
            let child = self.new_node();
            let child_index = self.nodes.len() as u32;
            self.nodes.push(child);
            self.nodes[node as usize].children[action as usize] = child_index;
        }

        let agent = self.agent_order[position as usize];
        self.temp.add_agent(agent, action);
        let child = self.nodes[node as usize].children[action as usize];
        let value = if child != 0 {
            self.tree_policy(child, position + 1)
        } else {
            self.rollout(position + 1)
        };
        self.nodes[node as usize].policy.record(action, value);
        self.temp.remove_agent(agent, action);
        value
    }

    /// One pass: commit one action per depth from a fresh subtree.
    fn one_pass(&mut self) {
        self.temp.reset(self.n_tasks, self.n_agents);

        let tree_depths = self.n_agents - self.brute_force_depth;
        for position in 0..tree_depths {
            self.nodes.clear();
            let root = self.new_node();
            self.nodes.push(root);

            for _ in 0..self.config.simulations_per_depth {
                self.tree_policy(0, position);
                if self.deadline.reached() {
                    break;
                }
            }

            let best_task = self.nodes[0].policy.best_action();
            let agent = self.agent_order[position as usize];
            self.temp.add_agent(agent, best_task);
        }
    }
}

impl Solver for MctsSolver {
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution {
        let n = oracle.n_agents();
        let m = oracle.n_tasks();
        let mut rng = SolverRng::seeded(self.config.seed);

        // Random incumbent so the score normalizer is defined from the
        // first simulation.
        let mut best = Solution::new();
        best.reset(m, n);
        for agent in 0..n {
            best.add_agent(agent, rng.gen_below(m));
        }
        best.recalculate_value(oracle);

        let mut search = Search {
            oracle,
            config: &self.config,
            n_agents: n,
            n_tasks: m,
            brute_force_depth: self.config.brute_force_depth.min(n),
            nodes: Vec::new(),
            agent_order: (0..n).collect(),
            temp: Solution::new(),
            best,
            rng,
            deadline: Deadline::start(self.config.time_limit),
            evaluated: 0,
        };

        if self.config.time_limit < 0.0 {
            search.one_pass();
        } else {
            let mut passes = 0u64;
            loop {
                if self.config.shuffle_each_pass {
                    let mut order = std::mem::take(&mut search.agent_order);
                    search.rng.shuffle(&mut order);
                    search.agent_order = order;
                }
                search.one_pass();
                passes += 1;
                if search.deadline.reached() {
                    break;
                }
            }
            log::debug!("sp-mcts: {passes} passes, {} tail evaluations", search.evaluated);
        }

        search.best
    }
}
