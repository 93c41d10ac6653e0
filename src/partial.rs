//! Evaluating completions of partially fixed assignments.
//!
//! External callers pin some agents to tasks and ask for the best
//! completion over the rest. The fixed pairs become a partial
//! [`Solution`], the partial solution derives a reduced oracle over only
//! the unassigned agents, any solver runs against the reduced problem, and
//! the completion is spliced back into the full universe.

use crate::oracle::ValueOracle;
use crate::solution::Solution;
use crate::solvers::{AgentGreedyConfig, AgentGreedySolver, Solver};

/// Build a partial solution from fixed `(agent, task)` pairs.
#[must_use]
pub fn solution_from_pairs(n_agents: u32, n_tasks: u32, fixed: &[(u32, u32)]) -> Solution {
    let mut partial = Solution::new();
    partial.reset(n_tasks, n_agents);
    for &(agent, task) in fixed {
        partial.add_agent(agent, task);
    }
    partial
}

/// Best completion of `fixed` using the given solver on the reduced
/// problem over unassigned agents.
pub fn complete_with(
    solver: &mut dyn Solver,
    oracle: &dyn ValueOracle,
    fixed: &[(u32, u32)],
) -> Solution {
    let partial = solution_from_pairs(oracle.n_agents(), oracle.n_tasks(), fixed);
    let unassigned = partial.unassigned_agents(oracle.n_agents());

    let reduced = partial.derive_partial_problem(oracle);
    let reduced_solution = solver.solve(&reduced);

    // Splice the reduced assignment back onto the full universe.
    let mut completed = partial;
    for task in 0..oracle.n_tasks() {
        for reduced_agent in reduced_solution.coalition(task).members() {
            completed.add_agent(unassigned[reduced_agent as usize], task);
        }
    }
    completed.recalculate_value(oracle);
    completed
}

/// Greedy completion of `fixed`, bypassing the problem reduction: the
/// agent-greedy solver can extend a partial solution directly.
pub fn complete_with_greedy(
    oracle: &dyn ValueOracle,
    fixed: &[(u32, u32)],
    config: AgentGreedyConfig,
) -> Solution {
    let partial = solution_from_pairs(oracle.n_agents(), oracle.n_tasks(), fixed);
    AgentGreedySolver::new(config).complete(oracle, &partial)
}
