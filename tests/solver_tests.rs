//! Cross-solver integration tests: optimality agreement, the partition
//! invariant, degenerate instances, and reproducibility.

use scsga::{
    AgentGreedyConfig, AgentGreedySolver, AnnealingConfig, AnnealingSolver, AnytimeConfig,
    AnytimeSolver, BruteForceSolver, DpSolver, FlatMctsConfig, FlatMctsSolver, GeneticConfig,
    GeneticSolver, HybridSolver, MctsConfig, MctsSolver, PureRandomSolver, RandomSearchConfig,
    Solver, SolverKind, SwapRandomSolver, TableOracle, TaskGreedySolver, UniformOracle,
    ValueOracle,
};

fn uniform_oracle(n_agents: u32, n_tasks: u32, seed: i64) -> UniformOracle {
    let mut oracle = UniformOracle::default();
    oracle.generate(n_agents, n_tasks, seed).unwrap();
    oracle
}

/// The concrete table scenario: two agents, two tasks, optimum value 3,
/// reachable either as {A,B} on task 0 or as {B} on task 0 with {A} on
/// task 1.
fn two_agent_oracle() -> TableOracle {
    let mut oracle = TableOracle::new(2, 2);
    oracle.set_mask_value(0b01, 0, 1.0);
    oracle.set_mask_value(0b10, 0, 1.0);
    oracle.set_mask_value(0b11, 0, 3.0);
    oracle.set_mask_value(0b01, 1, 2.0);
    oracle.set_mask_value(0b10, 1, 0.0);
    oracle.set_mask_value(0b11, 1, 1.0);
    oracle
}

fn all_solvers() -> Vec<(&'static str, Box<dyn Solver>)> {
    vec![
        ("brute force", Box::new(BruteForceSolver)),
        ("dp", Box::new(DpSolver)),
        ("anytime", Box::new(AnytimeSolver::default())),
        (
            "anytime greedy-seeded",
            Box::new(AnytimeSolver::new(AnytimeConfig::default().with_greedy_seed(true))),
        ),
        ("hybrid", Box::new(HybridSolver::default())),
        (
            "agent greedy",
            Box::new(AgentGreedySolver::new(
                AgentGreedyConfig::default().with_seed(1).with_hill_climb(true),
            )),
        ),
        ("task greedy", Box::new(TaskGreedySolver)),
        (
            "annealing",
            Box::new(AnnealingSolver::new(
                AnnealingConfig::default().with_seed(1).with_max_iterations(20_000),
            )),
        ),
        (
            "genetic",
            Box::new(GeneticSolver::new(
                GeneticConfig::default()
                    .with_seed(1)
                    .with_population(50)
                    .with_max_rounds(60),
            )),
        ),
        (
            "pure random",
            Box::new(PureRandomSolver::new(RandomSearchConfig::default().with_seed(1))),
        ),
        (
            "swap random",
            Box::new(SwapRandomSolver::new(
                RandomSearchConfig::default().with_seed(1).with_max_iterations(5_000),
            )),
        ),
        (
            "flat mcts",
            Box::new(FlatMctsSolver::new(
                FlatMctsConfig::default().with_seed(1).with_simulations_per_action(200),
            )),
        ),
        (
            "sp-mcts",
            Box::new(MctsSolver::new(
                MctsConfig::default().with_seed(1).with_simulations_per_depth(300),
            )),
        ),
    ]
}

// =============================================================================
// Partition invariant
// =============================================================================

#[test]
fn test_every_solver_returns_a_partition() {
    let oracle = uniform_oracle(7, 3, 4242);

    for (name, mut solver) in all_solvers() {
        let solution = solver.solve(&oracle);
        solution
            .validate(&oracle)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
    }
}

// =============================================================================
// Optimality cross-checks
// =============================================================================

#[test]
fn test_exact_solvers_agree_on_random_instances() {
    for seed in [1, 77, 4096] {
        let oracle = uniform_oracle(6, 3, seed);

        let brute = BruteForceSolver.solve(&oracle);
        let dp = DpSolver.solve(&oracle);
        let anytime = AnytimeSolver::default().solve(&oracle);
        let hybrid = HybridSolver::default().solve(&oracle);

        assert!((dp.value - brute.value).abs() < 1e-4, "dp vs brute, seed {seed}");
        assert!(
            (anytime.value - brute.value).abs() < 2e-3,
            "anytime vs brute, seed {seed}"
        );
        assert!(
            (hybrid.value - brute.value).abs() < 2e-3,
            "hybrid vs brute, seed {seed}"
        );
    }
}

#[test]
fn test_concrete_scenario_reaches_three() {
    let oracle = two_agent_oracle();

    for (name, mut solver) in [
        ("brute force", Box::new(BruteForceSolver) as Box<dyn Solver>),
        ("dp", Box::new(DpSolver)),
        ("anytime", Box::new(AnytimeSolver::default())),
        ("hybrid", Box::new(HybridSolver::default())),
    ] {
        let solution = solver.solve(&oracle);
        assert!((solution.value - 3.0).abs() < 1e-5, "{name} missed the optimum");
    }

    // Greedy with hill climbing also reaches 3 on this instance from any
    // single-move-reachable start.
    let mut greedy = AgentGreedySolver::new(
        AgentGreedyConfig::default().with_seed(5).with_hill_climb(true),
    );
    let solution = greedy.solve(&oracle);
    assert!((solution.value - 3.0).abs() < 1e-5);
}

// =============================================================================
// Degenerate instances
// =============================================================================

#[test]
fn test_single_task_assigns_everyone() {
    let oracle = uniform_oracle(5, 1, 9);
    let expected = oracle.mask_value(0b11111, 0);

    for (name, mut solver) in all_solvers() {
        let solution = solver.solve(&oracle);
        assert!(
            (solution.value - expected).abs() < 1e-4,
            "{name} on a single task"
        );
    }
}

#[test]
fn test_single_agent_takes_best_task() {
    let mut oracle = TableOracle::new(1, 3);
    oracle.set_mask_value(1, 0, 0.25);
    oracle.set_mask_value(1, 1, 0.75);
    oracle.set_mask_value(1, 2, 0.5);

    // Exact and greedy solvers must hit the argmax task; randomized
    // heuristics only promise a valid partition here.
    for (name, mut solver) in [
        ("brute force", Box::new(BruteForceSolver) as Box<dyn Solver>),
        ("dp", Box::new(DpSolver)),
        ("anytime", Box::new(AnytimeSolver::default())),
        ("hybrid", Box::new(HybridSolver::default())),
        ("agent greedy", Box::new(AgentGreedySolver::default())),
        ("task greedy", Box::new(TaskGreedySolver)),
    ] {
        let solution = solver.solve(&oracle);
        assert!(solution.contains(0, 1), "{name} on a single agent");
    }

    for (name, mut solver) in all_solvers() {
        let solution = solver.solve(&oracle);
        solution
            .validate(&oracle)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
    }
}

// =============================================================================
// Anytime behavior
// =============================================================================

#[test]
fn test_anytime_incumbent_monotonic_in_budget() {
    let oracle = uniform_oracle(10, 4, 321);

    let strict = AnytimeSolver::new(AnytimeConfig::default().with_time_limit(0.005))
        .solve(&oracle);
    let generous = AnytimeSolver::new(AnytimeConfig::default().with_time_limit(2.0))
        .solve(&oracle);

    assert!(generous.value >= strict.value - 1e-4);
    strict.validate(&oracle).unwrap();
    generous.validate(&oracle).unwrap();
}

// =============================================================================
// Reproducibility
// =============================================================================

#[test]
fn test_seeded_solvers_are_bit_identical() {
    let oracle = uniform_oracle(6, 3, 1001);

    fn assert_identical(name: &str, oracle: &UniformOracle, mut a: Box<dyn Solver>, mut b: Box<dyn Solver>) {
        let first = a.solve(oracle);
        let second = b.solve(oracle);
        assert_eq!(first.value.to_bits(), second.value.to_bits(), "{name} diverged");
        for task in 0..oracle.n_tasks() {
            assert_eq!(
                first.coalition_mask(task),
                second.coalition_mask(task),
                "{name} structures diverged"
            );
        }
    }

    let annealing = AnnealingConfig::default().with_seed(3).with_max_iterations(3_000);
    assert_identical(
        "annealing",
        &oracle,
        Box::new(AnnealingSolver::new(annealing.clone())),
        Box::new(AnnealingSolver::new(annealing)),
    );

    let genetic = GeneticConfig::default()
        .with_seed(3)
        .with_population(40)
        .with_max_rounds(30);
    assert_identical(
        "genetic",
        &oracle,
        Box::new(GeneticSolver::new(genetic.clone())),
        Box::new(GeneticSolver::new(genetic)),
    );

    let mcts = MctsConfig::default().with_seed(3).with_simulations_per_depth(150);
    assert_identical(
        "sp-mcts",
        &oracle,
        Box::new(MctsSolver::new(mcts.clone())),
        Box::new(MctsSolver::new(mcts)),
    );

    let random = RandomSearchConfig::default().with_seed(3);
    assert_identical(
        "pure random",
        &oracle,
        Box::new(PureRandomSolver::new(random.clone())),
        Box::new(PureRandomSolver::new(random)),
    );
}

// =============================================================================
// Portfolio factory
// =============================================================================

#[test]
fn test_kind_factory_builds_working_solvers() {
    let oracle = uniform_oracle(4, 2, 55);

    // Unbounded heuristics with huge default iteration caps are exercised
    // through their explicitly capped configs above; here only the cheap
    // members of the portfolio run with factory defaults.
    for kind in [
        SolverKind::BruteForce,
        SolverKind::Dp,
        SolverKind::Anytime,
        SolverKind::AnytimeGreedySeeded,
        SolverKind::Hybrid,
        SolverKind::AgentGreedy,
        SolverKind::TaskGreedy,
        SolverKind::PureRandom,
        SolverKind::FlatMcts,
        SolverKind::SpMcts,
    ] {
        let solution = kind.build().solve(&oracle);
        solution
            .validate(&oracle)
            .unwrap_or_else(|e| panic!("{}: {e}", kind.abbrev()));
    }
}
