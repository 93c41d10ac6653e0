//! Problem-level integration: the file-backed oracle end to end, seed
//! reuse through the factory, and heuristic solving beyond the word-mask
//! limit.

use std::io::Write;

use scsga::{
    AgentGreedyConfig, AgentGreedySolver, Distribution, DpSolver, Problem, ProblemSpec,
    SkillOracle, Solver, ValueOracle, REUSE_SEED,
};

#[test]
fn test_file_backed_problem_solves() {
    let path = std::env::temp_dir().join("scsga_file_oracle_test.table");
    {
        let mut file = std::fs::File::create(&path).unwrap();
        // 2 agents, 2 tasks; optimum is {A,B} on task 0 for value 3.
        writeln!(file, "2 2").unwrap();
        writeln!(file, "0 1 1 3").unwrap();
        writeln!(file, "0 2 0 1").unwrap();
    }

    let mut problem = Problem::new(ProblemSpec {
        n_agents: 2,
        n_tasks: 2,
        seed: 0,
        distribution: Distribution::File,
        distribution_file: Some(path.clone()),
    })
    .unwrap();
    problem.allocate().unwrap();

    let solution = DpSolver.solve(problem.oracle());
    assert!((solution.value - 3.0).abs() < 1e-5);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_file_backed_problem_rejects_size_change() {
    let path = std::env::temp_dir().join("scsga_file_oracle_size_test.table");
    std::fs::write(&path, "1 1\n0.0 1.0\n").unwrap();

    let mut problem = Problem::new(ProblemSpec {
        n_agents: 3,
        n_tasks: 1,
        seed: 0,
        distribution: Distribution::File,
        distribution_file: Some(path.clone()),
    })
    .unwrap();
    assert!(problem.allocate().is_err());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_reuse_seed_through_factory() {
    let mut problem = Problem::new(ProblemSpec {
        n_agents: 5,
        n_tasks: 2,
        seed: 11,
        distribution: Distribution::Upd,
        distribution_file: None,
    })
    .unwrap();
    problem.allocate().unwrap();
    let before = problem.oracle().table().unwrap().to_vec();

    problem
        .oracle_mut()
        .generate(5, 2, REUSE_SEED)
        .unwrap();
    assert_eq!(problem.oracle().table().unwrap(), &before[..]);
}

#[test]
fn test_heuristics_work_beyond_word_limit() {
    // 40 agents: no dense table, values memoized lazily per coalition.
    let mut oracle = SkillOracle::default();
    oracle.generate(40, 3, 6).unwrap();
    assert!(oracle.table().is_none());

    let mut solver = AgentGreedySolver::new(
        AgentGreedyConfig::default().with_seed(4).with_hill_climb(true),
    );
    let solution = solver.solve(&oracle);
    solution.validate(&oracle).unwrap();

    // A skill oracle is additive, so greedy placement is optimal: each
    // agent lands on its best task.
    let mut expected = 0.0f32;
    for agent in 0..40 {
        let mut single = scsga::Coalition::new(40);
        single.add(agent);
        expected += (0..3)
            .map(|task| oracle.value(&single, task))
            .fold(f32::MIN, f32::max);
    }
    assert!((solution.value - expected).abs() < 1e-3);
}
