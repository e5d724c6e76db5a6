//! Unit tests for the CLI commands, parsing and rendering.

use super::commands::{check_leaves, evaluate_command, load_problem, run_command};
use super::{
    Cli, CliError, Command, EvaluateCommand, EvaluationSummary, ExecutionArg, ExecutionSummary,
    NetworkArg, RunCommand, RunSummary, StrategyArgs, TraversalArg, render_summary, run_cli,
};

use std::fs::File;
use std::io::{self, Write};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rstest::{fixture, rstest};
use tempfile::TempDir;
use tracing_subscriber::layer::SubscriberExt;
use treesum_core::{ErrorClass, Graph, TreeSumError, ValueBatch};

use treesum_test_support::tracing::RecordingLayer;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const NETWORK_TWO_PROBLEM: &str = r#"{
    "adjacency": [
        [0, 0, 1, 0, 0, 0, 0, 0, 0, 0],
        [0, 0, 1, 0, 0, 0, 0, 0, 0, 0],
        [1, 1, 0, 1, 0, 0, 0, 0, 0, 0],
        [0, 0, 1, 0, 0, 0, 0, 1, 0, 0],
        [0, 0, 0, 0, 0, 1, 0, 0, 0, 0],
        [0, 0, 0, 0, 1, 0, 0, 1, 0, 0],
        [0, 0, 0, 0, 0, 0, 0, 0, 1, 0],
        [0, 0, 0, 1, 0, 1, 0, 0, 1, 1],
        [0, 0, 0, 0, 0, 0, 1, 1, 0, 0],
        [0, 0, 0, 0, 0, 0, 0, 1, 0, 0]
    ],
    "nodes_start": [0, 1, 6, 9],
    "nodes_end": [4],
    "values": [
        [1, 2, 0, 0, 0, 0, 3, 0, 0, 4],
        [0.5, 0.5, 9, 9, 9, 9, 1, 9, 9, 2]
    ]
}"#;

#[fixture]
fn strategy() -> StrategyArgs {
    StrategyArgs {
        traversal: TraversalArg::Worklist,
        execution: ExecutionArg::Sequential,
    }
}

fn run_args(network: NetworkArg, strategy: StrategyArgs) -> RunCommand {
    RunCommand {
        network,
        scenarios: 64,
        executions: NonZeroU32::new(3).expect("three is non-zero"),
        seed: 42,
        budget_micros: None,
        strategy,
    }
}

fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

fn create_problem_file(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    let mut file = File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path)
}

#[rstest]
#[case::one(NetworkArg::One, 9)]
#[case::two(NetworkArg::Two, 4)]
fn run_reports_root_mean_as_leaf_total(
    #[case] network: NetworkArg,
    #[case] root: usize,
    strategy: StrategyArgs,
) -> TestResult {
    let summary = run_command(&run_args(network, strategy))?;
    assert_eq!(summary.executions, 3);
    assert_eq!(summary.scenarios, 64);
    assert_eq!(summary.node_means.len(), 10);
    assert!(summary.total >= summary.average);
    assert_eq!(summary.within_budget(), None);
    // Leaves are uniform in [0, 1), so each root value lies in [0, 4).
    let root_mean = summary.node_means[root];
    assert!((0.0..4.0).contains(&root_mean), "root mean {root_mean}");
    Ok(())
}

#[rstest]
#[case::recursive(TraversalArg::Recursive, ExecutionArg::Parallel)]
#[case::worklist(TraversalArg::Worklist, ExecutionArg::Auto)]
fn run_strategies_agree(
    #[case] traversal: TraversalArg,
    #[case] execution: ExecutionArg,
    strategy: StrategyArgs,
) -> TestResult {
    let reference = run_command(&run_args(NetworkArg::One, strategy))?;
    let other = run_command(&run_args(
        NetworkArg::One,
        StrategyArgs {
            traversal,
            execution,
        },
    ))?;
    assert_eq!(reference.node_means, other.node_means);
    Ok(())
}

#[rstest]
fn run_flags_generous_budgets_as_met(strategy: StrategyArgs) -> TestResult {
    let mut args = run_args(NetworkArg::Two, strategy);
    args.budget_micros = Some(60_000_000);
    let summary = run_command(&args)?;
    assert_eq!(summary.budget, Some(Duration::from_secs(60)));
    assert_eq!(summary.within_budget(), Some(true));
    Ok(())
}

#[rstest]
fn evaluate_prints_every_scenario(strategy: StrategyArgs) -> TestResult {
    let dir = temp_dir();
    let path = create_problem_file(&dir, "two.json", NETWORK_TWO_PROBLEM)?;
    let summary = evaluate_command(&EvaluateCommand { path, strategy })?;
    assert_eq!(summary.root, 4);
    assert_eq!(
        summary.rows,
        vec![
            vec![1.0, 2.0, 3.0, 3.0, 10.0, 10.0, 3.0, 10.0, 3.0, 4.0],
            vec![0.5, 0.5, 1.0, 1.0, 4.0, 4.0, 1.0, 4.0, 1.0, 2.0],
        ]
    );
    Ok(())
}

#[rstest]
fn evaluate_reports_missing_files(strategy: StrategyArgs) {
    let dir = temp_dir();
    let path = dir.path().join("absent.json");
    let err = evaluate_command(&EvaluateCommand {
        path: path.clone(),
        strategy,
    })
    .expect_err("missing file must fail");
    match err {
        CliError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
#[case::not_json("adjacency = []")]
#[case::missing_field(r#"{ "adjacency": [], "nodes_start": [], "nodes_end": [] }"#)]
fn load_problem_rejects_malformed_files(#[case] contents: &str) -> TestResult {
    let dir = temp_dir();
    let path = create_problem_file(&dir, "bad.json", contents)?;
    let err = load_problem(&path).expect_err("malformed problem must fail");
    assert!(matches!(err, CliError::Json { .. }));
    Ok(())
}

#[rstest]
#[case::cycle(
    r#"{ "adjacency": [[0,1,1],[1,0,1],[1,1,0]], "nodes_start": [], "nodes_end": [0], "values": [[0,0,0]] }"#,
    ErrorClass::Structural
)]
#[case::two_sinks(
    r#"{ "adjacency": [[0,1],[1,0]], "nodes_start": [], "nodes_end": [0, 1], "values": [[0,0]] }"#,
    ErrorClass::Configuration
)]
#[case::ragged(
    r#"{ "adjacency": [[0,1],[1,0]], "nodes_start": [0], "nodes_end": [1], "values": [[0,0],[0]] }"#,
    ErrorClass::Shape
)]
fn evaluate_surfaces_core_errors(
    #[case] contents: &str,
    #[case] class: ErrorClass,
    strategy: StrategyArgs,
) -> TestResult {
    let dir = temp_dir();
    let path = create_problem_file(&dir, "problem.json", contents)?;
    let err = evaluate_command(&EvaluateCommand { path, strategy })
        .expect_err("invalid problem must fail");
    match err {
        CliError::Core(core) => assert_eq!(core.class(), class),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn check_leaves_detects_modified_leaf_columns() -> TestResult {
    let graph = Graph::from_edges(3, [(0, 2), (1, 2)], [0, 1], [2])?;
    let values = ValueBatch::from_rows(&[[1.0, 2.0, 0.0]])?;
    let mut out = values.clone();
    assert!(out.set(0, 1, 5.0));
    let err = check_leaves(&graph, &values, &out).expect_err("leaf 1 changed");
    assert!(matches!(err, CliError::LeafChanged { node: 1 }));
    Ok(())
}

#[test]
fn render_run_summary() -> TestResult {
    let summary = ExecutionSummary::Run(RunSummary {
        network: "one".to_owned(),
        scenarios: 2,
        executions: 4,
        total: Duration::from_micros(6),
        average: Duration::from_nanos(1500),
        budget: Some(Duration::from_micros(1)),
        node_means: vec![0.25, 0.5],
    });
    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer)?;
    let rendered = String::from_utf8(buffer)?;
    assert_eq!(
        rendered,
        "network: one\nscenarios: 2\nexecutions: 4\ntotal: 6µs\naverage: 1.5µs\n\
         budget: exceeded (1µs)\nnode means:\n0\t0.250000\n1\t0.500000\n"
    );
    Ok(())
}

#[test]
fn render_evaluation_summary() -> TestResult {
    let summary = ExecutionSummary::Evaluate(EvaluationSummary {
        root: 1,
        rows: vec![vec![0.5, 0.5], vec![-1.0, -1.0]],
    });
    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer)?;
    assert_eq!(
        String::from_utf8(buffer)?,
        "root: 1\nscenarios: 2\n0\t0.5\t0.5\n1\t-1\t-1\n"
    );
    Ok(())
}

#[rstest]
#[case::run_defaults(&["treesum", "run", "--network", "two"])]
#[case::run_full(&[
    "treesum", "run", "--network", "one", "--scenarios", "10", "--executions", "5",
    "--seed", "1", "--budget-micros", "250", "--traversal", "recursive",
    "--execution", "parallel",
])]
#[case::evaluate(&["treesum", "evaluate", "problem.json", "--execution", "sequential"])]
fn clap_accepts_documented_arguments(#[case] args: &[&str]) {
    assert!(Cli::try_parse_from(args).is_ok());
}

#[rstest]
#[case::unknown_network(&["treesum", "run", "--network", "three"])]
#[case::zero_executions(&["treesum", "run", "--network", "one", "--executions", "0"])]
#[case::unknown_traversal(&["treesum", "evaluate", "p.json", "--traversal", "bfs"])]
fn clap_rejects_invalid_arguments(#[case] args: &[&str]) {
    assert!(Cli::try_parse_from(args).is_err());
}

#[test]
fn run_defaults_match_the_reference_harness() {
    let cli = Cli::try_parse_from(["treesum", "run", "--network", "one"]).expect("valid args");
    let Command::Run(run) = cli.command else {
        panic!("expected the run command");
    };
    assert_eq!(run.scenarios, 1000);
    assert_eq!(run.executions.get(), 1);
    assert_eq!(run.seed, 42);
    assert_eq!(run.strategy.traversal, TraversalArg::Worklist);
    assert_eq!(run.strategy.execution, ExecutionArg::Auto);
}

#[rstest]
fn run_cli_records_tracing_fields(strategy: StrategyArgs) -> TestResult {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let cli = Cli {
        command: Command::Run(run_args(NetworkArg::Two, strategy)),
    };

    let summary = tracing::subscriber::with_default(subscriber, || run_cli(cli))?;
    assert!(matches!(summary, ExecutionSummary::Run(_)));

    let run = layer.span("cli.run").expect("cli.run span must exist");
    assert_eq!(run.field("command"), Some("run"));
    let execute = layer.span("cli.execute").expect("cli.execute span must exist");
    assert_eq!(execute.field("network"), Some("two"));
    assert_eq!(execute.field("scenarios"), Some("64"));
    assert_eq!(execute.field("executions"), Some("3"));
    assert!(layer.span("core.plan").is_some());
    assert_eq!(layer.events_with_message("run completed").len(), 1);
    Ok(())
}

#[rstest]
fn evaluate_failures_keep_the_core_error(strategy: StrategyArgs) -> TestResult {
    let dir = temp_dir();
    let path = create_problem_file(
        &dir,
        "wide.json",
        r#"{ "adjacency": [[0,1],[1,0]], "nodes_start": [0], "nodes_end": [1], "values": [[1,2,3]] }"#,
    )?;
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let err = tracing::subscriber::with_default(subscriber, || {
        evaluate_command(&EvaluateCommand { path, strategy })
    })
    .expect_err("rows are wider than the graph");
    assert!(matches!(
        err,
        CliError::Core(TreeSumError::ColumnMismatch {
            columns: 3,
            node_count: 2
        })
    ));
    let evaluate = layer.span("cli.evaluate").expect("cli.evaluate span must exist");
    assert!(evaluate.field("path").is_some_and(|path| path.ends_with("wide.json")));
    Ok(())
}

#[rstest]
fn evaluate_accepts_problems_without_scenarios(strategy: StrategyArgs) -> TestResult {
    let dir = temp_dir();
    let path = create_problem_file(
        &dir,
        "empty.json",
        r#"{ "adjacency": [[0,1],[1,0]], "nodes_start": [0], "nodes_end": [1], "values": [] }"#,
    )?;
    let summary = evaluate_command(&EvaluateCommand { path, strategy })?;
    assert_eq!(summary.root, 1);
    assert!(summary.rows.is_empty());
    Ok(())
}
