//! Command implementations and argument parsing for the treesum CLI.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};
use treesum_core::{
    Aggregator, AggregatorBuilder, ExecutionStrategy, Graph, TraversalStrategy, TreeSumError,
    ValueBatch, networks::ReferenceNetworkId, random_leaf_values,
};

const DEFAULT_SCENARIOS: usize = 1000;
const DEFAULT_SEED: u64 = 42;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "treesum",
    about = "Propagate leaf values to every ancestor of a rooted tree."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Time repeated aggregation of random scenarios over a reference network.
    Run(RunCommand),
    /// Aggregate the scenarios of a JSON problem file and print the result.
    Evaluate(EvaluateCommand),
}

/// Traversal and execution options shared by every command.
#[derive(Debug, Args, Clone, Copy)]
pub struct StrategyArgs {
    /// How the depth-first walk is driven.
    #[arg(long, value_enum, default_value_t = TraversalArg::Worklist)]
    pub traversal: TraversalArg,

    /// How scenario rows are scheduled.
    #[arg(long, value_enum, default_value_t = ExecutionArg::Auto)]
    pub execution: ExecutionArg,
}

impl StrategyArgs {
    fn aggregator(self) -> Result<Aggregator, TreeSumError> {
        AggregatorBuilder::new()
            .with_traversal(self.traversal.into())
            .with_execution(self.execution.into())
            .build()
    }
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Reference network to aggregate over.
    #[arg(long, value_enum)]
    pub network: NetworkArg,

    /// Number of random scenarios per batch.
    #[arg(long, default_value_t = DEFAULT_SCENARIOS)]
    pub scenarios: usize,

    /// Number of timed aggregations of the same batch.
    #[arg(long, default_value = "1")]
    pub executions: NonZeroU32,

    /// Seed for the leaf value generator.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Average wall time per execution, in microseconds, to check against.
    #[arg(long = "budget-micros")]
    pub budget_micros: Option<u64>,

    /// Strategy selection.
    #[command(flatten)]
    pub strategy: StrategyArgs,
}

/// Options accepted by the `evaluate` command.
#[derive(Debug, Args, Clone)]
pub struct EvaluateCommand {
    /// Path to a JSON file with `adjacency`, `nodes_start`, `nodes_end` and
    /// `values`.
    pub path: PathBuf,

    /// Strategy selection.
    #[command(flatten)]
    pub strategy: StrategyArgs,
}

/// Bundled networks selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NetworkArg {
    /// Ten nodes rooted at 9.
    One,
    /// Ten nodes rooted at 4.
    Two,
}

impl From<NetworkArg> for ReferenceNetworkId {
    fn from(value: NetworkArg) -> Self {
        match value {
            NetworkArg::One => Self::One,
            NetworkArg::Two => Self::Two,
        }
    }
}

/// Command-line spelling of [`TraversalStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraversalArg {
    /// Call-stack recursion with a depth bound.
    Recursive,
    /// Explicit stack of frames.
    Worklist,
}

impl From<TraversalArg> for TraversalStrategy {
    fn from(value: TraversalArg) -> Self {
        match value {
            TraversalArg::Recursive => Self::Recursive,
            TraversalArg::Worklist => Self::Worklist,
        }
    }
}

/// Command-line spelling of [`ExecutionStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionArg {
    /// Parallel for large batches when available.
    Auto,
    /// Always on the calling thread.
    Sequential,
    /// Always on the rayon pool.
    Parallel,
}

impl From<ExecutionArg> for ExecutionStrategy {
    fn from(value: ExecutionArg) -> Self {
        match value {
            ExecutionArg::Auto => Self::Auto,
            ExecutionArg::Sequential => Self::Sequential,
            ExecutionArg::Parallel => Self::Parallel,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while loading a problem.
    #[error("failed to open `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The problem file is not valid JSON of the expected shape.
    #[error("failed to parse `{path}`: {source}")]
    Json {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// A leaf column differs between input and output.
    #[error("leaf node {node} changed during aggregation")]
    LeafChanged {
        /// The leaf whose column was modified.
        node: usize,
    },
    /// Graph construction or aggregation failed.
    #[error(transparent)]
    Core(#[from] TreeSumError),
}

/// Problem file accepted by `evaluate`.
#[derive(Debug, Clone, Deserialize)]
pub struct Problem {
    /// Square adjacency matrix; any non-zero entry is an edge.
    pub adjacency: Vec<Vec<f64>>,
    /// Leaf nodes.
    pub nodes_start: Vec<usize>,
    /// Sink nodes; exactly one is required.
    pub nodes_end: Vec<usize>,
    /// One row per scenario, one column per node.
    pub values: Vec<Vec<f64>>,
}

/// Outcome of a `run` command.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Name of the reference network.
    pub network: String,
    /// Scenarios per batch.
    pub scenarios: usize,
    /// Number of timed executions.
    pub executions: u32,
    /// Wall time of all executions.
    pub total: Duration,
    /// `total / executions`.
    pub average: Duration,
    /// Requested average budget, if any.
    pub budget: Option<Duration>,
    /// Mean over scenarios of each node's aggregated value.
    pub node_means: Vec<f64>,
}

impl RunSummary {
    /// Returns whether the average stayed within the budget, if one was set.
    #[must_use]
    pub fn within_budget(&self) -> Option<bool> {
        self.budget.map(|budget| self.average <= budget)
    }
}

/// Outcome of an `evaluate` command.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSummary {
    /// Root of the evaluated tree.
    pub root: usize,
    /// Aggregated values, one row per scenario.
    pub rows: Vec<Vec<f64>>,
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionSummary {
    /// Timing run over a reference network.
    Run(RunSummary),
    /// Evaluation of a problem file.
    Evaluate(EvaluationSummary),
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading or aggregation fails.
///
/// # Examples
/// ```
/// # use std::num::NonZeroU32;
/// # use treesum_cli::cli::{
/// #     Cli, Command, ExecutionArg, ExecutionSummary, NetworkArg, RunCommand, StrategyArgs,
/// #     TraversalArg, run_cli,
/// # };
/// let cli = Cli {
///     command: Command::Run(RunCommand {
///         network: NetworkArg::One,
///         scenarios: 16,
///         executions: NonZeroU32::MIN,
///         seed: 7,
///         budget_micros: None,
///         strategy: StrategyArgs {
///             traversal: TraversalArg::Worklist,
///             execution: ExecutionArg::Sequential,
///         },
///     }),
/// };
/// let ExecutionSummary::Run(summary) = run_cli(cli)? else {
///     unreachable!("run yields a run summary");
/// };
/// assert_eq!(summary.node_means.len(), 10);
/// # Ok::<(), treesum_cli::cli::CliError>(())
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(&run).map(ExecutionSummary::Run)
        }
        Command::Evaluate(evaluate) => {
            Span::current().record("command", field::display("evaluate"));
            evaluate_command(&evaluate).map(ExecutionSummary::Evaluate)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(
        network = field::Empty,
        scenarios = command.scenarios,
        executions = command.executions.get(),
        seed = command.seed,
    ),
)]
pub(super) fn run_command(command: &RunCommand) -> Result<RunSummary, CliError> {
    let aggregator = command.strategy.aggregator()?;
    let network = ReferenceNetworkId::from(command.network).network();
    Span::current().record("network", field::display(network.name()));

    let graph = network.graph()?;
    let plan = aggregator.plan(&graph)?;
    let values = random_leaf_values(&graph, command.scenarios, command.seed);

    let mut first = None;
    let started = Instant::now();
    for _ in 0..command.executions.get() {
        let out = aggregator.aggregate_with_plan(&plan, &values)?;
        if first.is_none() {
            first = Some(out);
        }
    }
    let total = started.elapsed();
    let average = total / command.executions.get();

    let out = first.unwrap_or_else(|| values.clone());
    check_leaves(&graph, &values, &out)?;

    let summary = RunSummary {
        network: network.name().to_owned(),
        scenarios: command.scenarios,
        executions: command.executions.get(),
        total,
        average,
        budget: command.budget_micros.map(Duration::from_micros),
        node_means: (0..out.columns())
            .map(|node| out.column_mean(node).unwrap_or(0.0))
            .collect(),
    };
    if summary.within_budget() == Some(false) {
        warn!(
            average_micros = summary.average.as_micros(),
            budget_micros = command.budget_micros,
            "average execution time exceeded the budget"
        );
    }
    info!(
        network = summary.network.as_str(),
        total_micros = summary.total.as_micros(),
        average_micros = summary.average.as_micros(),
        "run completed"
    );
    Ok(summary)
}

#[instrument(name = "cli.evaluate", err, skip(command), fields(path = %command.path.display()))]
pub(super) fn evaluate_command(command: &EvaluateCommand) -> Result<EvaluationSummary, CliError> {
    let aggregator = command.strategy.aggregator()?;
    let problem = load_problem(&command.path)?;
    let graph = Graph::from_adjacency(
        &problem.adjacency,
        problem.nodes_start.iter().copied(),
        problem.nodes_end.iter().copied(),
    )?;
    let values = if problem.values.is_empty() {
        ValueBatch::zeros(0, graph.node_count())
    } else {
        ValueBatch::from_rows(&problem.values)?
    };
    let out = aggregator.aggregate(&graph, &values)?;
    check_leaves(&graph, &values, &out)?;

    info!(
        nodes = graph.node_count(),
        scenarios = out.rows(),
        "evaluation completed"
    );
    Ok(EvaluationSummary {
        root: graph.root()?,
        rows: out.to_rows(),
    })
}

#[instrument(name = "cli.load_problem", err)]
pub(super) fn load_problem(path: &Path) -> Result<Problem, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub(super) fn check_leaves(
    graph: &Graph,
    values: &ValueBatch,
    out: &ValueBatch,
) -> Result<(), CliError> {
    match graph
        .leaves()
        .iter()
        .find(|&&leaf| values.column(leaf) != out.column(leaf))
    {
        Some(&node) => Err(CliError::LeafChanged { node }),
        None => Ok(()),
    }
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::io::Cursor;
/// # use treesum_cli::cli::{EvaluationSummary, ExecutionSummary, render_summary};
/// let summary = ExecutionSummary::Evaluate(EvaluationSummary {
///     root: 2,
///     rows: vec![vec![1.0, 2.0, 3.0]],
/// });
/// let mut buffer = Cursor::new(Vec::new());
/// render_summary(&summary, &mut buffer)?;
/// assert_eq!(buffer.into_inner(), b"root: 2\nscenarios: 1\n0\t1\t2\t3\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Run(run) => render_run(run, &mut writer),
        ExecutionSummary::Evaluate(evaluation) => render_evaluation(evaluation, &mut writer),
    }
}

fn render_run(run: &RunSummary, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "network: {}", run.network)?;
    writeln!(writer, "scenarios: {}", run.scenarios)?;
    writeln!(writer, "executions: {}", run.executions)?;
    writeln!(writer, "total: {:?}", run.total)?;
    writeln!(writer, "average: {:?}", run.average)?;
    match (run.budget, run.within_budget()) {
        (Some(budget), Some(true)) => writeln!(writer, "budget: met ({budget:?})")?,
        (Some(budget), _) => writeln!(writer, "budget: exceeded ({budget:?})")?,
        (None, _) => writeln!(writer, "budget: none")?,
    }
    writeln!(writer, "node means:")?;
    for (node, mean) in run.node_means.iter().enumerate() {
        writeln!(writer, "{node}\t{mean:.6}")?;
    }
    Ok(())
}

fn render_evaluation(evaluation: &EvaluationSummary, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "root: {}", evaluation.root)?;
    writeln!(writer, "scenarios: {}", evaluation.rows.len())?;
    for (index, row) in evaluation.rows.iter().enumerate() {
        write!(writer, "{index}")?;
        for value in row {
            write!(writer, "\t{value}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}
