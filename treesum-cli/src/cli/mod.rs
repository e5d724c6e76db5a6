//! Command-line interface orchestration for treesum.
//!
//! `run` times repeated aggregation of random scenarios over a bundled
//! reference network; `evaluate` aggregates the scenarios of a JSON problem
//! file.

mod commands;

pub use commands::{
    Cli, CliError, Command, EvaluateCommand, EvaluationSummary, ExecutionArg, ExecutionSummary,
    NetworkArg, Problem, RunCommand, RunSummary, StrategyArgs, TraversalArg, render_summary,
    run_cli,
};

#[cfg(test)]
mod tests;
