use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The verletpp developers",
    version,
    about = "verlet - benchmark and verify cell-list Verlet neighbor lists on synthetic periodic systems.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build neighbor lists over a drifting random system and report rebuilds and timings.
    Bench(BenchArgs),
    /// Compare the neighbor lists of a random system against an exhaustive search.
    Verify(VerifyArgs),
}

/// Options describing the synthetic system, shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct SystemArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of atoms in the asymmetric unit.
    #[arg(short = 'n', long, value_name = "INT")]
    pub atoms: Option<usize>,

    /// Use a cubic cell with this edge length, overriding the configured cell.
    #[arg(short, long, value_name = "ANGSTROM")]
    pub edge: Option<f64>,

    /// Interaction cutoff.
    #[arg(long, value_name = "ANGSTROM")]
    pub cutoff: Option<f64>,

    /// Buffer added to the cutoff.
    #[arg(short, long, value_name = "ANGSTROM")]
    pub buffer: Option<f64>,

    /// Space group of the cell (P1, P-1, P21, P212121).
    #[arg(short = 'g', long, value_name = "NAME")]
    pub space_group: Option<String>,

    /// Seed of the random number generator.
    #[arg(short, long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Treat the atoms as a linear chain and exclude 1-2 and 1-3 partners.
    #[arg(long)]
    pub chain: bool,
}

/// Arguments for the `bench` subcommand.
#[derive(Args, Debug)]
pub struct BenchArgs {
    #[command(flatten)]
    pub system: SystemArgs,

    /// Number of steps to simulate.
    #[arg(long, value_name = "INT")]
    pub steps: Option<usize>,

    /// Largest random displacement per axis and step.
    #[arg(long, value_name = "ANGSTROM")]
    pub drift: Option<f64>,
}

/// Arguments for the `verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub system: SystemArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bench_with_global_flags() {
        let cli = Cli::try_parse_from([
            "verlet", "-vv", "-j", "4", "bench", "--atoms", "200", "--edge", "35", "--steps",
            "10", "--chain",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, Some(4));
        match cli.command {
            Commands::Bench(args) => {
                assert_eq!(args.system.atoms, Some(200));
                assert_eq!(args.system.edge, Some(35.0));
                assert_eq!(args.steps, Some(10));
                assert!(args.system.chain);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["verlet", "-q", "-v", "verify"]).is_err());
    }
}
