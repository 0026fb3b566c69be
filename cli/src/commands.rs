//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for the simulate command
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable round summary
    #[default]
    Summary,
    /// The whole report as JSON
    Json,
}

/// Planning poker voting rounds
#[derive(Parser, Debug)]
#[command(name = "planning-poker")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:
  planning-poker simulate --participants 4 --votes 3,5,5,8
  planning-poker simulate --participants 6 --votes 5,8,? --auto-reveal --output json
  planning-poker show-config")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one scripted voting round through the in-memory adapters
    Simulate(SimulateArgs),
    /// Show configuration file locations and the merged configuration
    ShowConfig,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Participants joining besides the moderator
    #[arg(short, long, default_value_t = 4)]
    pub participants: usize,

    /// Estimates handed out to voters in turn, moderator first
    #[arg(long, value_delimiter = ',', default_value = "3,5,5,8")]
    pub votes: Vec<String>,

    /// Reveal as soon as every eligible voter has voted
    #[arg(long)]
    pub auto_reveal: bool,

    /// Title of the simulated story
    #[arg(long, default_value = "Simulated story")]
    pub story: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    pub output: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from([
            "planning-poker",
            "-vv",
            "simulate",
            "--participants",
            "3",
            "--votes",
            "3,5,?",
            "--auto-reveal",
            "--output",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.participants, 3);
        assert_eq!(args.votes, vec!["3", "5", "?"]);
        assert!(args.auto_reveal);
        assert!(matches!(args.output, OutputFormat::Json));
    }

    #[test]
    fn test_simulate_defaults() {
        let cli = Cli::try_parse_from(["planning-poker", "simulate"]).unwrap();
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.participants, 4);
        assert_eq!(args.votes.len(), 4);
        assert!(!args.auto_reveal);
        assert!(matches!(args.output, OutputFormat::Summary));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["planning-poker", "show-config", "--no-config"]).unwrap();
        assert!(cli.no_config);
        assert!(matches!(cli.command, Command::ShowConfig));
    }
}
