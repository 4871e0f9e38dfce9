use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SCORE-LEDGER: track scored test results across runs
///
/// Keeps a rolling history and an all-time best for every numeric score a
/// test reports, and flags regressions against the best.
#[derive(Parser, Debug)]
#[command(name = "score-ledger")]
#[command(version)]
#[command(about = "Track scored test results across runs")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the score file location
    #[arg(long, global = true)]
    pub score_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a scoring session
    Run(RunArgs),

    /// Show the stored score sheet
    Report(ReportArgs),

    /// Delete previous score results
    Wipe,

    /// Generate a sample config file
    Init(InitArgs),

    /// Serve the stored score sheet over HTTP
    Ui(UiArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Read scores as JSON lines from this file ("-" for stdin)
    #[arg(short, long, conflicts_with = "command")]
    pub input: Option<PathBuf>,

    /// Delete previous score results before the run
    #[arg(long)]
    pub wipe: bool,

    /// Disallow scores without a cutoff
    #[arg(long)]
    pub strict: bool,

    /// Also write the HTML report
    #[arg(long)]
    pub html: bool,

    /// Colour better/worse rows in the table
    #[arg(long)]
    pub color: bool,

    /// Test command whose `SCORE {json}` output lines are recorded
    #[arg(last = true)]
    pub command: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Write the HTML report
    #[arg(long)]
    pub html: bool,

    /// Print a markdown report instead of the table
    #[arg(long)]
    pub markdown: bool,

    /// Colour better/worse rows in the table
    #[arg(long)]
    pub color: bool,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output path for the config file
    #[arg(short, long, default_value = "score-ledger.yaml")]
    pub output: PathBuf,
}

#[derive(Parser, Debug)]
pub struct UiArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_command() {
        let args = Args::parse_from([
            "score-ledger",
            "run",
            "--wipe",
            "--",
            "cargo",
            "test",
            "--release",
        ]);
        match args.command {
            Command::Run(run) => {
                assert!(run.wipe);
                assert!(!run.strict);
                assert_eq!(run.command, vec!["cargo", "test", "--release"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_score_file() {
        let args = Args::parse_from(["score-ledger", "report", "--score-file", "x.json"]);
        assert_eq!(args.score_file, Some(PathBuf::from("x.json")));
    }

    #[test]
    fn test_input_conflicts_with_command() {
        let res = Args::try_parse_from(["score-ledger", "run", "--input", "s.jsonl", "--", "true"]);
        assert!(res.is_err());
    }
}
