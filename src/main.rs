use anyhow::{Context, Result};
use clap::Parser;
use score_ledger::cli::{self, Args, Command, ScoreConfig};
use score_ledger::report::{self, ReportContext};
use score_ledger::session::{self, ScoreSession, ScoreStore, ScoreSubmission, SessionOptions};
use score_ledger::web::{self, AppState};
use std::io::Read;
use std::path::Path;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let mut config = ScoreConfig::discover(args.config.as_deref())?;
    if let Some(score_file) = args.score_file {
        config.score_file = score_file;
    }

    match args.command {
        Command::Run(run_args) => {
            let passed = run_session(&config, run_args)?;
            if !passed {
                std::process::exit(1);
            }
        }
        Command::Report(report_args) => {
            show_report(&config, report_args)?;
        }
        Command::Wipe => {
            wipe_scores(&config)?;
        }
        Command::Init(init_args) => {
            generate_sample_config(init_args)?;
        }
        Command::Ui(ui_args) => {
            start_ui_server(&config, ui_args).await?;
        }
    }

    Ok(())
}

/// Run one scoring session. Returns whether every score was accepted and
/// the test command (if any) succeeded.
fn run_session(config: &ScoreConfig, args: cli::RunArgs) -> Result<bool> {
    let options = SessionOptions {
        wipe: args.wipe,
        strict: args.strict || config.strict,
        history_length: config.history_length,
    };
    let mut session = ScoreSession::start(ScoreStore::new(&config.score_file), &options)?;

    let (submissions, command_ok) = collect_submissions(&args)?;
    info!("Collected {} scores", submissions.len());

    for submission in &submissions {
        // failures are kept on the session and reported below
        let _ = session.submit(submission);
    }

    let summary = session.finish()?;
    let view = summary.sheet.create_report_view();
    let context = ReportContext::for_session(&summary);

    colored::control::set_override(args.color);
    print!("{}", report::render_terminal(&view, args.color));
    for line in report::session_messages(&summary) {
        println!("{}", line);
    }

    if args.html || config.write_html {
        let path = report::save_html(&config.html_dir, &view, &context)?;
        println!("\nHTML report saved to: {:?}", path);
    }

    Ok(summary.passed() && command_ok)
}

fn collect_submissions(args: &cli::RunArgs) -> Result<(Vec<ScoreSubmission>, bool)> {
    if !args.command.is_empty() {
        let output = session::run_command(&args.command, Path::new("."))?;
        if !output.success {
            println!("Test command exited with {:?}", output.exit_code);
        }
        return Ok((output.submissions(), output.success));
    }

    let text = match args.input.as_deref() {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .context(format!("Failed to read scores from {:?}", path))?,
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read scores from stdin")?;
            text
        }
    };
    Ok((session::parse_submissions(&text, None), true))
}

fn show_report(config: &ScoreConfig, args: cli::ReportArgs) -> Result<()> {
    let store = ScoreStore::new(&config.score_file);
    let sheet = store.load(config.history_length);
    let view = sheet.create_report_view();
    let context = ReportContext::stored();

    if args.markdown {
        print!("{}", report::generate_report(&view, &context));
    } else {
        colored::control::set_override(args.color);
        print!("{}", report::render_terminal(&view, args.color));
    }

    if args.html {
        let path = report::save_html(&config.html_dir, &view, &context)?;
        println!("\nHTML report saved to: {:?}", path);
    }

    Ok(())
}

fn wipe_scores(config: &ScoreConfig) -> Result<()> {
    let store = ScoreStore::new(&config.score_file);
    if store.wipe()? {
        println!("Deleted score file: {:?}", store.path());
    } else {
        println!("No score file at: {:?}", store.path());
    }
    Ok(())
}

fn generate_sample_config(args: cli::InitArgs) -> Result<()> {
    let config = ScoreConfig::sample();

    config.save(&args.output)?;
    println!("Generated sample config at: {:?}", args.output);

    Ok(())
}

async fn start_ui_server(config: &ScoreConfig, args: cli::UiArgs) -> Result<()> {
    info!("Starting web UI server on port {}", args.port);
    info!("Score file: {:?}", config.score_file);

    println!("\nScore sheet UI: http://localhost:{}", args.port);
    println!("  /             - Score table");
    println!("  /api/scores   - Score table as JSON");
    println!("  /html         - Saved HTML report");
    println!("Press Ctrl+C to stop the server\n");

    let state = AppState::new(
        ScoreStore::new(&config.score_file),
        config.history_length,
        config.html_dir.clone(),
    );
    web::start_server(args.port, state).await?;

    Ok(())
}
