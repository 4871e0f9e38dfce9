//! Runs a test command and collects the scores it prints

use super::submission::{parse_submissions, ScoreSubmission, SCORE_LINE_PREFIX};
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Captured result of a test command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the command itself exited successfully
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Scores printed as `SCORE {json}` lines on stdout or stderr
    pub fn submissions(&self) -> Vec<ScoreSubmission> {
        let mut subs = parse_submissions(&self.stdout, Some(SCORE_LINE_PREFIX));
        subs.extend(parse_submissions(&self.stderr, Some(SCORE_LINE_PREFIX)));
        subs
    }
}

/// Run `command` in `dir` and capture its output
pub fn run_command(command: &[String], dir: &Path) -> Result<CommandOutput> {
    let Some((program, args)) = command.split_first() else {
        bail!("No command given");
    };

    info!("Running: {} {:?} in {:?}", program, args, dir);

    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .context(format!("Failed to run {}", program))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    debug!("Command output:\n{}\n{}", stdout, stderr);

    Ok(CommandOutput {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submissions_from_both_streams() {
        let output = CommandOutput {
            success: true,
            exit_code: Some(0),
            stdout: "SCORE {\"test\": \"a\", \"value\": 1}\nnoise\n".to_string(),
            stderr: "SCORE {\"test\": \"b\", \"value\": 2, \"tag\": \"x\"}\n".to_string(),
        };
        let subs = output.submissions();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].test, "a");
        assert_eq!(subs[1].tag, "x");
    }

    #[test]
    fn test_empty_command_fails() {
        assert!(run_command(&[], Path::new(".")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_echo() {
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo 'SCORE {\"test\": \"t\", \"value\": 4.5}'".to_string(),
        ];
        let output = run_command(&command, Path::new(".")).unwrap();
        assert!(output.success);
        assert_eq!(output.submissions()[0].value, 4.5);
    }
}
