mod args;
mod config;

pub use args::{Args, Command, InitArgs, ReportArgs, RunArgs, UiArgs};
pub use config::{ScoreConfig, DEFAULT_CONFIG_FILE};
