//! Web UI module for SCORE-LEDGER
//!
//! Serves the stored score sheet read-only:
//! 1. `/` - the score table as HTML
//! 2. `/api/scores`, `/api/score` - the same data as JSON

mod handlers;
mod server;
mod state;

pub use server::{router, start_server};
pub use state::{AppState, LoadedSheet};
