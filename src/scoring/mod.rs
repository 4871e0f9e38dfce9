//! Score ledger core: comparison policy, per-key results and the sheet
//! holding all of them.

mod evaluator;
mod result;
mod sheet;

pub use evaluator::{Evaluator, ScoreState};
pub use result::{ScoreResult, DEFAULT_HISTORY_LENGTH};
pub use sheet::{EvaluatorChanged, ReportRow, ReportView, ScoreSheet, REPORT_HEADER};
