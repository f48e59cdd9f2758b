//! Output artifacts of the preparation jobs.
//!
//! Every file is written once, at the end of a job, through a temp file that
//! is renamed into place, so a failed run never leaves a partial artifact.
//! Jobs with several artifacts stage them all before committing any.

mod atomic;
mod error;
mod writers;

pub use atomic::{StagedFile, commit_all, stage_atomic, write_atomic};
pub use error::{OutputError, Result};
pub use writers::{stage_csv, stage_json, write_csv, write_json};
