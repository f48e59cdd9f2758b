use std::path::PathBuf;

use shd_transform::{CorrelationSummary, IndicatorSummary, JoinStep, SubsetReport};

/// One file a job produced (or would have, on a dry run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    pub path: PathBuf,
    /// Row and column counts; `None` for JSON audits.
    pub shape: Option<(usize, usize)>,
    pub written: bool,
}

/// What one job did.
#[derive(Debug, Clone, Default)]
pub struct JobResult {
    pub job: &'static str,
    pub outputs: Vec<OutputSummary>,
    /// Cells set to missing because they failed to parse.
    pub parse_failures: usize,
    pub joins: Vec<JoinStep>,
    pub subset: Option<SubsetReport>,
    pub correlations: Vec<CorrelationSummary>,
    pub indicators: Vec<IndicatorSummary>,
}

impl JobResult {
    pub fn new(job: &'static str) -> Self {
        Self {
            job,
            ..Self::default()
        }
    }
}
