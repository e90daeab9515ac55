mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::analysis::UnusedResource;
use miette::Result;
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Reporter for unreachable resources
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self { format, output_path }
    }

    /// `safe_mode` notes whether dynamic lookups were guessed at
    pub fn report(&self, unused: &[UnusedResource], total: usize, safe_mode: bool) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => TerminalReporter::new(safe_mode).report(unused, total),
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).report(unused, total),
        }
    }
}
