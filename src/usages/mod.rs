//! Usage recorders
//!
//! Each recorder seeds reachability from one kind of input. Recorders only
//! ever mark resources reachable or append keep/discard directives, so the
//! order in which they run does not change the result.

mod code;
mod manifest;
mod tools;
mod web;

pub use code::{apply_scan, collect_code_files, record_code, scan_code_file};
pub use manifest::record_manifest;
pub use tools::record_tools_attributes;
pub use web::WebContentScanner;

use crate::error::Result;
use crate::model::ShrinkerModel;
use std::path::PathBuf;

/// One configured source of resource usages
#[derive(Debug, Clone)]
pub enum UsageRecorder {
    /// Dex files, smali files, or directories of either
    Code { paths: Vec<PathBuf> },
    /// Text or compiled manifest; `package` resolves unqualified references in multi-package mode
    Manifest { path: PathBuf, package: Option<String> },
    /// Directory holding keep/discard directive files
    ToolsAttribute { dir: PathBuf },
    /// Directories of web assets scanned for resource URLs
    WebContent { dirs: Vec<PathBuf> },
}

impl UsageRecorder {
    pub fn record(&self, model: &mut ShrinkerModel) -> Result<()> {
        match self {
            UsageRecorder::Code { paths } => record_code(paths, model),
            UsageRecorder::Manifest { path, package } => record_manifest(path, package.as_deref(), model),
            UsageRecorder::ToolsAttribute { dir } => record_tools_attributes(dir, model),
            UsageRecorder::WebContent { dirs } => WebContentScanner::new().record(dirs, model),
        }
    }

    /// Whether this recorder is a code or manifest source with at least one existing input
    pub fn has_entry_point_input(&self) -> bool {
        match self {
            UsageRecorder::Code { paths } => paths.iter().any(|p| p.exists()),
            UsageRecorder::Manifest { path, .. } => path.exists(),
            UsageRecorder::ToolsAttribute { .. } | UsageRecorder::WebContent { .. } => false,
        }
    }

    /// Whether this recorder reads code or a manifest
    pub fn is_entry_point_source(&self) -> bool {
        matches!(self, UsageRecorder::Code { .. } | UsageRecorder::Manifest { .. })
    }
}
