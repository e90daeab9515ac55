use crate::analysis::UnusedResource;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, unused: &[UnusedResource], total: usize) -> Result<()> {
        let json = self.render(unused, total)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write report: {}", path.display()))?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }

    pub fn render(&self, unused: &[UnusedResource], total: usize) -> Result<String> {
        let report = JsonReport::new(unused, total);
        serde_json::to_string_pretty(&report).into_diagnostic()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    total_resources: usize,
    unused_count: usize,
    unused: &'a [UnusedResource],
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonSummary {
    by_type: BTreeMap<&'static str, usize>,
    files: usize,
}

impl<'a> JsonReport<'a> {
    fn new(unused: &'a [UnusedResource], total: usize) -> Self {
        let mut by_type = BTreeMap::new();
        for item in unused {
            *by_type.entry(item.resource_type.name()).or_insert(0) += 1;
        }

        Self {
            version: "1.0",
            total_resources: total,
            unused_count: unused.len(),
            unused,
            summary: JsonSummary {
                by_type,
                files: unused.iter().map(|item| item.files.len()).sum(),
            },
        }
    }
}
