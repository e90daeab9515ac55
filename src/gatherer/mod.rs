//! Resource gatherers
//!
//! A gatherer declares resources from one package's resource table. Several
//! gatherers may feed the same store; ID references between their tables are
//! linked once all of them have run.

mod symbols;
mod table;

pub use symbols::gather_symbols;
pub use table::gather_table;

use crate::error::{read_file, read_text, Result};
use crate::model::ShrinkerModel;
use std::path::PathBuf;
use tracing::info;

/// One source of resource declarations
#[derive(Debug, Clone)]
pub enum ResourceGatherer {
    /// Compiled `resources.arsc`, possibly holding several packages
    Table { path: PathBuf },
    /// `R.txt` symbol list for a single package
    Symbols { path: PathBuf, package: String },
}

impl ResourceGatherer {
    pub fn gather(&self, model: &mut ShrinkerModel) -> Result<()> {
        let added = match self {
            ResourceGatherer::Table { path } => {
                let bytes = read_file(path)?;
                gather_table(path, &bytes, &mut model.store)?
            }
            ResourceGatherer::Symbols { path, package } => {
                let contents = read_text(path)?;
                gather_symbols(path, &contents, package, &mut model.store)?
            }
        };
        info!("Gathered {} resources from {}", added, self.path().display());
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            ResourceGatherer::Table { path } | ResourceGatherer::Symbols { path, .. } => path,
        }
    }
}
