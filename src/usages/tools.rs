// tools:keep / tools:discard / tools:shrinkMode recorder

use crate::error::{read_file, Result};
use crate::model::{ResourcePattern, ShrinkerModel};
use crate::parser::{parse_xml, TOOLS_NS};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Collect keep and discard directives from every XML file under `dir`
pub fn record_tools_attributes(dir: &Path, model: &mut ShrinkerModel) -> Result<()> {
    if !dir.is_dir() {
        debug!("Keep directory {} does not exist, skipping", dir.display());
        return Ok(());
    }

    let files = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("xml"));

    for entry in files {
        let bytes = read_file(entry.path())?;
        let root = parse_xml(entry.path(), &bytes)?;
        let (mut keep, mut discard) = (0, 0);

        if let Some(attr) = root.attribute(Some(TOOLS_NS), "keep") {
            for pattern in ResourcePattern::parse_list(&attr.value) {
                model.store.add_keep(pattern);
                keep += 1;
            }
        }
        if let Some(attr) = root.attribute(Some(TOOLS_NS), "discard") {
            for pattern in ResourcePattern::parse_list(&attr.value) {
                model.store.add_discard(pattern);
                discard += 1;
            }
        }
        if let Some(attr) = root.attribute(Some(TOOLS_NS), "shrinkMode") {
            let strict = attr.value.trim() == "strict";
            model.store.set_safe_mode(!strict);
            info!(
                "Shrink mode {} set by {}",
                if strict { "strict" } else { "safe" },
                entry.path().display()
            );
        }

        if keep + discard > 0 {
            debug!(
                "{}: {} keep, {} discard directives",
                entry.path().display(),
                keep,
                discard
            );
        }
    }
    Ok(())
}
