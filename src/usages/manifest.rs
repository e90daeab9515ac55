// AndroidManifest.xml usage recorder

use crate::error::{read_file, Result};
use crate::model::{ResourceUrl, ShrinkerModel};
use crate::parser::parse_xml;
use std::path::Path;
use tracing::debug;

/// Mark every resource the manifest references
///
/// Compiled manifests carry resolved IDs on reference attributes; text
/// manifests are matched by their `@type/name` values.
pub fn record_manifest(path: &Path, package: Option<&str>, model: &mut ShrinkerModel) -> Result<()> {
    if !path.exists() {
        debug!("Manifest {} does not exist, skipping", path.display());
        return Ok(());
    }
    let bytes = read_file(path)?;
    let root = parse_xml(path, &bytes)?;

    // The manifest's own package attribute names the module when configuration does not
    let declared = root.attribute(None, "package").map(|a| a.value.clone());
    let package = package.map(str::to_string).or(declared);

    let mut references = 0;
    for element in root.descendants() {
        for attr in &element.attributes {
            if let Some(id) = attr.reference {
                model.mark_id(id);
                references += 1;
            } else if let Some(url) = ResourceUrl::parse(&attr.value) {
                model.mark_url_from(package.as_deref(), &url);
                references += 1;
            }
        }
    }

    debug!("Manifest {}: {} resource references", path.display(), references);
    Ok(())
}
