// Text symbol table (R.txt) gatherer

use crate::error::{Result, ShrinkError};
use crate::model::{Resource, ResourceStore, ResourceType};
use std::path::Path;
use tracing::debug;

/// Parse `R.txt` lines and add every declared resource to the store
///
/// `int styleable <name> <index>` lines hold attribute indexes rather than
/// resource IDs and are skipped; the styleable itself comes from its
/// `int[] styleable` line.
pub fn gather_symbols(path: &Path, contents: &str, package: &str, store: &mut ResourceStore) -> Result<usize> {
    let mut added = 0;
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = |message: &str| ShrinkError::table(path, format!("line {}: {}", line_no + 1, message));

        let mut parts = line.splitn(4, char::is_whitespace);
        let (Some(kind), Some(type_name), Some(name), Some(value)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed("expected `<int|int[]> <type> <name> <value>`"));
        };

        let Some(resource_type) = ResourceType::from_name(type_name) else {
            debug!("Skipping symbol of unsupported type {}", type_name);
            continue;
        };

        match kind {
            "int[]" => {
                store.add_resource(Resource::new(Some(package), resource_type, name, None));
            }
            "int" if resource_type == ResourceType::Styleable => continue,
            "int" => {
                let id = parse_id(value.trim()).ok_or_else(|| malformed("invalid resource ID"))?;
                store.add_resource(Resource::new(Some(package), resource_type, name, Some(id)));
            }
            other => return Err(malformed(&format!("unknown symbol kind `{}`", other))),
        }
        added += 1;
    }
    debug!("Gathered {} symbols from {}", added, path.display());
    Ok(added)
}

fn parse_id(value: &str) -> Option<u32> {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}
