// Compiled code usage recorder (dex and smali)

use crate::error::{read_file, read_text, Result, ShrinkError};
use crate::model::{ResourceType, ShrinkerModel};
use crate::parser::{code, CodeScan};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Expand configured code paths into dex and smali files; missing paths are skipped
pub fn collect_code_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .map(|e| e.into_path())
                    .filter(|p| is_code_file(p)),
            );
        } else {
            debug!("Code input {} does not exist, skipping", path.display());
        }
    }
    files
}

fn is_code_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("dex") | Some("smali")
    )
}

/// Scan one code file, choosing the reader by extension
pub fn scan_code_file(path: &Path) -> Result<CodeScan> {
    if path.extension().and_then(|e| e.to_str()) == Some("smali") {
        let text = read_text(path)?;
        return code::scan_smali(&text).map_err(|e| ShrinkError::smali(path, e));
    }
    let bytes = read_file(path)?;
    code::scan_dex(&bytes).map_err(|e| ShrinkError::dex(path, e))
}

/// Parse every code file in parallel and apply the merged scan to the model
pub fn record_code(paths: &[PathBuf], model: &mut ShrinkerModel) -> Result<()> {
    let files = collect_code_files(paths);
    info!("Scanning {} code files...", files.len());

    let scans: Vec<Result<CodeScan>> = files.par_iter().map(|f| scan_code_file(f)).collect();
    let mut merged = CodeScan::default();
    for scan in scans {
        merged.merge(scan?);
    }

    apply_scan(&merged, model);
    Ok(())
}

/// Mark resources found by a code scan and pool its string constants
pub fn apply_scan(scan: &CodeScan, model: &mut ShrinkerModel) {
    let mut marked = 0;
    for value in &scan.int_constants {
        if model.mark_id(*value) {
            marked += 1;
        }
    }

    for field in &scan.field_refs {
        let class = model.mapping.deobfuscate_class(&field.class).to_string();
        let Some((package, resource_type)) = resource_class_type(&class) else {
            continue;
        };
        let name = model.mapping.deobfuscate_field(&field.class, &field.name).to_string();
        for id in model.store.find_from(package, resource_type, &name) {
            if model.store.mark_reachable(id) {
                marked += 1;
            }
        }
    }

    for value in &scan.string_constants {
        model.add_string_constant(value);
    }
    if scan.calls_get_identifier {
        model.set_found_get_identifier();
    }
    if scan.loads_web_content {
        model.set_found_web_content();
    }

    debug!(
        "Code scan marked {} resources, pooled {} strings",
        marked,
        scan.string_constants.len()
    );
}

/// `com.example.R$layout` -> (`com.example`, layout)
fn resource_class_type(class: &str) -> Option<(Option<&str>, ResourceType)> {
    let (owner, type_name) = class.rsplit_once('$')?;
    let (package, simple) = match owner.rsplit_once('.') {
        Some((package, simple)) => (Some(package), simple),
        None => (None, owner),
    };
    if simple != "R" {
        return None;
    }
    Some((package, ResourceType::from_name(type_name)?))
}
