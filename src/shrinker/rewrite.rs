// Archive rewriting
//
// Entries are streamed from the input archive into a temporary file next to
// the output, which is moved into place only once the archive is complete.
// Untouched entries are copied raw, without recompression.

use super::dummy::{placeholder_for, LinkedResourcesFormat};
use crate::error::{Result, ShrinkError};
use crate::model::ResourceStore;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Counts of what a rewrite did to the archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub entries: usize,
    pub replaced: usize,
    pub removed: usize,
}

/// Whether the resources backed by each archive path are reachable
struct BackingFiles {
    by_path: HashMap<String, Vec<(Option<String>, bool)>>,
}

impl BackingFiles {
    fn new(store: &ResourceStore) -> Self {
        let mut by_path: HashMap<String, Vec<(Option<String>, bool)>> = HashMap::new();
        for (_, resource) in store.resources() {
            for file in &resource.files {
                by_path
                    .entry(file.clone())
                    .or_default()
                    .push((resource.package.clone(), resource.is_reachable()));
            }
        }
        Self { by_path }
    }

    /// A path is unused only if every resource of `package` backed by it is unreachable
    fn is_unused(&self, package: Option<&str>, path: &str) -> bool {
        let Some(owners) = self.by_path.get(path) else {
            return false;
        };
        let mut owners = owners
            .iter()
            .filter(|(owner, _)| package.is_none() || owner.is_none() || owner.as_deref() == package)
            .peekable();
        owners.peek().is_some() && owners.all(|(_, reachable)| !reachable)
    }
}

/// Rewrites archives, replacing or dropping entries of unreachable resources
pub struct ArchiveRewriter {
    files: BackingFiles,
    precise: bool,
}

impl ArchiveRewriter {
    /// `precise` removes unused entries instead of replacing their content
    pub fn new(store: &ResourceStore, precise: bool) -> Self {
        Self {
            files: BackingFiles::new(store),
            precise,
        }
    }

    /// Rewrite an APK; entry names are archive paths (`res/drawable/icon.png`)
    pub fn rewrite_apk(
        &self,
        input: &Path,
        output: &Path,
        format: LinkedResourcesFormat,
    ) -> Result<RewriteStats> {
        self.rewrite(input, output, format, |name| {
            name.starts_with("res/") && self.files.is_unused(None, name)
        })
    }

    /// Rewrite an app bundle; the first path segment of each entry names a module
    /// whose package is looked up in `module_packages`
    pub fn rewrite_bundle(
        &self,
        input: &Path,
        output: &Path,
        module_packages: &HashMap<String, String>,
    ) -> Result<RewriteStats> {
        self.rewrite(input, output, LinkedResourcesFormat::Proto, |name| {
            let Some((module, path)) = name.split_once('/') else {
                return false;
            };
            if !path.starts_with("res/") {
                return false;
            }
            let package = module_packages.get(module).map(String::as_str);
            if package.is_none() {
                debug!("No package configured for bundle module {}", module);
            }
            self.files.is_unused(package, path)
        })
    }

    fn rewrite(
        &self,
        input: &Path,
        output: &Path,
        format: LinkedResourcesFormat,
        is_unused: impl Fn(&str) -> bool,
    ) -> Result<RewriteStats> {
        let file = File::open(input).map_err(|e| ShrinkError::io(input, e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| ShrinkError::archive(input, e))?;

        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(|e| ShrinkError::io(dir, e))?;
        let mut stats = RewriteStats::default();

        {
            let mut writer = ZipWriter::new(temp.as_file_mut());
            for index in 0..archive.len() {
                let entry = archive
                    .by_index_raw(index)
                    .map_err(|e| ShrinkError::archive(input, e))?;
                stats.entries += 1;
                let name = entry.name().to_string();

                if entry.is_dir() || !is_unused(&name) {
                    writer
                        .raw_copy_file(entry)
                        .map_err(|e| ShrinkError::archive(output, e))?;
                    continue;
                }

                if self.precise {
                    debug!("Removing {}", name);
                    stats.removed += 1;
                    continue;
                }

                debug!("Replacing {}", name);
                let method = match entry.compression() {
                    CompressionMethod::Stored => CompressionMethod::Stored,
                    _ => CompressionMethod::Deflated,
                };
                let options = SimpleFileOptions::default().compression_method(method);
                writer
                    .start_file(name.as_str(), options)
                    .map_err(|e| ShrinkError::archive(output, e))?;
                writer
                    .write_all(placeholder_for(&name, format))
                    .map_err(|e| ShrinkError::io(output, e))?;
                stats.replaced += 1;
            }
            writer.finish().map_err(|e| ShrinkError::archive(output, e))?;
        }

        temp.persist(output)
            .map_err(|e| ShrinkError::io(output, e.error))?;
        info!(
            "Wrote {} ({} entries, {} replaced, {} removed)",
            output.display(),
            stats.entries,
            stats.replaced,
            stats.removed
        );
        Ok(stats)
    }
}
