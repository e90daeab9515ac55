use crate::config::ModuleConfig;
use crate::model::ResourceType;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Kind of shrinker input recognized by file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    ResourceTable,
    Symbols,
    Manifest,
    Dex,
    Smali,
    Mapping,
}

impl InputKind {
    /// Determine input kind from path
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        match file_name {
            "resources.arsc" => return Some(InputKind::ResourceTable),
            "R.txt" => return Some(InputKind::Symbols),
            "AndroidManifest.xml" => return Some(InputKind::Manifest),
            "mapping.txt" => return Some(InputKind::Mapping),
            _ => {}
        }
        match path.extension()?.to_str()? {
            "dex" => Some(InputKind::Dex),
            "smali" => Some(InputKind::Smali),
            _ => None,
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, InputKind::Dex | InputKind::Smali)
    }
}

/// A discovered input file
#[derive(Debug, Clone)]
pub struct InputFile {
    pub path: PathBuf,
    pub kind: InputKind,
}

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &[".git", ".gradle", ".idea", "node_modules"];

/// Finds shrinker inputs in an unpacked APK or a built module directory
pub struct InputFinder {
    max_depth: usize,
}

impl InputFinder {
    pub fn new() -> Self {
        Self { max_depth: 8 }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Find all recognized input files under the given roots
    pub fn find_files(&self, roots: &[PathBuf]) -> Vec<InputFile> {
        let mut files: Vec<InputFile> = roots
            .par_iter()
            .flat_map(|root| self.scan_directory(root))
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        debug!("Found {} input files", files.len());
        files
    }

    fn scan_directory(&self, dir: &Path) -> Vec<InputFile> {
        if !dir.exists() {
            trace!("Directory does not exist: {}", dir.display());
            return Vec::new();
        }

        WalkDir::new(dir)
            .max_depth(self.max_depth)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                !(e.file_type().is_dir()
                    && e.file_name()
                        .to_str()
                        .is_some_and(|name| SKIPPED_DIRS.contains(&name)))
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let kind = InputKind::from_path(e.path())?;
                trace!("Found {:?}: {}", kind, e.path().display());
                Some(InputFile {
                    path: e.into_path(),
                    kind,
                })
            })
            .collect()
    }

    /// Resource directories: directories named `res` holding typed folders
    pub fn find_resource_dirs(&self, root: &Path) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = WalkDir::new(root)
            .max_depth(self.max_depth)
            .into_iter()
            .filter_entry(|e| {
                e.file_name()
                    .to_str()
                    .map_or(true, |name| !SKIPPED_DIRS.contains(&name))
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir() && e.file_name() == "res")
            .map(|e| e.into_path())
            .filter(|p| has_resource_folders(p))
            .collect();
        dirs.sort();
        dirs
    }

    /// Describe a single module from the files found under `root`
    pub fn discover_module(&self, root: &Path) -> ModuleConfig {
        let files = self.find_files(&[root.to_path_buf()]);
        let first = |kind: InputKind| {
            files
                .iter()
                .filter(|f| f.kind == kind)
                .min_by_key(|f| f.path.components().count())
                .map(|f| f.path.clone())
        };

        let module = ModuleConfig {
            name: "base".to_string(),
            package: None,
            resource_table: first(InputKind::ResourceTable),
            symbols: first(InputKind::Symbols),
            resources: self.find_resource_dirs(root),
            manifest: first(InputKind::Manifest),
            code: files
                .iter()
                .filter(|f| f.kind.is_code())
                .map(|f| f.path.clone())
                .collect(),
            keep_dir: None,
        };
        let stats = InputStats::from_files(&files);
        debug!(
            "Discovered {} dex and {} smali files, {} resource directories",
            stats.dex_files,
            stats.smali_files,
            module.resources.len()
        );
        module
    }
}

impl Default for InputFinder {
    fn default() -> Self {
        Self::new()
    }
}

fn has_resource_folders(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|e| {
                let name = e.file_name();
                let name = name.to_string_lossy();
                e.path().is_dir()
                    && (name == "values"
                        || name.starts_with("values-")
                        || ResourceType::from_folder(&name).is_some())
            })
        })
        .unwrap_or(false)
}

/// Statistics about discovered inputs
#[derive(Debug, Default)]
pub struct InputStats {
    pub resource_tables: usize,
    pub symbol_files: usize,
    pub manifests: usize,
    pub dex_files: usize,
    pub smali_files: usize,
}

impl InputStats {
    pub fn from_files(files: &[InputFile]) -> Self {
        let mut stats = Self::default();
        for file in files {
            match file.kind {
                InputKind::ResourceTable => stats.resource_tables += 1,
                InputKind::Symbols => stats.symbol_files += 1,
                InputKind::Manifest => stats.manifests += 1,
                InputKind::Dex => stats.dex_files += 1,
                InputKind::Smali => stats.smali_files += 1,
                InputKind::Mapping => {}
            }
        }
        stats
    }
}
