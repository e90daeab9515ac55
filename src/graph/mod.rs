//! Resource reference graph construction
//!
//! Walks resource directories, parses every resource file in parallel, and
//! records an edge for each reference a resource's content makes to another
//! resource. Edges are applied to the store sequentially once parsing is done.

mod references;
mod values;
mod web;

pub use references::{element_references, ReferenceTarget};
pub use values::{value_definitions, ValueDefinition};
pub use web::{tokenize_js, WebTokenizer};

use crate::error::{read_file, Result};
use crate::model::{ResourceId, ResourceType, ResourceUrl, ShrinkerModel, ANDROID_RES_URL};
use crate::parser::parse_xml;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A resource directory and the package its resources belong to
#[derive(Debug, Clone)]
pub struct ResourceDir {
    pub path: PathBuf,
    pub package: Option<String>,
}

/// One file found under a resource directory
#[derive(Debug, Clone)]
struct ResourceFile {
    path: PathBuf,
    package: Option<String>,
    /// `res/<folder>/<file>`, as stored in archives and resource tables
    archive_path: String,
    folder: String,
    file_name: String,
}

enum FileContent {
    /// Declarations of a values folder file
    Values(Vec<ValueDefinition>),
    /// References out of a file-backed XML resource
    Xml(Vec<ReferenceTarget>),
    /// Tokens of a raw web resource
    Web(Vec<String>),
    Opaque,
}

struct ParsedFile {
    file: ResourceFile,
    content: FileContent,
}

/// Builds reference edges from resource directory contents
pub struct ResourcesGraphBuilder {
    dirs: Vec<ResourceDir>,
    tokenizer: WebTokenizer,
}

impl ResourcesGraphBuilder {
    pub fn new(dirs: Vec<ResourceDir>) -> Self {
        Self {
            dirs,
            tokenizer: WebTokenizer::new(),
        }
    }

    pub fn build(&self, model: &mut ShrinkerModel) -> Result<()> {
        let files = self.collect_files();
        info!("Parsing {} resource files in parallel...", files.len());

        let parsed: Vec<Result<Option<ParsedFile>>> =
            files.into_par_iter().map(|file| self.parse_file(file)).collect();

        let mut edges = 0;
        for result in parsed {
            if let Some(parsed) = result? {
                edges += self.apply(parsed, model);
            }
        }
        info!("Recorded {} resource references", edges);
        Ok(())
    }

    fn collect_files(&self) -> Vec<ResourceFile> {
        let mut files = Vec::new();
        for dir in &self.dirs {
            if !dir.path.is_dir() {
                debug!("Resource directory {} does not exist, skipping", dir.path.display());
                continue;
            }
            for entry in WalkDir::new(&dir.path)
                .min_depth(2)
                .max_depth(2)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let path = entry.into_path();
                let folder = path
                    .parent()
                    .and_then(|p| p.file_name())
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let file_name = path
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_default();
                files.push(ResourceFile {
                    archive_path: format!("res/{}/{}", folder, file_name),
                    package: dir.package.clone(),
                    path,
                    folder,
                    file_name,
                });
            }
        }
        files
    }

    fn parse_file(&self, file: ResourceFile) -> Result<Option<ParsedFile>> {
        let extension = extension(&file.file_name);
        let is_values = file.folder == "values" || file.folder.starts_with("values-");
        let is_raw = ResourceType::from_folder(&file.folder) == Some(ResourceType::Raw);

        let content = if is_raw {
            if matches!(extension, "html" | "htm" | "css" | "js") {
                let bytes = read_file(&file.path)?;
                FileContent::Web(self.tokenizer.tokenize(extension, &String::from_utf8_lossy(&bytes)))
            } else {
                FileContent::Opaque
            }
        } else if extension == "xml" {
            let bytes = read_file(&file.path)?;
            match parse_xml(&file.path, &bytes) {
                Ok(root) if is_values => FileContent::Values(value_definitions(&root)),
                Ok(root) => FileContent::Xml(element_references(&root)),
                Err(e) => {
                    warn!("Skipping unparseable resource {}: {}", file.path.display(), e);
                    FileContent::Opaque
                }
            }
        } else if is_values {
            return Ok(None);
        } else {
            FileContent::Opaque
        };

        Ok(Some(ParsedFile { file, content }))
    }

    /// Apply one parsed file to the model; returns the number of edges added
    fn apply(&self, parsed: ParsedFile, model: &mut ShrinkerModel) -> usize {
        let ParsedFile { file, content } = parsed;
        let package = file.package.as_deref();
        let mut edges = 0;

        if let FileContent::Values(definitions) = content {
            for definition in definitions {
                let owners = model
                    .store
                    .find(package, definition.resource_type, &definition.name);
                edges += add_edges(model, package, &owners, &definition.references);
            }
            return edges;
        }

        let owners = self.file_owners(&file, model);
        if owners.is_empty() {
            debug!("No declared resource for {}", file.archive_path);
            return 0;
        }

        match content {
            FileContent::Xml(references) => {
                edges += add_edges(model, package, &owners, &references);
            }
            FileContent::Web(tokens) => {
                for token in tokens {
                    model.add_string_constant(&token);
                    if let Some(rest) = token.strip_prefix(ANDROID_RES_URL) {
                        model.set_found_web_content();
                        if let Some(url) = ResourceUrl::parse(&format!("@{}", rest)) {
                            edges += add_edges(model, package, &owners, &[ReferenceTarget::Url(url)]);
                        }
                    }
                }
            }
            FileContent::Values(_) | FileContent::Opaque => {}
        }
        edges
    }

    /// Resources backed by a file: by recorded path, otherwise by folder type and file name
    fn file_owners(&self, file: &ResourceFile, model: &mut ShrinkerModel) -> Vec<ResourceId> {
        let package = file.package.as_deref();
        let owners = model.store.find_by_path(package, &file.archive_path);
        if !owners.is_empty() {
            return owners;
        }
        let Some(resource_type) = ResourceType::from_folder(&file.folder) else {
            return Vec::new();
        };
        let owners = model
            .store
            .find(package, resource_type, resource_name(&file.file_name));
        for owner in &owners {
            model.store.add_file(*owner, &file.archive_path);
        }
        owners
    }
}

fn add_edges(
    model: &mut ShrinkerModel,
    package: Option<&str>,
    owners: &[ResourceId],
    references: &[ReferenceTarget],
) -> usize {
    let mut added = 0;
    for reference in references {
        let targets = match reference {
            ReferenceTarget::Id(id) => model.store.find_by_id(*id).into_iter().collect(),
            ReferenceTarget::Url(url) => {
                let from = url.package.as_deref().or(package);
                model.store.find_from(from, url.resource_type, &url.name)
            }
        };
        for owner in owners {
            for target in &targets {
                model.store.add_reference(*owner, *target);
                added += 1;
            }
        }
    }
    added
}

/// File name up to the first dot (`ic_launcher.9.png` -> `ic_launcher`)
pub fn resource_name(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

fn extension(file_name: &str) -> &str {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}
