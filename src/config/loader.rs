use crate::error::ShrinkError;
use crate::gatherer::ResourceGatherer;
use crate::graph::ResourceDir;
use crate::proguard::ProguardMappingsRecorder;
use crate::shrinker::{LinkedResourcesFormat, ResourceShrinker};
use crate::usages::UsageRecorder;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration for a shrinking run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShrinkConfig {
    /// Modules whose resources are shrunk together
    pub modules: Vec<ModuleConfig>,

    /// ProGuard/R8 mapping.txt for obfuscated code
    pub mapping: Option<PathBuf>,

    /// Scan web assets for resource URLs
    pub web_content: bool,

    /// Directories of web assets (html, css, js)
    pub web_content_dirs: Vec<PathBuf>,

    /// Remove unused entries instead of replacing them with placeholders
    pub precise_shrinking: bool,

    /// Qualify resources by package so several modules can be shrunk at once
    pub support_multipackages: bool,

    /// Archive to rewrite
    pub archive: ArchiveConfig,
}

/// Inputs of one app or feature module
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Module name as it appears in bundles (`base`, `feature`)
    pub name: String,

    /// Package name; required with a symbol file
    pub package: Option<String>,

    /// Compiled resources.arsc
    pub resource_table: Option<PathBuf>,

    /// R.txt symbol list
    pub symbols: Option<PathBuf>,

    /// Resource directories (`res/`)
    pub resources: Vec<PathBuf>,

    /// AndroidManifest.xml, text or compiled
    pub manifest: Option<PathBuf>,

    /// Dex files, smali files, or directories of either
    pub code: Vec<PathBuf>,

    /// Directory of keep/discard directive files
    pub keep_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: ArchiveFormat,
    pub linked_format: LinkedFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    #[default]
    Apk,
    Bundle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkedFormat {
    #[default]
    Binary,
    Proto,
}

impl From<LinkedFormat> for LinkedResourcesFormat {
    fn from(format: LinkedFormat) -> Self {
        match format {
            LinkedFormat::Binary => LinkedResourcesFormat::Binary,
            LinkedFormat::Proto => LinkedResourcesFormat::Proto,
        }
    }
}

impl ShrinkConfig {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let mut config: Self = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config")?,
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config")?,
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    config
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")?
                }
            }
        };

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Option<Self>> {
        let default_names = [
            ".resshrink.yml",
            ".resshrink.yaml",
            ".resshrink.toml",
            "resshrink.yml",
            "resshrink.yaml",
            "resshrink.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path).map(Some);
            }
        }

        Ok(None)
    }

    /// Make every relative path relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        for module in &mut self.modules {
            module.resource_table.iter_mut().for_each(resolve);
            module.symbols.iter_mut().for_each(resolve);
            module.resources.iter_mut().for_each(resolve);
            module.manifest.iter_mut().for_each(resolve);
            module.code.iter_mut().for_each(resolve);
            module.keep_dir.iter_mut().for_each(resolve);
        }
        self.mapping.iter_mut().for_each(resolve);
        self.web_content_dirs.iter_mut().for_each(resolve);
        self.archive.input.iter_mut().for_each(resolve);
        self.archive.output.iter_mut().for_each(resolve);
    }

    /// Bundle module name -> package name
    pub fn module_packages(&self) -> HashMap<String, String> {
        self.modules
            .iter()
            .filter_map(|m| Some((m.name.clone(), m.package.clone()?)))
            .collect()
    }

    /// Assemble the gatherers, recorders and resource directories of every module
    pub fn build_shrinker(&self) -> crate::error::Result<ResourceShrinker> {
        let mut shrinker = ResourceShrinker::new(self.support_multipackages)
            .with_precise_shrinking(self.precise_shrinking);
        let mut has_table = false;
        let mut code = Vec::new();

        for module in &self.modules {
            if let Some(path) = &module.resource_table {
                shrinker = shrinker.with_gatherer(ResourceGatherer::Table { path: path.clone() });
                has_table = true;
            }
            if let Some(path) = &module.symbols {
                let package = module.package.clone().ok_or_else(|| ShrinkError::MissingInput {
                    what: format!("package name for the symbol file of module '{}'", module.name),
                })?;
                shrinker = shrinker.with_gatherer(ResourceGatherer::Symbols {
                    path: path.clone(),
                    package,
                });
                has_table = true;
            }
            for path in &module.resources {
                shrinker = shrinker.with_resource_dir(ResourceDir {
                    path: path.clone(),
                    package: module.package.clone(),
                });
            }
            if let Some(path) = &module.manifest {
                shrinker = shrinker.with_recorder(UsageRecorder::Manifest {
                    path: path.clone(),
                    package: module.package.clone(),
                });
            }
            code.extend(module.code.iter().cloned());
            if let Some(dir) = &module.keep_dir {
                shrinker = shrinker.with_recorder(UsageRecorder::ToolsAttribute { dir: dir.clone() });
            }
        }

        if !has_table {
            return Err(ShrinkError::MissingInput {
                what: "resource table or symbol file".to_string(),
            });
        }
        if !code.is_empty() {
            shrinker = shrinker.with_recorder(UsageRecorder::Code { paths: code });
        }
        if self.web_content {
            shrinker = shrinker.with_recorder(UsageRecorder::WebContent {
                dirs: self.web_content_dirs.clone(),
            });
        }
        if let Some(mapping) = &self.mapping {
            shrinker = shrinker.with_mapping(ProguardMappingsRecorder::new(mapping));
        }
        Ok(shrinker)
    }
}
