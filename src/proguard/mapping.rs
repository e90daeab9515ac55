// ProGuard/R8 mapping.txt reader
//
// The mapping file lists every renamed class followed by its renamed members.
//
// Format:
// ```
// com.example.R$layout -> com.example.t:
//     int activity_main -> a
//     1:3:void onCreate(android.os.Bundle):12:14 -> onCreate
// ```

use crate::error::{read_text, Result, ShrinkError};
use crate::model::ShrinkerModel;
use proguard::{ParseError, ProguardMapping, ProguardRecord};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reverse lookup from obfuscated class and field names to their originals
#[derive(Debug, Clone, Default)]
pub struct ObfuscationMapping {
    /// Keyed by obfuscated class name
    classes: HashMap<String, ClassMapping>,
}

#[derive(Debug, Clone)]
struct ClassMapping {
    original: String,
    /// Obfuscated field name -> original field name
    fields: HashMap<String, String>,
}

impl ObfuscationMapping {
    pub fn parse(path: &Path) -> Result<Self> {
        let content = read_text(path)?;
        Self::parse_content(path, &content)
    }

    /// Parse mapping content; `path` is only used for error reporting
    pub fn parse_content(path: &Path, content: &str) -> Result<Self> {
        let mut mapping = ObfuscationMapping::default();
        let mut current: Option<String> = None;

        for record in ProguardMapping::new(content.as_bytes()).iter() {
            let record = record.map_err(|e| malformed(path, content, &e))?;
            match record {
                ProguardRecord::Class {
                    original,
                    obfuscated,
                    ..
                } => {
                    mapping.classes.insert(
                        obfuscated.to_string(),
                        ClassMapping {
                            original: original.to_string(),
                            fields: HashMap::new(),
                        },
                    );
                    current = Some(obfuscated.to_string());
                }
                ProguardRecord::Field {
                    original,
                    obfuscated,
                    ..
                } => {
                    if let Some(class) = current.as_ref().and_then(|c| mapping.classes.get_mut(c)) {
                        class
                            .fields
                            .insert(obfuscated.to_string(), original.to_string());
                    }
                }
                _ => {}
            }
        }

        debug!("Parsed mapping with {} classes", mapping.classes.len());
        Ok(mapping)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Original name of a class; unknown names map to themselves
    pub fn deobfuscate_class<'a>(&'a self, obfuscated: &'a str) -> &'a str {
        self.classes
            .get(obfuscated)
            .map(|c| c.original.as_str())
            .unwrap_or(obfuscated)
    }

    /// Original name of a field of an obfuscated class; unknown names map to themselves
    pub fn deobfuscate_field<'a>(&'a self, obfuscated_class: &str, obfuscated_field: &'a str) -> &'a str {
        self.classes
            .get(obfuscated_class)
            .and_then(|c| c.fields.get(obfuscated_field))
            .map(String::as_str)
            .unwrap_or(obfuscated_field)
    }
}

/// Locate the offending line of a parse error by its contents
fn malformed(path: &Path, content: &str, error: &ParseError) -> ShrinkError {
    let text = String::from_utf8_lossy(error.line());
    let text = text.trim_end();
    let line = content
        .lines()
        .position(|l| l.trim_end() == text)
        .map_or(0, |index| index + 1);
    ShrinkError::MalformedMapping {
        path: path.to_path_buf(),
        line,
        message: format!("{:?} in `{}`", error.kind(), text),
    }
}

/// Loads a mapping file into the model before code usages are recorded
#[derive(Debug, Clone)]
pub struct ProguardMappingsRecorder {
    path: PathBuf,
}

impl ProguardMappingsRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn record(&self, model: &mut ShrinkerModel) -> Result<()> {
        model.mapping = ObfuscationMapping::parse(&self.path)?;
        info!("Loaded obfuscation mapping from {}", self.path.display());
        Ok(())
    }
}
