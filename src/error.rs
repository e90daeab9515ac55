//! Error types for the resource shrinker

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while analyzing inputs or rewriting archives
#[derive(Error, Diagnostic, Debug)]
pub enum ShrinkError {
    #[error("Failed to access {}", path.display())]
    #[diagnostic(code(resshrink::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed resource table {}: {message}", path.display())]
    #[diagnostic(
        code(resshrink::resource_table),
        help("expected a compiled resources.arsc or an R.txt symbol file")
    )]
    MalformedResourceTable { path: PathBuf, message: String },

    #[error("Malformed XML document {}: {message}", path.display())]
    #[diagnostic(code(resshrink::xml))]
    MalformedXml { path: PathBuf, message: String },

    #[error("Malformed dex file {}: {source}", path.display())]
    #[diagnostic(code(resshrink::dex))]
    MalformedDex {
        path: PathBuf,
        #[source]
        source: smali::dex::error::DexError,
    },

    #[error("Malformed smali file {}: {source}", path.display())]
    #[diagnostic(code(resshrink::smali))]
    MalformedSmali {
        path: PathBuf,
        #[source]
        source: smali::types::SmaliError,
    },

    #[error("Malformed mapping file {}:{line}: {message}", path.display())]
    #[diagnostic(
        code(resshrink::mapping),
        help("mapping lines look like `com.example.R$layout -> a.b:`")
    )]
    MalformedMapping {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to process archive {}", path.display())]
    #[diagnostic(code(resshrink::archive))]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("No usable {what} input was found")]
    #[diagnostic(
        code(resshrink::missing_input),
        help("pass at least one existing dex/smali path or manifest")
    )]
    MissingInput { what: String },

    #[error("Archive rewrite requested before analysis")]
    #[diagnostic(code(resshrink::not_analyzed))]
    NotAnalyzed,
}

pub type Result<T> = std::result::Result<T, ShrinkError>;

impl ShrinkError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ShrinkError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn archive(path: impl AsRef<Path>, source: zip::result::ZipError) -> Self {
        ShrinkError::Archive {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn table(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        ShrinkError::MalformedResourceTable {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn xml(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        ShrinkError::MalformedXml {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn dex(path: impl AsRef<Path>, source: smali::dex::error::DexError) -> Self {
        ShrinkError::MalformedDex {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn smali(path: impl AsRef<Path>, source: smali::types::SmaliError) -> Self {
        ShrinkError::MalformedSmali {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Read a whole file, attaching the path to any I/O error
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| ShrinkError::io(path, e))
}

/// Read a whole file as UTF-8 text, attaching the path to any I/O error
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ShrinkError::io(path, e))
}
