//! Input parsers
//!
//! XML documents are read into one element tree regardless of whether they
//! arrive as raw text or as compiled binary XML; compiled code is read from
//! dex files or smali disassembly.

pub mod binary_xml;
pub mod chunk;
pub mod code;
pub mod text_xml;

use crate::error::{Result, ShrinkError};
use std::path::Path;

pub const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";
pub const TOOLS_NS: &str = "http://schemas.android.com/tools";
pub const AAPT_NS: &str = "http://schemas.android.com/aapt";

/// One XML element with its attributes, text content and children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub name: String,
    /// Raw string value as written in the source
    pub value: String,
    /// Compiled reference (resource or attribute ID) for binary documents
    pub reference: Option<u32>,
}

impl XmlElement {
    pub fn new(namespace: Option<String>, name: &str) -> Self {
        Self {
            namespace,
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, namespace: Option<&str>, name: &str) -> Option<&XmlAttribute> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == namespace)
    }

    /// This element and all descendants in document order
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(element) = stack.pop() {
            out.push(element);
            stack.extend(element.children.iter().rev());
        }
        out
    }
}

/// Static field access found in compiled code, with a dotted owner class name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub class: String,
    pub name: String,
}

/// Everything a code scan extracts that can point at a resource
#[derive(Debug, Clone, Default)]
pub struct CodeScan {
    pub int_constants: Vec<u32>,
    pub string_constants: Vec<String>,
    pub field_refs: Vec<FieldRef>,
    /// `Resources.getIdentifier` is called somewhere
    pub calls_get_identifier: bool,
    /// A `WebView.load*` method is called somewhere
    pub loads_web_content: bool,
}

impl CodeScan {
    pub fn record_call(&mut self, class: &str, method: &str) {
        match class {
            "android.content.res.Resources" if method == "getIdentifier" => {
                self.calls_get_identifier = true;
            }
            "android.webkit.WebView" if method.starts_with("load") => {
                self.loads_web_content = true;
            }
            _ => {}
        }
    }

    pub fn merge(&mut self, other: CodeScan) {
        self.int_constants.extend(other.int_constants);
        self.string_constants.extend(other.string_constants);
        self.field_refs.extend(other.field_refs);
        self.calls_get_identifier |= other.calls_get_identifier;
        self.loads_web_content |= other.loads_web_content;
    }
}

/// Parse an XML document, detecting compiled binary XML by its chunk header
pub fn parse_xml(path: &Path, bytes: &[u8]) -> Result<XmlElement> {
    if binary_xml::is_binary_xml(bytes) {
        return binary_xml::parse(bytes).map_err(|e| ShrinkError::xml(path, e.to_string()));
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ShrinkError::xml(path, format!("not UTF-8 text: {}", e)))?;
    text_xml::parse(text).map_err(|message| ShrinkError::xml(path, message))
}
