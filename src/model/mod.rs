//! Resource usage model
//!
//! The [`ResourceStore`] owns every declared resource; [`ShrinkerModel`] wraps it
//! together with the state shared by the usage recorders: pooled string
//! constants, dynamic-lookup flags and the obfuscation mapping.

mod keep;
mod resource;
mod store;

pub use keep::ResourcePattern;
pub use resource::{normalize_name, Resource, ResourceId, ResourceType, ResourceUrl};
pub use store::ResourceStore;

use crate::proguard::ObfuscationMapping;
use std::collections::BTreeSet;

/// URL prefix WebView uses for packaged resources
pub const ANDROID_RES_URL: &str = "file:///android_res/";

/// URL prefix for resource URIs resolved by the content resolver
pub const ANDROID_RESOURCE_URL: &str = "android.resource://";

/// Strings longer than this are never resource names
const MAX_RESOURCE_STRING_LEN: usize = 80;

/// Shared state mutated by gatherers, recorders and graph builders during one analysis
#[derive(Debug)]
pub struct ShrinkerModel {
    pub store: ResourceStore,
    pub mapping: ObfuscationMapping,
    strings: BTreeSet<String>,
    found_get_identifier: bool,
    found_web_content: bool,
}

impl ShrinkerModel {
    pub fn new(support_multipackages: bool) -> Self {
        Self {
            store: ResourceStore::new(support_multipackages),
            mapping: ObfuscationMapping::default(),
            strings: BTreeSet::new(),
            found_get_identifier: false,
            found_web_content: false,
        }
    }

    /// Pool a string constant seen in code or web content if it could name a resource
    pub fn add_string_constant(&mut self, value: &str) {
        if value.is_empty() || value.len() > MAX_RESOURCE_STRING_LEN {
            return;
        }
        let mut has_identifier_char = false;
        for c in value.chars() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                has_identifier_char = true;
            } else if !matches!(c, '.' | ':' | '/' | '%') {
                return;
            }
        }
        if !has_identifier_char {
            return;
        }
        if value.contains(ANDROID_RES_URL) {
            self.found_web_content = true;
        }
        self.strings.insert(value.to_string());
    }

    pub fn strings(&self) -> &BTreeSet<String> {
        &self.strings
    }

    pub fn set_found_get_identifier(&mut self) {
        self.found_get_identifier = true;
    }

    pub fn set_found_web_content(&mut self) {
        self.found_web_content = true;
    }

    pub fn found_get_identifier(&self) -> bool {
        self.found_get_identifier
    }

    pub fn found_web_content(&self) -> bool {
        self.found_web_content
    }

    /// Mark a resource reachable by its compiled ID
    pub fn mark_id(&mut self, id: u32) -> bool {
        match self.store.find_by_id(id) {
            Some(handle) => self.store.mark_reachable(handle),
            None => false,
        }
    }

    /// Mark every resource named by a URL reachable
    pub fn mark_url(&mut self, url: &ResourceUrl) {
        for handle in self
            .store
            .find(url.package.as_deref(), url.resource_type, &url.name)
        {
            self.store.mark_reachable(handle);
        }
    }

    /// Mark the resources a URL written inside `package` resolves to
    pub fn mark_url_from(&mut self, package: Option<&str>, url: &ResourceUrl) {
        let package = url.package.as_deref().or(package);
        for handle in self.store.find_from(package, url.resource_type, &url.name) {
            self.store.mark_reachable(handle);
        }
    }
}
