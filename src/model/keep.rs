// tools:keep / tools:discard directive patterns

use super::{normalize_name, Resource, ResourceType};
use regex::Regex;

/// One `@[pkg:]type/name` entry of a keep or discard list, `*` matching any run of characters
#[derive(Debug, Clone)]
pub struct ResourcePattern {
    pub package: Option<String>,
    pub resource_type: ResourceType,
    pub name: String,
    wildcard: Option<Regex>,
}

impl ResourcePattern {
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        let rest = entry.strip_prefix('@').unwrap_or(entry);
        let (package, rest) = match rest.split_once(':') {
            Some((package, rest)) => (Some(package.to_string()), rest),
            None => (None, rest),
        };
        let (ty, name) = rest.split_once('/')?;
        let resource_type = ResourceType::from_name(ty.trim())?;
        let name = normalize_name(name.trim());
        if name.is_empty() {
            return None;
        }

        let wildcard = if name.contains('*') {
            let body = name
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*");
            Regex::new(&format!("^{}$", body)).ok()
        } else {
            None
        };

        Some(Self {
            package,
            resource_type,
            name,
            wildcard,
        })
    }

    /// Parse a comma-separated directive list, skipping entries that are not resource URLs
    pub fn parse_list(value: &str) -> Vec<Self> {
        value
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .filter_map(Self::parse)
            .collect()
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard.is_some()
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        if resource.resource_type != self.resource_type {
            return false;
        }
        if let (Some(wanted), Some(actual)) = (&self.package, &resource.package) {
            if wanted != actual {
                return false;
            }
        }
        match &self.wildcard {
            Some(regex) => regex.is_match(&resource.name),
            None => resource.name == self.name,
        }
    }
}
