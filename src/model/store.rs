use super::keep::ResourcePattern;
use super::{normalize_name, Resource, ResourceId, ResourceType};
use std::collections::HashMap;
use std::fmt::Write as _;
use tracing::debug;

/// Arena of every declared resource, indexed by numeric ID, by (type, name) and by file path
#[derive(Debug, Default)]
pub struct ResourceStore {
    resources: Vec<Resource>,
    by_id: HashMap<u32, ResourceId>,
    by_name: HashMap<(ResourceType, String), Vec<ResourceId>>,
    by_path: HashMap<String, Vec<ResourceId>>,
    /// Package name -> package ID
    packages: HashMap<String, u8>,
    /// References by numeric ID waiting for every table to be gathered
    pending: Vec<(ResourceId, u32)>,
    keep: Vec<ResourcePattern>,
    discard: Vec<ResourcePattern>,
    safe_mode: bool,
    support_multipackages: bool,
}

impl ResourceStore {
    pub fn new(support_multipackages: bool) -> Self {
        Self {
            safe_mode: true,
            support_multipackages,
            ..Default::default()
        }
    }

    pub fn supports_multipackages(&self) -> bool {
        self.support_multipackages
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Add a resource, merging it into an existing one with the same identity
    pub fn add_resource(&mut self, resource: Resource) -> ResourceId {
        if let Some(existing) = self.find_exact(
            resource.package.as_deref(),
            resource.resource_type,
            &resource.name,
        ) {
            let Resource { id, files, value, .. } = resource;
            if let Some(numeric) = id {
                if self.resources[existing.0].id.is_none() {
                    self.resources[existing.0].id = Some(numeric);
                    self.by_id.insert(numeric, existing);
                }
            }
            for file in files {
                self.add_file(existing, &file);
            }
            if self.resources[existing.0].value.is_none() {
                self.resources[existing.0].value = value;
            }
            return existing;
        }

        let handle = ResourceId(self.resources.len());
        if let Some(numeric) = resource.id {
            self.by_id.insert(numeric, handle);
            if let Some(package) = &resource.package {
                self.packages
                    .entry(package.clone())
                    .or_insert((numeric >> 24) as u8);
            }
        }
        self.by_name
            .entry((resource.resource_type, resource.name.clone()))
            .or_default()
            .push(handle);
        for file in &resource.files {
            self.by_path.entry(file.clone()).or_default().push(handle);
        }
        self.resources.push(resource);
        handle
    }

    pub fn get(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceId(i), r))
    }

    pub fn ids(&self) -> impl Iterator<Item = ResourceId> {
        (0..self.resources.len()).map(ResourceId)
    }

    /// Package ID registered for a package name
    pub fn package_id(&self, package: &str) -> Option<u8> {
        self.packages.get(package).copied()
    }

    pub fn find_by_id(&self, id: u32) -> Option<ResourceId> {
        self.by_id.get(&id).copied()
    }

    /// Every resource of a type/name; with a package only that package's resource in multi-package mode
    pub fn find(&self, package: Option<&str>, resource_type: ResourceType, name: &str) -> Vec<ResourceId> {
        let Some(candidates) = self.by_name.get(&(resource_type, normalize_name(name))) else {
            return Vec::new();
        };
        match package {
            Some(package) if self.support_multipackages => candidates
                .iter()
                .copied()
                .filter(|id| self.resources[id.0].package.as_deref() == Some(package))
                .collect(),
            _ => candidates.clone(),
        }
    }

    /// Resolve a name reference made from inside `package`: its own resource first, any package otherwise
    pub fn find_from(&self, package: Option<&str>, resource_type: ResourceType, name: &str) -> Vec<ResourceId> {
        let own = self.find(package, resource_type, name);
        if own.is_empty() && package.is_some() && self.support_multipackages {
            return self.find(None, resource_type, name);
        }
        own
    }

    fn find_exact(&self, package: Option<&str>, resource_type: ResourceType, name: &str) -> Option<ResourceId> {
        let candidates = self.by_name.get(&(resource_type, name.to_string()))?;
        if !self.support_multipackages {
            return candidates.first().copied();
        }
        candidates
            .iter()
            .copied()
            .find(|id| self.resources[id.0].package.as_deref() == package)
    }

    /// Every resource with the given normalized name, regardless of type
    pub fn find_by_name(&self, name: &str) -> Vec<ResourceId> {
        self.resources()
            .filter(|(_, r)| r.name == name)
            .map(|(id, _)| id)
            .collect()
    }

    /// Resources backed by an archive path such as `res/layout/main.xml`
    pub fn find_by_path(&self, package: Option<&str>, path: &str) -> Vec<ResourceId> {
        let Some(candidates) = self.by_path.get(path) else {
            return Vec::new();
        };
        match package {
            Some(package) if self.support_multipackages => candidates
                .iter()
                .copied()
                .filter(|id| self.resources[id.0].package.as_deref() == Some(package))
                .collect(),
            _ => candidates.clone(),
        }
    }

    pub fn add_file(&mut self, id: ResourceId, path: &str) {
        let resource = &mut self.resources[id.0];
        if resource.files.iter().any(|f| f == path) {
            return;
        }
        resource.files.push(path.to_string());
        self.by_path.entry(path.to_string()).or_default().push(id);
    }

    /// Record an inline value; the first configuration seen wins
    pub fn set_value(&mut self, id: ResourceId, value: &str) {
        let resource = &mut self.resources[id.0];
        if resource.value.is_none() {
            resource.value = Some(value.to_string());
        }
    }

    pub fn add_reference(&mut self, from: ResourceId, to: ResourceId) {
        if from != to {
            self.resources[from.0].references.insert(to);
        }
    }

    /// Record a reference by numeric ID; resolved by [`Self::link_pending_references`]
    pub fn add_reference_by_id(&mut self, from: ResourceId, to: u32) {
        self.pending.push((from, to));
    }

    /// Resolve all ID references in the order they were recorded
    pub fn link_pending_references(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for (from, to) in pending {
            match self.find_by_id(to) {
                Some(target) => self.add_reference(from, target),
                None => debug!("Dropping reference to unknown resource 0x{:08x}", to),
            }
        }
    }

    pub fn is_reachable(&self, id: ResourceId) -> bool {
        self.resources[id.0].reachable
    }

    /// Mark a resource reachable; returns true if it was not reachable before
    pub fn mark_reachable(&mut self, id: ResourceId) -> bool {
        let resource = &mut self.resources[id.0];
        let newly = !resource.reachable;
        resource.reachable = true;
        newly
    }

    /// The discard override; the only way a reachable resource becomes unreachable
    pub(crate) fn force_unreachable(&mut self, id: ResourceId) {
        self.resources[id.0].reachable = false;
    }

    pub fn add_keep(&mut self, pattern: ResourcePattern) {
        self.keep.push(pattern);
    }

    pub fn add_discard(&mut self, pattern: ResourcePattern) {
        self.discard.push(pattern);
    }

    pub fn keep_patterns(&self) -> &[ResourcePattern] {
        &self.keep
    }

    pub fn discard_patterns(&self) -> &[ResourcePattern] {
        &self.discard
    }

    /// Resources matched by any of the given patterns
    pub fn matching(&self, patterns: &[ResourcePattern]) -> Vec<ResourceId> {
        self.resources()
            .filter(|(_, r)| patterns.iter().any(|p| p.matches(r)))
            .map(|(id, _)| id)
            .collect()
    }

    /// Safe mode enables guessing at dynamically looked-up resources
    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    pub fn set_safe_mode(&mut self, safe: bool) {
        self.safe_mode = safe;
    }

    pub fn unreachable(&self) -> Vec<ResourceId> {
        self.sorted_ids()
            .into_iter()
            .filter(|id| !self.is_reachable(*id))
            .collect()
    }

    /// Handles sorted by type then name; ties keep gathering order
    pub fn sorted_ids(&self) -> Vec<ResourceId> {
        let mut ids: Vec<ResourceId> = self.ids().collect();
        ids.sort_by(|a, b| {
            let (a, b) = (&self.resources[a.0], &self.resources[b.0]);
            a.resource_type
                .cmp(&b.resource_type)
                .then_with(|| a.name.cmp(&b.name))
        });
        ids
    }

    /// Human readable dump of every resource, its reachability and its direct references
    pub fn dump_resource_model(&self) -> String {
        let qualified = self.support_multipackages;
        let mut out = String::new();
        for id in self.sorted_ids() {
            let resource = &self.resources[id.0];
            let _ = writeln!(
                out,
                "{} : reachable={}",
                resource.url(qualified),
                resource.reachable
            );
            for reference in resource.references() {
                let _ = writeln!(out, "    {}", self.resources[reference.0].url(qualified));
            }
        }
        out
    }

    /// `type/name#remove` for unreachable resources and `type/name#` for the rest
    pub fn dump_config(&self) -> String {
        let mut out = String::new();
        for id in self.sorted_ids() {
            let resource = &self.resources[id.0];
            let _ = writeln!(
                out,
                "{}/{}#{}",
                resource.resource_type,
                resource.name,
                if resource.reachable { "" } else { "remove" }
            );
        }
        out
    }
}
