// Analysis module - reachability closure, keep/discard overrides and dynamic lookups

mod possible;
mod reachability;

pub use possible::{convert_format_string_to_regex, possible_matches, PossibleResourceMarker, NO_MATCH};
pub use reachability::ReachabilityAnalyzer;

use crate::model::{ResourceStore, ResourceType};

/// A resource left unreachable after analysis
#[derive(Debug, Clone, serde::Serialize)]
pub struct UnusedResource {
    pub package: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    /// Compiled ID, when the resource came from a table or symbol file
    #[serde(serialize_with = "serialize_id")]
    pub id: Option<u32>,
    /// Archive paths of the files backing the resource
    pub files: Vec<String>,
}

impl UnusedResource {
    pub fn url(&self) -> String {
        match &self.package {
            Some(package) => format!("@{}:{}/{}", package, self.resource_type, self.name),
            None => format!("@{}/{}", self.resource_type, self.name),
        }
    }
}

fn serialize_id<S: serde::Serializer>(id: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
    match id {
        Some(id) => serializer.serialize_str(&format!("0x{:08x}", id)),
        None => serializer.serialize_none(),
    }
}

/// Unreachable resources in dump order
pub fn unused_resources(store: &ResourceStore) -> Vec<UnusedResource> {
    store
        .unreachable()
        .into_iter()
        .map(|id| {
            let resource = store.get(id);
            UnusedResource {
                package: resource.package.clone(),
                resource_type: resource.resource_type,
                name: resource.name.clone(),
                id: resource.id,
                files: resource.files.clone(),
            }
        })
        .collect()
}
