// Reference extraction from parsed XML resources

use crate::model::{ResourceType, ResourceUrl};
use crate::parser::{XmlElement, TOOLS_NS};

/// Target of one reference edge before it is resolved against the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTarget {
    /// Compiled reference by resource ID
    Id(u32),
    /// Symbolic `@type/name` reference
    Url(ResourceUrl),
}

/// Every reference in a layout, drawable, menu or other file-backed XML resource
pub fn element_references(root: &XmlElement) -> Vec<ReferenceTarget> {
    let mut references = Vec::new();
    for element in root.descendants() {
        for attr in &element.attributes {
            // Design-time attributes never ship
            if attr.namespace.as_deref() == Some(TOOLS_NS) {
                continue;
            }
            if let Some(id) = attr.reference {
                references.push(ReferenceTarget::Id(id));
            } else if let Some(url) = ResourceUrl::parse(&attr.value) {
                references.push(ReferenceTarget::Url(url));
            }
        }

        let text = element.text.trim();
        if text.is_empty() {
            continue;
        }
        if element.name == "rawPathResId" {
            // Wear micro-APK descriptors name a raw resource by its bare name
            references.push(ReferenceTarget::Url(ResourceUrl {
                package: None,
                resource_type: ResourceType::Raw,
                name: crate::model::normalize_name(text),
            }));
        } else if let Some(url) = ResourceUrl::parse(text) {
            references.push(ReferenceTarget::Url(url));
        }
    }
    references
}
