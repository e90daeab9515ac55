//! `res/values*/` parsing
//!
//! A values file declares many resources at once. Each declaration is turned
//! into the list of resources its value points at: aliases, style parents,
//! style item attributes and values, array items, styleable attributes.

use super::references::ReferenceTarget;
use crate::model::{normalize_name, ResourceType, ResourceUrl};
use crate::parser::XmlElement;

/// One resource declared in a values file and what its value references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDefinition {
    pub resource_type: ResourceType,
    pub name: String,
    pub references: Vec<ReferenceTarget>,
}

/// Parse the children of a `<resources>` element
pub fn value_definitions(root: &XmlElement) -> Vec<ValueDefinition> {
    root.children.iter().filter_map(definition).collect()
}

fn definition(element: &XmlElement) -> Option<ValueDefinition> {
    let resource_type = match element.name.as_str() {
        "item" => ResourceType::from_name(&element.attribute(None, "type")?.value)?,
        tag => ResourceType::from_values_tag(tag)?,
    };
    let name = element.attribute(None, "name")?.value.trim().to_string();
    if name.is_empty() {
        return None;
    }

    let mut references = Vec::new();
    match resource_type {
        ResourceType::Style => style_references(element, &name, &mut references),
        ResourceType::Styleable => {
            for attr in element.children.iter().filter(|c| c.name == "attr") {
                if let Some(name) = attr.attribute(None, "name") {
                    push_attr(&name.value, &mut references);
                }
            }
        }
        _ => value_references(element, &mut references),
    }

    Some(ValueDefinition {
        resource_type,
        name,
        references,
    })
}

fn style_references(element: &XmlElement, name: &str, references: &mut Vec<ReferenceTarget>) {
    match element.attribute(None, "parent") {
        Some(parent) => {
            let parent = parent.value.trim();
            if let Some(url) = ResourceUrl::parse(parent) {
                references.push(ReferenceTarget::Url(url));
            } else if !parent.is_empty() && !parent.contains(':') {
                references.push(style(parent));
            }
        }
        // `Base.Child` implicitly inherits from `Base`
        None => {
            if let Some((parent, _)) = name.rsplit_once('.') {
                references.push(style(parent));
            }
        }
    }

    for item in element.children.iter().filter(|c| c.name == "item") {
        if let Some(attr) = item.attribute(None, "name") {
            push_attr(&attr.value, references);
        }
        if let Some(url) = ResourceUrl::parse(&item.text) {
            references.push(ReferenceTarget::Url(url));
        }
    }
}

fn value_references(element: &XmlElement, references: &mut Vec<ReferenceTarget>) {
    for node in element.descendants() {
        if let Some(url) = ResourceUrl::parse(&node.text) {
            references.push(ReferenceTarget::Url(url));
        }
    }
}

fn push_attr(name: &str, references: &mut Vec<ReferenceTarget>) {
    let name = name.trim();
    if name.is_empty() || name.starts_with("android:") {
        return;
    }
    let (package, name) = match name.split_once(':') {
        Some((package, name)) => (Some(package.to_string()), name),
        None => (None, name),
    };
    references.push(ReferenceTarget::Url(ResourceUrl {
        package,
        resource_type: ResourceType::Attr,
        name: normalize_name(name),
    }));
}

fn style(name: &str) -> ReferenceTarget {
    ReferenceTarget::Url(ResourceUrl {
        package: None,
        resource_type: ResourceType::Style,
        name: normalize_name(name),
    })
}
