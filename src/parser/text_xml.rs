// Raw text XML reader built on quick-xml's namespace-aware reader

use super::{XmlAttribute, XmlElement};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

/// Parse a text XML document into its root element, resolving namespace prefixes
pub fn parse(contents: &str) -> Result<XmlElement, String> {
    let contents = contents.trim_start_matches('\u{feff}');
    let mut reader = NsReader::from_str(contents);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let resolved = reader
            .read_resolved_event()
            .map(|(namespace, event)| (namespace_uri(namespace), event));
        match resolved {
            Ok((namespace, Event::Start(e))) => {
                stack.push(open_element(&reader, namespace, &e)?);
            }
            Ok((namespace, Event::Empty(e))) => {
                let element = open_element(&reader, namespace, &e)?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok((_, Event::End(_))) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "closing tag without opening tag".to_string())?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok((_, Event::Text(e))) => {
                if let Some(open) = stack.last_mut() {
                    let text = e.unescape().map_err(|e| e.to_string())?;
                    open.text.push_str(&text);
                }
            }
            Ok((_, Event::CData(e))) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok((_, Event::Eof)) => break,
            Err(e) => {
                return Err(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("unexpected end of document".to_string());
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

/// Bound namespaces become their URI; unbound and unknown prefixes have none
fn namespace_uri(resolved: ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).to_string()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<(), String> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err("multiple root elements".to_string()),
    }
    Ok(())
}

fn open_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> Result<XmlElement, String> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).to_string();
    let mut element = XmlElement::new(namespace, &name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        // Unprefixed attributes resolve as unbound
        let (namespace, local) = reader.resolve_attribute(attr.key);
        let namespace = namespace_uri(namespace);
        let name = String::from_utf8_lossy(local.as_ref()).to_string();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.to_string();
        element.attributes.push(XmlAttribute {
            namespace,
            name,
            value,
            reference: None,
        });
    }

    Ok(element)
}
