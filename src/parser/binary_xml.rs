// Compiled (AXML) document reader

use super::chunk::*;
use super::{XmlAttribute, XmlElement};

/// Check for the `RES_XML_TYPE` chunk header
pub fn is_binary_xml(bytes: &[u8]) -> bool {
    bytes.len() >= 8 && bytes[0..2] == RES_XML_TYPE.to_le_bytes() && bytes[2..4] == 8u16.to_le_bytes()
}

/// Parse a compiled XML document into its root element
pub fn parse(bytes: &[u8]) -> ChunkResult<XmlElement> {
    let mut reader = BinaryReader::new(bytes);
    let document = ChunkHeader::read(&mut reader)?;
    if document.chunk_type != RES_XML_TYPE {
        return Err(ChunkError(format!(
            "not a compiled XML document (chunk 0x{:04x})",
            document.chunk_type
        )));
    }
    reader.seek(document.body_start())?;

    let mut pool = StringPool::default();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    while reader.position() < document.end() {
        let header = ChunkHeader::read(&mut reader)?;
        match header.chunk_type {
            RES_STRING_POOL_TYPE => {
                pool = StringPool::parse(&mut reader, &header)?;
            }
            RES_XML_START_ELEMENT_TYPE => {
                let element = read_start_element(&mut reader, &header, &pool)?;
                stack.push(element);
            }
            RES_XML_END_ELEMENT_TYPE => {
                let finished = stack
                    .pop()
                    .ok_or_else(|| ChunkError("end element without start".to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(finished),
                    None => {
                        if root.is_some() {
                            return Err(ChunkError("multiple root elements".to_string()));
                        }
                        root = Some(finished);
                    }
                }
            }
            RES_XML_CDATA_TYPE => {
                reader.seek(header.body_start())?;
                let data = reader.read_u32()?;
                if let (Some(open), Some(text)) = (stack.last_mut(), pool.get(data)) {
                    open.text.push_str(text);
                }
            }
            // Namespace and resource map chunks carry nothing the element tree needs
            RES_XML_START_NAMESPACE_TYPE | RES_XML_END_NAMESPACE_TYPE | RES_XML_RESOURCE_MAP_TYPE => {}
            other => {
                return Err(ChunkError(format!("unexpected XML chunk 0x{:04x}", other)));
            }
        }
        reader.seek(header.end())?;
    }

    if !stack.is_empty() {
        return Err(ChunkError("unterminated element".to_string()));
    }
    root.ok_or_else(|| ChunkError("document has no root element".to_string()))
}

fn read_start_element(
    reader: &mut BinaryReader<'_>,
    header: &ChunkHeader,
    pool: &StringPool,
) -> ChunkResult<XmlElement> {
    // Line number and comment live in the node header; the element extension follows it
    let ext_start = header.body_start();
    reader.seek(ext_start)?;
    let namespace = reader.read_u32()?;
    let name = reader.read_u32()?;
    let attribute_start = reader.read_u16()? as usize;
    let attribute_size = reader.read_u16()? as usize;
    let attribute_count = reader.read_u16()? as usize;

    let name = pool
        .get(name)
        .ok_or_else(|| ChunkError(format!("element name index {} out of range", name)))?;
    let mut element = XmlElement::new(pool.get(namespace).map(str::to_string), name);

    for i in 0..attribute_count {
        let at = ext_start + attribute_start + i * attribute_size;
        if at + 20 > header.end() {
            return Err(ChunkError(format!("attribute {} of <{}> overruns chunk", i, name)));
        }
        reader.seek(at)?;
        let ns = reader.read_u32()?;
        let attr_name = reader.read_u32()?;
        let raw_value = reader.read_u32()?;
        let _size = reader.read_u16()?;
        let _res0 = reader.read_u8()?;
        let data_type = reader.read_u8()?;
        let data = reader.read_u32()?;

        let reference = match data_type {
            TYPE_REFERENCE | TYPE_ATTRIBUTE | TYPE_DYNAMIC_REFERENCE | TYPE_DYNAMIC_ATTRIBUTE
                if data != 0 =>
            {
                Some(data)
            }
            _ => None,
        };
        let value = match pool.get(raw_value) {
            Some(raw) => raw.to_string(),
            None if data_type == TYPE_STRING => pool.get(data).unwrap_or_default().to_string(),
            None => String::new(),
        };

        element.attributes.push(XmlAttribute {
            namespace: pool.get(ns).map(str::to_string),
            name: pool.get(attr_name).unwrap_or_default().to_string(),
            value,
            reference,
        });
    }

    Ok(element)
}
