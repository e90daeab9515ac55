// Binary resource table (resources.arsc) gatherer

use crate::error::{Result, ShrinkError};
use crate::model::{Resource, ResourceStore, ResourceType};
use crate::parser::chunk::*;
use std::path::Path;
use tracing::debug;

const TYPE_FLAG_SPARSE: u8 = 0x01;
const TYPE_FLAG_OFFSET16: u8 = 0x02;

const ENTRY_FLAG_COMPLEX: u16 = 0x0001;
const ENTRY_FLAG_COMPACT: u16 = 0x0008;

/// Parse a compiled resource table and add every entry it declares
pub fn gather_table(path: &Path, bytes: &[u8], store: &mut ResourceStore) -> Result<usize> {
    let mut reader = BinaryReader::new(bytes);
    let added = read_table(&mut reader, store).map_err(|e| ShrinkError::table(path, e.0))?;
    debug!("Gathered {} entries from {}", added, path.display());
    Ok(added)
}

fn read_table(reader: &mut BinaryReader<'_>, store: &mut ResourceStore) -> ChunkResult<usize> {
    let table = ChunkHeader::read(reader)?;
    if table.chunk_type != RES_TABLE_TYPE {
        return Err(ChunkError(format!(
            "not a resource table (chunk 0x{:04x})",
            table.chunk_type
        )));
    }
    reader.seek(table.body_start())?;

    let mut values = StringPool::default();
    let mut added = 0;
    while reader.position() < table.end() {
        let header = ChunkHeader::read(reader)?;
        match header.chunk_type {
            RES_STRING_POOL_TYPE => values = StringPool::parse(reader, &header)?,
            RES_TABLE_PACKAGE_TYPE => added += read_package(reader, &header, &values, store)?,
            other => debug!("Skipping table chunk 0x{:04x}", other),
        }
        reader.seek(header.end())?;
    }
    Ok(added)
}

fn read_package(
    reader: &mut BinaryReader<'_>,
    package: &ChunkHeader,
    values: &StringPool,
    store: &mut ResourceStore,
) -> ChunkResult<usize> {
    let package_id = reader.read_u32()?;
    let name = read_fixed_utf16(reader.read_bytes(256)?);
    let type_strings = reader.read_u32()? as usize;
    let _last_public_type = reader.read_u32()?;
    let key_strings = reader.read_u32()? as usize;

    let type_names = read_pool_at(reader, package.start + type_strings)?;
    let key_names = read_pool_at(reader, package.start + key_strings)?;

    let mut added = 0;
    reader.seek(package.body_start())?;
    while reader.position() < package.end() {
        let header = ChunkHeader::read(reader)?;
        if header.chunk_type == RES_TABLE_TYPE_TYPE {
            let context = TypeContext {
                package_id,
                package: &name,
                type_names: &type_names,
                key_names: &key_names,
                values,
            };
            added += read_type(reader, &header, &context, store)?;
        }
        reader.seek(header.end())?;
    }
    Ok(added)
}

fn read_pool_at(reader: &mut BinaryReader<'_>, offset: usize) -> ChunkResult<StringPool> {
    reader.seek(offset)?;
    let header = ChunkHeader::read(reader)?;
    StringPool::parse(reader, &header)
}

struct TypeContext<'a> {
    package_id: u32,
    package: &'a str,
    type_names: &'a StringPool,
    key_names: &'a StringPool,
    values: &'a StringPool,
}

fn read_type(
    reader: &mut BinaryReader<'_>,
    header: &ChunkHeader,
    context: &TypeContext<'_>,
    store: &mut ResourceStore,
) -> ChunkResult<usize> {
    let type_id = reader.read_u8()?;
    let flags = reader.read_u8()?;
    let _reserved = reader.read_u16()?;
    let entry_count = reader.read_u32()? as usize;
    let entries_start = reader.read_u32()? as usize;

    let type_name = context
        .type_names
        .get(type_id.wrapping_sub(1) as u32)
        .ok_or_else(|| ChunkError(format!("type id {} has no name", type_id)))?;
    let Some(resource_type) = ResourceType::from_name(type_name) else {
        debug!("Skipping entries of unsupported type {}", type_name);
        return Ok(0);
    };

    // Offset table follows the header, whose size covers the variable-length config
    reader.seek(header.body_start())?;
    let mut entries = Vec::with_capacity(entry_count.min(header.chunk_size as usize / 2));
    for i in 0..entry_count {
        if flags & TYPE_FLAG_SPARSE != 0 {
            let index = reader.read_u16()? as u32;
            let offset = reader.read_u16()? as usize * 4;
            entries.push((index, offset));
        } else if flags & TYPE_FLAG_OFFSET16 != 0 {
            let offset = reader.read_u16()?;
            if offset != 0xFFFF {
                entries.push((i as u32, offset as usize * 4));
            }
        } else {
            let offset = reader.read_u32()?;
            if offset != NO_ENTRY {
                entries.push((i as u32, offset as usize));
            }
        }
    }

    let base = header.start + entries_start;
    for (index, offset) in &entries {
        let at = base + offset;
        if at >= header.end() {
            return Err(ChunkError(format!("entry {} of {} outside its chunk", index, type_name)));
        }
        reader.seek(at)?;
        let id = (context.package_id << 24) | ((type_id as u32) << 16) | index;
        read_entry(reader, id, resource_type, context, store)?;
    }
    Ok(entries.len())
}

fn read_entry(
    reader: &mut BinaryReader<'_>,
    id: u32,
    resource_type: ResourceType,
    context: &TypeContext<'_>,
    store: &mut ResourceStore,
) -> ChunkResult<()> {
    let size = reader.read_u16()?;
    let flags = reader.read_u16()?;

    if flags & ENTRY_FLAG_COMPACT != 0 {
        // Compact entries keep the key in the size field and the value type in the flags' high byte
        let data = reader.read_u32()?;
        let handle = add_entry(store, context, resource_type, size as u32, id)?;
        apply_simple_value(store, context, handle, (flags >> 8) as u8, data);
        return Ok(());
    }

    let key = reader.read_u32()?;
    let handle = add_entry(store, context, resource_type, key, id)?;

    if flags & ENTRY_FLAG_COMPLEX != 0 {
        let parent = reader.read_u32()?;
        let count = reader.read_u32()?;
        if parent != 0 {
            store.add_reference_by_id(handle, parent);
        }
        reader.seek(reader.position() + (size as usize).saturating_sub(16))?;
        for _ in 0..count {
            let _name = reader.read_u32()?;
            let (data_type, data) = read_value(reader)?;
            if is_reference(data_type) && data != 0 {
                store.add_reference_by_id(handle, data);
            }
        }
    } else {
        let (data_type, data) = read_value(reader)?;
        apply_simple_value(store, context, handle, data_type, data);
    }
    Ok(())
}

fn add_entry(
    store: &mut ResourceStore,
    context: &TypeContext<'_>,
    resource_type: ResourceType,
    key: u32,
    id: u32,
) -> ChunkResult<crate::model::ResourceId> {
    let name = context
        .key_names
        .get(key)
        .ok_or_else(|| ChunkError(format!("key index {} out of range for 0x{:08x}", key, id)))?;
    Ok(store.add_resource(Resource::new(
        Some(context.package),
        resource_type,
        name,
        Some(id),
    )))
}

fn read_value(reader: &mut BinaryReader<'_>) -> ChunkResult<(u8, u32)> {
    let _size = reader.read_u16()?;
    let _res0 = reader.read_u8()?;
    let data_type = reader.read_u8()?;
    let data = reader.read_u32()?;
    Ok((data_type, data))
}

fn is_reference(data_type: u8) -> bool {
    matches!(
        data_type,
        TYPE_REFERENCE | TYPE_ATTRIBUTE | TYPE_DYNAMIC_REFERENCE | TYPE_DYNAMIC_ATTRIBUTE
    )
}

fn apply_simple_value(
    store: &mut ResourceStore,
    context: &TypeContext<'_>,
    handle: crate::model::ResourceId,
    data_type: u8,
    data: u32,
) {
    if is_reference(data_type) {
        if data != 0 {
            store.add_reference_by_id(handle, data);
        }
        return;
    }
    if data_type == TYPE_STRING {
        if let Some(value) = context.values.get(data) {
            if value.starts_with("res/") {
                store.add_file(handle, value);
            } else {
                store.set_value(handle, value);
            }
        }
    }
}
