// Android resource chunk primitives shared by the resource table and binary XML readers

use thiserror::Error;

pub const RES_STRING_POOL_TYPE: u16 = 0x0001;
pub const RES_TABLE_TYPE: u16 = 0x0002;
pub const RES_XML_TYPE: u16 = 0x0003;

pub const RES_XML_START_NAMESPACE_TYPE: u16 = 0x0100;
pub const RES_XML_END_NAMESPACE_TYPE: u16 = 0x0101;
pub const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
pub const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;
pub const RES_XML_CDATA_TYPE: u16 = 0x0104;
pub const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;

pub const RES_TABLE_PACKAGE_TYPE: u16 = 0x0200;
pub const RES_TABLE_TYPE_TYPE: u16 = 0x0201;
pub const RES_TABLE_TYPE_SPEC_TYPE: u16 = 0x0202;
pub const RES_TABLE_LIBRARY_TYPE: u16 = 0x0203;

pub const NO_ENTRY: u32 = 0xFFFF_FFFF;
pub const STRING_FLAG_UTF8: u32 = 0x0000_0100;

// Res_value data types
pub const TYPE_NULL: u8 = 0x00;
pub const TYPE_REFERENCE: u8 = 0x01;
pub const TYPE_ATTRIBUTE: u8 = 0x02;
pub const TYPE_STRING: u8 = 0x03;
pub const TYPE_DYNAMIC_REFERENCE: u8 = 0x07;
pub const TYPE_DYNAMIC_ATTRIBUTE: u8 = 0x08;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ChunkError(pub String);

pub type ChunkResult<T> = std::result::Result<T, ChunkError>;

/// Little-endian cursor over a chunk buffer
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BinaryReader { data, pos: 0 }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    fn take(&mut self, n: usize) -> ChunkResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| ChunkError(format!("unexpected end of data at offset {}", self.pos)))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> ChunkResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> ChunkResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> ChunkResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_bytes(&mut self, n: usize) -> ChunkResult<&'a [u8]> {
        self.take(n)
    }

    pub fn seek(&mut self, offset: usize) -> ChunkResult<()> {
        if offset > self.data.len() {
            return Err(ChunkError(format!(
                "offset {} past end of data ({} bytes)",
                offset,
                self.data.len()
            )));
        }
        self.pos = offset;
        Ok(())
    }
}

/// `ResChunk_header` plus the absolute offset it was read from
#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
    pub chunk_type: u16,
    pub header_size: u16,
    pub chunk_size: u32,
    pub start: usize,
}

impl ChunkHeader {
    pub fn read(reader: &mut BinaryReader<'_>) -> ChunkResult<Self> {
        let start = reader.position();
        let chunk_type = reader.read_u16()?;
        let header_size = reader.read_u16()?;
        let chunk_size = reader.read_u32()?;
        if (header_size as u32) < 8 || chunk_size < header_size as u32 {
            return Err(ChunkError(format!(
                "invalid chunk 0x{:04x} at offset {}: header {} size {}",
                chunk_type, start, header_size, chunk_size
            )));
        }
        if start + chunk_size as usize > reader.len() {
            return Err(ChunkError(format!(
                "chunk 0x{:04x} at offset {} overruns data",
                chunk_type, start
            )));
        }
        Ok(Self {
            chunk_type,
            header_size,
            chunk_size,
            start,
        })
    }

    pub fn body_start(&self) -> usize {
        self.start + self.header_size as usize
    }

    pub fn end(&self) -> usize {
        self.start + self.chunk_size as usize
    }
}

/// Decoded `ResStringPool`
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    /// Parse a string pool whose header has already been read
    pub fn parse(reader: &mut BinaryReader<'_>, header: &ChunkHeader) -> ChunkResult<Self> {
        if header.chunk_type != RES_STRING_POOL_TYPE {
            return Err(ChunkError(format!(
                "expected string pool, found chunk 0x{:04x}",
                header.chunk_type
            )));
        }
        let string_count = reader.read_u32()? as usize;
        let _style_count = reader.read_u32()?;
        let flags = reader.read_u32()?;
        let strings_start = reader.read_u32()? as usize;
        let _styles_start = reader.read_u32()?;
        reader.seek(header.body_start())?;

        let is_utf8 = flags & STRING_FLAG_UTF8 != 0;
        let mut offsets = Vec::with_capacity(string_count.min(header.chunk_size as usize / 4));
        for _ in 0..string_count {
            offsets.push(reader.read_u32()? as usize);
        }

        let data = reader.data();
        let base = header.start + strings_start;
        let end = header.end();
        let mut strings = Vec::with_capacity(offsets.len());
        for offset in offsets {
            let at = base + offset;
            let text = if is_utf8 {
                read_utf8_string(data, at, end)?
            } else {
                read_utf16_string(data, at, end)?
            };
            strings.push(text);
        }

        reader.seek(end)?;
        Ok(Self { strings })
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        if index == NO_ENTRY {
            return None;
        }
        self.strings.get(index as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

fn read_utf8_string(data: &[u8], at: usize, end: usize) -> ChunkResult<String> {
    let mut pos = at;
    let byte = |pos: usize| -> ChunkResult<u8> {
        if pos < end {
            Ok(data[pos])
        } else {
            Err(ChunkError(format!("string offset {} out of bounds", pos)))
        }
    };
    // UTF-16 length, then UTF-8 length; each one or two bytes
    let first = byte(pos)?;
    pos += if first & 0x80 != 0 { 2 } else { 1 };
    let mut len = byte(pos)? as usize;
    if len & 0x80 != 0 {
        len = ((len & 0x7F) << 8) | byte(pos + 1)? as usize;
        pos += 2;
    } else {
        pos += 1;
    }
    if pos + len > end {
        return Err(ChunkError(format!("string at {} overruns string pool", at)));
    }
    Ok(String::from_utf8_lossy(&data[pos..pos + len]).into_owned())
}

fn read_utf16_string(data: &[u8], at: usize, end: usize) -> ChunkResult<String> {
    let unit = |pos: usize| -> ChunkResult<u16> {
        if pos + 2 <= end {
            Ok(u16::from_le_bytes([data[pos], data[pos + 1]]))
        } else {
            Err(ChunkError(format!("string offset {} out of bounds", pos)))
        }
    };
    let mut pos = at;
    let mut len = unit(pos)? as usize;
    pos += 2;
    if len & 0x8000 != 0 {
        len = ((len & 0x7FFF) << 16) | unit(pos)? as usize;
        pos += 2;
    }
    if pos + len * 2 > end {
        return Err(ChunkError(format!("string at {} overruns string pool", at)));
    }
    let units: Vec<u16> = (0..len)
        .map(|i| u16::from_le_bytes([data[pos + i * 2], data[pos + i * 2 + 1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

/// Read a fixed-size, NUL-padded UTF-16 field (package names)
pub fn read_fixed_utf16(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|u| *u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}
