//! Binary fixture writers for tests
//!
//! Each builder emits the smallest well-formed file the readers accept, so tests
//! can describe inputs declaratively instead of checking in binary blobs.

use crate::parser::chunk::*;
use indexmap::IndexSet;

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

fn set_u32(out: &mut [u8], at: usize, v: u32) {
    out[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

/// A complete `ResStringPool` chunk
pub fn string_pool_chunk(strings: &[&str], utf8: bool) -> Vec<u8> {
    let mut data = Vec::new();
    let mut offsets = Vec::new();
    for s in strings {
        offsets.push(data.len() as u32);
        if utf8 {
            data.push(s.encode_utf16().count() as u8);
            data.push(s.len() as u8);
            data.extend_from_slice(s.as_bytes());
            data.push(0);
        } else {
            let units: Vec<u16> = s.encode_utf16().collect();
            push_u16(&mut data, units.len() as u16);
            for u in units {
                push_u16(&mut data, u);
            }
            push_u16(&mut data, 0);
        }
    }
    pad4(&mut data);

    let header_size = 28u32;
    let strings_start = header_size + 4 * strings.len() as u32;
    let mut out = Vec::new();
    push_u16(&mut out, RES_STRING_POOL_TYPE);
    push_u16(&mut out, header_size as u16);
    push_u32(&mut out, strings_start + data.len() as u32);
    push_u32(&mut out, strings.len() as u32);
    push_u32(&mut out, 0);
    push_u32(&mut out, if utf8 { STRING_FLAG_UTF8 } else { 0 });
    push_u32(&mut out, strings_start);
    push_u32(&mut out, 0);
    for offset in offsets {
        push_u32(&mut out, offset);
    }
    out.extend_from_slice(&data);
    out
}

fn string_index(pool: &mut IndexSet<String>, s: &str) -> u32 {
    pool.insert_full(s.to_string()).0 as u32
}

struct AxmlAttr {
    namespace: Option<String>,
    name: String,
    raw: String,
    data_type: u8,
    data: Option<u32>,
}

/// Compiled XML document builder
pub struct AxmlBuilder {
    name: String,
    attributes: Vec<AxmlAttr>,
    text: Option<String>,
    children: Vec<AxmlBuilder>,
}

impl AxmlBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, namespace: Option<&str>, name: &str, value: &str) -> Self {
        self.attributes.push(AxmlAttr {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            raw: value.to_string(),
            data_type: TYPE_STRING,
            data: None,
        });
        self
    }

    pub fn reference(mut self, namespace: Option<&str>, name: &str, raw: &str, id: u32) -> Self {
        self.attributes.push(AxmlAttr {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            raw: raw.to_string(),
            data_type: TYPE_REFERENCE,
            data: Some(id),
        });
        self
    }

    pub fn child(mut self, child: AxmlBuilder) -> Self {
        self.children.push(child);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    fn collect_strings(&self, pool: &mut IndexSet<String>) {
        string_index(pool, &self.name);
        for attr in &self.attributes {
            if let Some(ns) = &attr.namespace {
                string_index(pool, ns);
            }
            string_index(pool, &attr.name);
            string_index(pool, &attr.raw);
        }
        if let Some(text) = &self.text {
            string_index(pool, text);
        }
        for child in &self.children {
            child.collect_strings(pool);
        }
    }

    fn write_nodes(&self, pool: &mut IndexSet<String>, out: &mut Vec<u8>) {
        let name = string_index(pool, &self.name);

        push_u16(out, RES_XML_START_ELEMENT_TYPE);
        push_u16(out, 16);
        push_u32(out, 36 + 20 * self.attributes.len() as u32);
        push_u32(out, 1);
        push_u32(out, NO_ENTRY);
        push_u32(out, NO_ENTRY);
        push_u32(out, name);
        push_u16(out, 20);
        push_u16(out, 20);
        push_u16(out, self.attributes.len() as u16);
        push_u16(out, 0);
        push_u16(out, 0);
        push_u16(out, 0);
        for attr in &self.attributes {
            let ns = attr
                .namespace
                .as_deref()
                .map(|ns| string_index(pool, ns))
                .unwrap_or(NO_ENTRY);
            let raw = string_index(pool, &attr.raw);
            push_u32(out, ns);
            push_u32(out, string_index(pool, &attr.name));
            push_u32(out, raw);
            push_u16(out, 8);
            out.push(0);
            out.push(attr.data_type);
            push_u32(out, attr.data.unwrap_or(raw));
        }

        if let Some(text) = &self.text {
            let idx = string_index(pool, text);
            push_u16(out, RES_XML_CDATA_TYPE);
            push_u16(out, 16);
            push_u32(out, 28);
            push_u32(out, 1);
            push_u32(out, NO_ENTRY);
            push_u32(out, idx);
            push_u16(out, 8);
            out.push(0);
            out.push(TYPE_STRING);
            push_u32(out, idx);
        }

        for child in &self.children {
            child.write_nodes(pool, out);
        }

        push_u16(out, RES_XML_END_ELEMENT_TYPE);
        push_u16(out, 16);
        push_u32(out, 24);
        push_u32(out, 1);
        push_u32(out, NO_ENTRY);
        push_u32(out, NO_ENTRY);
        push_u32(out, name);
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = IndexSet::new();
        self.collect_strings(&mut pool);

        let mut nodes = Vec::new();
        self.write_nodes(&mut pool, &mut nodes);
        let strings: Vec<&str> = pool.iter().map(String::as_str).collect();
        let pool_chunk = string_pool_chunk(&strings, false);

        let mut out = Vec::new();
        push_u16(&mut out, RES_XML_TYPE);
        push_u16(&mut out, 8);
        push_u32(&mut out, (8 + pool_chunk.len() + nodes.len()) as u32);
        out.extend_from_slice(&pool_chunk);
        out.extend_from_slice(&nodes);
        out
    }
}

/// Value of one resource table entry
#[derive(Debug, Clone)]
pub enum ArscValue {
    String(String),
    Reference(u32),
    Int(u32),
    /// Complex entry: parent style plus (attribute, referenced resource) pairs
    Bag { parent: u32, items: Vec<(u32, u32)> },
}

struct ArscPackage {
    id: u32,
    name: String,
    types: Vec<(String, Vec<(String, ArscValue)>)>,
}

/// Resource table builder
///
/// Type IDs follow the order in which a type first appears in a package,
/// starting at 1, and entry indexes follow insertion order within the type.
/// The first `.entry()` of type `layout` in package `0x7f` is therefore
/// `0x7f010000`.
pub struct ArscBuilder {
    packages: Vec<ArscPackage>,
}

const TYPE_INT_DEC: u8 = 0x10;
const CONFIG_SIZE: usize = 64;

impl ArscBuilder {
    pub fn new() -> Self {
        Self { packages: Vec::new() }
    }

    pub fn package(mut self, id: u32, name: &str) -> Self {
        self.packages.push(ArscPackage {
            id,
            name: name.to_string(),
            types: Vec::new(),
        });
        self
    }

    /// Entries before any `.package()` go to package `0x7f` named `app`
    pub fn entry(mut self, resource_type: &str, name: &str, value: ArscValue) -> Self {
        if self.packages.is_empty() {
            self = self.package(0x7f, "app");
        }
        let Some(package) = self.packages.last_mut() else {
            return self;
        };
        match package.types.iter_mut().find(|(t, _)| t == resource_type) {
            Some((_, entries)) => entries.push((name.to_string(), value)),
            None => package
                .types
                .push((resource_type.to_string(), vec![(name.to_string(), value)])),
        }
        self
    }

    pub fn string(self, resource_type: &str, name: &str, value: &str) -> Self {
        self.entry(resource_type, name, ArscValue::String(value.to_string()))
    }

    pub fn file(self, resource_type: &str, name: &str, path: &str) -> Self {
        self.entry(resource_type, name, ArscValue::String(path.to_string()))
    }

    pub fn reference(self, resource_type: &str, name: &str, target: u32) -> Self {
        self.entry(resource_type, name, ArscValue::Reference(target))
    }

    pub fn int(self, resource_type: &str, name: &str, value: u32) -> Self {
        self.entry(resource_type, name, ArscValue::Int(value))
    }

    pub fn bag(self, resource_type: &str, name: &str, parent: u32, items: &[(u32, u32)]) -> Self {
        self.entry(
            resource_type,
            name,
            ArscValue::Bag {
                parent,
                items: items.to_vec(),
            },
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let mut values = IndexSet::new();
        for package in &self.packages {
            for (_, entries) in &package.types {
                for (_, value) in entries {
                    if let ArscValue::String(s) = value {
                        string_index(&mut values, s);
                    }
                }
            }
        }
        let value_strings: Vec<&str> = values.iter().map(String::as_str).collect();

        let mut body = string_pool_chunk(&value_strings, true);
        for package in &self.packages {
            body.extend_from_slice(&Self::package_chunk(package, &mut values));
        }

        let mut out = Vec::new();
        push_u16(&mut out, RES_TABLE_TYPE);
        push_u16(&mut out, 12);
        push_u32(&mut out, (12 + body.len()) as u32);
        push_u32(&mut out, self.packages.len() as u32);
        out.extend_from_slice(&body);
        out
    }

    fn package_chunk(package: &ArscPackage, values: &mut IndexSet<String>) -> Vec<u8> {
        let type_names: Vec<&str> = package.types.iter().map(|(t, _)| t.as_str()).collect();
        let mut keys = IndexSet::new();
        for (_, entries) in &package.types {
            for (name, _) in entries {
                string_index(&mut keys, name);
            }
        }
        let key_names: Vec<&str> = keys.iter().map(String::as_str).collect();
        let type_pool = string_pool_chunk(&type_names, false);
        let key_pool = string_pool_chunk(&key_names, false);

        let header_size = 288usize;
        let mut out = Vec::new();
        push_u16(&mut out, RES_TABLE_PACKAGE_TYPE);
        push_u16(&mut out, header_size as u16);
        push_u32(&mut out, 0);
        push_u32(&mut out, package.id);
        let mut name = Vec::new();
        for u in package.name.encode_utf16() {
            push_u16(&mut name, u);
        }
        name.resize(256, 0);
        out.extend_from_slice(&name);
        push_u32(&mut out, header_size as u32);
        push_u32(&mut out, type_names.len() as u32);
        push_u32(&mut out, (header_size + type_pool.len()) as u32);
        push_u32(&mut out, key_names.len() as u32);
        push_u32(&mut out, 0);
        out.extend_from_slice(&type_pool);
        out.extend_from_slice(&key_pool);

        for (type_index, (_, entries)) in package.types.iter().enumerate() {
            let type_id = (type_index + 1) as u8;

            push_u16(&mut out, RES_TABLE_TYPE_SPEC_TYPE);
            push_u16(&mut out, 16);
            push_u32(&mut out, 16 + 4 * entries.len() as u32);
            out.push(type_id);
            out.push(0);
            push_u16(&mut out, 0);
            push_u32(&mut out, entries.len() as u32);
            for _ in entries {
                push_u32(&mut out, 0);
            }

            let mut entry_data = Vec::new();
            let mut offsets = Vec::new();
            for (name, value) in entries {
                offsets.push(entry_data.len() as u32);
                let key = string_index(&mut keys, name);
                match value {
                    ArscValue::Bag { parent, items } => {
                        push_u16(&mut entry_data, 16);
                        push_u16(&mut entry_data, 0x0001);
                        push_u32(&mut entry_data, key);
                        push_u32(&mut entry_data, *parent);
                        push_u32(&mut entry_data, items.len() as u32);
                        for (attr, target) in items {
                            push_u32(&mut entry_data, *attr);
                            push_u16(&mut entry_data, 8);
                            entry_data.push(0);
                            entry_data.push(TYPE_REFERENCE);
                            push_u32(&mut entry_data, *target);
                        }
                    }
                    ArscValue::String(s) => {
                        let data = string_index(values, s);
                        push_simple_entry(&mut entry_data, key, TYPE_STRING, data);
                    }
                    ArscValue::Reference(id) => {
                        push_simple_entry(&mut entry_data, key, TYPE_REFERENCE, *id)
                    }
                    ArscValue::Int(v) => push_simple_entry(&mut entry_data, key, TYPE_INT_DEC, *v),
                }
            }

            let type_header = 20 + CONFIG_SIZE;
            let entries_start = type_header + 4 * entries.len();
            push_u16(&mut out, RES_TABLE_TYPE_TYPE);
            push_u16(&mut out, type_header as u16);
            push_u32(&mut out, (entries_start + entry_data.len()) as u32);
            out.push(type_id);
            out.push(0);
            push_u16(&mut out, 0);
            push_u32(&mut out, entries.len() as u32);
            push_u32(&mut out, entries_start as u32);
            let mut config = vec![0u8; CONFIG_SIZE];
            set_u32(&mut config, 0, CONFIG_SIZE as u32);
            out.extend_from_slice(&config);
            for offset in offsets {
                push_u32(&mut out, offset);
            }
            out.extend_from_slice(&entry_data);
        }

        let size = out.len() as u32;
        set_u32(&mut out, 4, size);
        out
    }
}

fn push_simple_entry(out: &mut Vec<u8>, key: u32, data_type: u8, data: u32) {
    push_u16(out, 8);
    push_u16(out, 0);
    push_u32(out, key);
    push_u16(out, 8);
    out.push(0);
    out.push(data_type);
    push_u32(out, data);
}

impl Default for ArscBuilder {
    fn default() -> Self {
        Self::new()
    }
}

enum Insn {
    Const(u32),
    ConstHigh16(u16),
    ConstString(String),
    Sget(String, String),
    Invoke(String, String),
    ArrayData(Vec<u32>),
}

/// Name of the method each built class defines
const OWN_METHOD: &str = "run";

/// Dex builder: every class gets one method holding the instructions added after it
pub struct DexBuilder {
    classes: Vec<(String, Vec<Insn>)>,
}

impl DexBuilder {
    pub fn new() -> Self {
        Self { classes: Vec::new() }
    }

    pub fn class(mut self, descriptor: &str) -> Self {
        self.classes.push((descriptor.to_string(), Vec::new()));
        self
    }

    /// Instructions before any `.class()` go to a class named `LMain;`
    fn push(mut self, insn: Insn) -> Self {
        if self.classes.is_empty() {
            self = self.class("LMain;");
        }
        if let Some((_, insns)) = self.classes.last_mut() {
            insns.push(insn);
        }
        self
    }

    pub fn const_int(self, value: u32) -> Self {
        self.push(Insn::Const(value))
    }

    pub fn const_high16(self, high: u16) -> Self {
        self.push(Insn::ConstHigh16(high))
    }

    pub fn const_string(self, value: &str) -> Self {
        self.push(Insn::ConstString(value.to_string()))
    }

    pub fn sget(self, owner: &str, field: &str) -> Self {
        self.push(Insn::Sget(owner.to_string(), field.to_string()))
    }

    pub fn invoke(self, owner: &str, method: &str) -> Self {
        self.push(Insn::Invoke(owner.to_string(), method.to_string()))
    }

    pub fn array_data(self, values: &[u32]) -> Self {
        self.push(Insn::ArrayData(values.to_vec()))
    }

    pub fn build(&self) -> Vec<u8> {
        let mut strings: IndexSet<String> = IndexSet::new();
        let mut types: IndexSet<String> = IndexSet::new();
        let mut fields: IndexSet<(String, String)> = IndexSet::new();
        let mut methods: IndexSet<(String, String)> = IndexSet::new();

        // Every method shares the `()V` prototype and every field is an int
        types.insert("V".to_string());
        types.insert("I".to_string());
        strings.insert("V".to_string());

        for (class, insns) in &self.classes {
            types.insert(class.clone());
            methods.insert((class.clone(), OWN_METHOD.to_string()));
            for insn in insns {
                match insn {
                    Insn::ConstString(s) => {
                        strings.insert(s.clone());
                    }
                    Insn::Sget(owner, name) => {
                        types.insert(owner.clone());
                        fields.insert((owner.clone(), name.clone()));
                    }
                    Insn::Invoke(owner, name) => {
                        types.insert(owner.clone());
                        methods.insert((owner.clone(), name.clone()));
                    }
                    _ => {}
                }
            }
        }
        for t in &types {
            strings.insert(t.clone());
        }
        for (_, name) in fields.iter().chain(methods.iter()) {
            strings.insert(name.clone());
        }

        let code: Vec<Vec<u16>> = self
            .classes
            .iter()
            .map(|(_, insns)| Self::assemble(insns, &strings, &fields, &methods))
            .collect();

        let string_ids_off = 0x70;
        let type_ids_off = string_ids_off + 4 * strings.len();
        let proto_ids_off = type_ids_off + 4 * types.len();
        let field_ids_off = proto_ids_off + 12;
        let method_ids_off = field_ids_off + 8 * fields.len();
        let class_defs_off = method_ids_off + 8 * methods.len();
        let data_off = class_defs_off + 32 * self.classes.len();

        let mut out = vec![0u8; data_off];
        out[0..8].copy_from_slice(b"dex\n035\0");
        set_u32(&mut out, 0x24, 0x70);
        set_u32(&mut out, 0x28, 0x1234_5678);
        for (at, value) in [
            (0x38, strings.len()),
            (0x3C, string_ids_off),
            (0x40, types.len()),
            (0x44, type_ids_off),
            (0x48, 1),
            (0x4C, proto_ids_off),
            (0x50, fields.len()),
            (0x54, field_ids_off),
            (0x58, methods.len()),
            (0x5C, method_ids_off),
            (0x60, self.classes.len()),
            (0x64, class_defs_off),
            (0x6C, data_off),
        ] {
            set_u32(&mut out, at, value as u32);
        }

        let str_idx = |s: &str| strings.get_index_of(s).unwrap_or(0) as u32;
        let type_idx = |s: &str| types.get_index_of(s).unwrap_or(0) as u32;

        for (i, t) in types.iter().enumerate() {
            set_u32(&mut out, type_ids_off + 4 * i, str_idx(t));
        }
        // shorty, return type, no parameter list
        set_u32(&mut out, proto_ids_off, str_idx("V"));
        set_u32(&mut out, proto_ids_off + 4, type_idx("V"));
        for (i, (owner, name)) in fields.iter().enumerate() {
            let at = field_ids_off + 8 * i;
            out[at..at + 2].copy_from_slice(&(type_idx(owner) as u16).to_le_bytes());
            out[at + 2..at + 4].copy_from_slice(&(type_idx("I") as u16).to_le_bytes());
            set_u32(&mut out, at + 4, str_idx(name));
        }
        for (i, (owner, name)) in methods.iter().enumerate() {
            let at = method_ids_off + 8 * i;
            out[at..at + 2].copy_from_slice(&(type_idx(owner) as u16).to_le_bytes());
            set_u32(&mut out, at + 4, str_idx(name));
        }

        for (i, ((class, _), units)) in self.classes.iter().zip(&code).enumerate() {
            pad4(&mut out);
            let code_off = out.len();
            push_u16(&mut out, 4);
            push_u16(&mut out, 1);
            push_u16(&mut out, 1);
            push_u16(&mut out, 0);
            push_u32(&mut out, 0);
            push_u32(&mut out, units.len() as u32);
            for u in units {
                push_u16(&mut out, *u);
            }

            let own = methods
                .get_index_of(&(class.clone(), OWN_METHOD.to_string()))
                .unwrap_or(0);
            let class_data_off = out.len();
            for v in [0u32, 0, 1, 0, own as u32, 1, code_off as u32] {
                write_uleb128(&mut out, v);
            }

            let at = class_defs_off + 32 * i;
            set_u32(&mut out, at, type_idx(class));
            set_u32(&mut out, at + 4, 1);
            set_u32(&mut out, at + 8, 0xFFFF_FFFF);
            set_u32(&mut out, at + 16, 0xFFFF_FFFF);
            set_u32(&mut out, at + 24, class_data_off as u32);
        }

        for (i, s) in strings.iter().enumerate() {
            let here = out.len() as u32;
            set_u32(&mut out, string_ids_off + 4 * i, here);
            write_uleb128(&mut out, s.encode_utf16().count() as u32);
            out.extend_from_slice(&cesu8::to_java_cesu8(s));
            out.push(0);
        }

        let file_size = out.len() as u32;
        set_u32(&mut out, 0x20, file_size);
        out
    }

    fn assemble(
        insns: &[Insn],
        strings: &IndexSet<String>,
        fields: &IndexSet<(String, String)>,
        methods: &IndexSet<(String, String)>,
    ) -> Vec<u16> {
        let mut units = Vec::new();
        let mut payloads: Vec<(usize, &Vec<u32>)> = Vec::new();

        for insn in insns {
            match insn {
                Insn::Const(v) => units.extend([0x0014, *v as u16, (*v >> 16) as u16]),
                Insn::ConstHigh16(h) => units.extend([0x0015, *h]),
                Insn::ConstString(s) => {
                    units.extend([0x001a, strings.get_index_of(s.as_str()).unwrap_or(0) as u16])
                }
                Insn::Sget(owner, name) => {
                    let idx = fields.get_index_of(&(owner.clone(), name.clone())).unwrap_or(0);
                    units.extend([0x0060, idx as u16]);
                }
                Insn::Invoke(owner, name) => {
                    // invoke-virtual {v0}
                    let idx = methods.get_index_of(&(owner.clone(), name.clone())).unwrap_or(0);
                    units.extend([0x106e, idx as u16, 0]);
                }
                Insn::ArrayData(values) => {
                    payloads.push((units.len(), values));
                    units.extend([0x0026, 0, 0]);
                }
            }
        }
        // return-void
        units.push(0x000e);

        for (at, values) in payloads {
            if units.len() % 2 != 0 {
                units.push(0x0000);
            }
            let offset = (units.len() - at) as u32;
            units[at + 1] = offset as u16;
            units[at + 2] = (offset >> 16) as u16;
            units.extend([0x0300, 4, values.len() as u16, (values.len() >> 16) as u16]);
            for v in values {
                units.extend([*v as u16, (*v >> 16) as u16]);
            }
        }
        units
    }
}

impl Default for DexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn write_uleb128(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}
