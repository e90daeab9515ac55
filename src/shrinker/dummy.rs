//! Placeholder contents for entries backing unreachable resources

/// Minimal 1x1 transparent RGBA PNG
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

/// Minimal 3x3 nine-patch with one stretchable pixel on the top and left borders
pub const TINY_9PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x03, 0x08, 0x06, 0x00, 0x00, 0x00, 0x56, 0x28, 0xB5,
    0xBF, 0x00, 0x00, 0x00, 0x11, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0x60, 0x80, 0x80, 0xFF,
    0x0C, 0xE8, 0x0C, 0x14, 0x00, 0x00, 0x34, 0xF2, 0x01, 0xFF, 0x34, 0xF3, 0xC1, 0x07, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Compiled binary XML for a single empty element `<x/>`
pub const TINY_BINARY_XML: &[u8] = &[
    0x03, 0x00, 0x08, 0x00, 0x6C, 0x00, 0x00, 0x00, 0x01, 0x00, 0x1C, 0x00, 0x28, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x78, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x01, 0x10, 0x00, 0x24, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x14, 0x00, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x03, 0x01, 0x10, 0x00, 0x18, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00,
];

/// Proto XML node `{ element { name: "x" } }`
pub const TINY_PROTO_XML: &[u8] = &[0x0A, 0x03, 0x1A, 0x01, 0x78];

/// Compiled XML flavour of the archive being rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkedResourcesFormat {
    /// `aapt` binary XML, as found in APKs
    #[default]
    Binary,
    /// `aapt2` proto XML, as found in app bundles and proto APKs
    Proto,
}

/// Placeholder bytes for an entry, chosen by file name
pub fn placeholder_for(entry_name: &str, format: LinkedResourcesFormat) -> &'static [u8] {
    let lower = entry_name.to_ascii_lowercase();
    if lower.ends_with(".9.png") {
        TINY_9PNG
    } else if lower.ends_with(".png") {
        TINY_PNG
    } else if lower.ends_with(".xml") {
        match format {
            LinkedResourcesFormat::Binary => TINY_BINARY_XML,
            LinkedResourcesFormat::Proto => TINY_PROTO_XML,
        }
    } else {
        &[]
    }
}
