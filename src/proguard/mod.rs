//! ProGuard/R8 integration
//!
//! Reads the obfuscation mapping so that renamed resource-accessor classes and
//! fields seen in compiled code can be attributed back to their resources.

mod mapping;

pub use mapping::{ObfuscationMapping, ProguardMappingsRecorder};
