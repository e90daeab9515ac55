mod loader;

pub use loader::{ArchiveConfig, ArchiveFormat, LinkedFormat, ModuleConfig, ShrinkConfig};
