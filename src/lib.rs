//! resshrink - Find and strip unreachable resources from Android archives
//!
//! This library computes which Android resources an app can reach and
//! rewrites APKs and app bundles with the unreachable ones replaced by tiny
//! placeholders, or removed outright.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Gathering** - Declare resources from compiled tables or R.txt files
//! 2. **Usage Recording** - Mark resources used by code, manifests and keep files
//! 3. **Graph Building** - Record references between resources from res/ contents
//! 4. **Possible Resources** - Guess targets of name-based lookups
//! 5. **Reachability Analysis** - Propagate marks, then apply keep and discard
//! 6. **Rewriting** - Replace or drop archive entries of unreachable resources

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod error;
pub mod gatherer;
pub mod graph;
pub mod model;
pub mod parser;
pub mod proguard;
pub mod report;
pub mod shrinker;
pub mod usages;

#[doc(hidden)]
pub mod testing;

pub use analysis::{PossibleResourceMarker, ReachabilityAnalyzer, UnusedResource};
pub use config::ShrinkConfig;
pub use discovery::InputFinder;
pub use error::{Result, ShrinkError};
pub use gatherer::ResourceGatherer;
pub use graph::{ResourceDir, ResourcesGraphBuilder};
pub use model::{Resource, ResourceStore, ResourceType, ShrinkerModel};
pub use report::{ReportFormat, Reporter};
pub use shrinker::{LinkedResourcesFormat, ResourceShrinker, RewriteStats};
pub use usages::UsageRecorder;
