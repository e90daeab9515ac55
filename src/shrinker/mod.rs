//! Shrinker driver
//!
//! Runs the analysis pipeline in order and rewrites archives from the result:
//!
//! 1. **Gathering** - declare resources from tables and symbol files
//! 2. **Mapping** - load the obfuscation mapping, if any
//! 3. **Recording** - seed reachability from code, manifests and directives
//! 4. **Graph building** - record references between resources
//! 5. **Possible resources** - guess targets of dynamic lookups
//! 6. **Closure** - propagate reachability, then apply keep and discard

mod dummy;
mod rewrite;

pub use dummy::{
    placeholder_for, LinkedResourcesFormat, TINY_9PNG, TINY_BINARY_XML, TINY_PNG, TINY_PROTO_XML,
};
pub use rewrite::{ArchiveRewriter, RewriteStats};

use crate::analysis::{unused_resources, PossibleResourceMarker, ReachabilityAnalyzer, UnusedResource};
use crate::error::{Result, ShrinkError};
use crate::gatherer::ResourceGatherer;
use crate::graph::{ResourceDir, ResourcesGraphBuilder};
use crate::model::{ResourceStore, ShrinkerModel};
use crate::proguard::ProguardMappingsRecorder;
use crate::usages::UsageRecorder;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Configured inputs plus the model produced by the last analysis
pub struct ResourceShrinker {
    gatherers: Vec<ResourceGatherer>,
    recorders: Vec<UsageRecorder>,
    mapping: Option<ProguardMappingsRecorder>,
    resource_dirs: Vec<ResourceDir>,
    support_multipackages: bool,
    precise_shrinking: bool,
    model: ShrinkerModel,
    analyzed: bool,
}

impl ResourceShrinker {
    pub fn new(support_multipackages: bool) -> Self {
        Self {
            gatherers: Vec::new(),
            recorders: Vec::new(),
            mapping: None,
            resource_dirs: Vec::new(),
            support_multipackages,
            precise_shrinking: false,
            model: ShrinkerModel::new(support_multipackages),
            analyzed: false,
        }
    }

    pub fn with_gatherer(mut self, gatherer: ResourceGatherer) -> Self {
        self.gatherers.push(gatherer);
        self
    }

    pub fn with_recorder(mut self, recorder: UsageRecorder) -> Self {
        self.recorders.push(recorder);
        self
    }

    pub fn with_mapping(mut self, recorder: ProguardMappingsRecorder) -> Self {
        self.mapping = Some(recorder);
        self
    }

    pub fn with_resource_dir(mut self, dir: ResourceDir) -> Self {
        self.resource_dirs.push(dir);
        self
    }

    /// Remove unused entries from archives instead of replacing their content
    pub fn with_precise_shrinking(mut self, precise: bool) -> Self {
        self.precise_shrinking = precise;
        self
    }

    /// Run the whole analysis from scratch, leaving the final reachability in the model
    pub fn analyze(&mut self) -> Result<()> {
        let start = Instant::now();
        self.model = ShrinkerModel::new(self.support_multipackages);
        self.analyzed = false;

        for gatherer in &self.gatherers {
            gatherer.gather(&mut self.model)?;
        }
        self.model.store.link_pending_references();
        info!("Declared {} resources", self.model.store.len());

        if let Some(mapping) = &self.mapping {
            mapping.record(&mut self.model)?;
        }

        let needs_entry_points = self.recorders.iter().any(UsageRecorder::is_entry_point_source);
        if needs_entry_points && !self.recorders.iter().any(UsageRecorder::has_entry_point_input) {
            return Err(ShrinkError::MissingInput {
                what: "code or manifest".to_string(),
            });
        }
        for recorder in &self.recorders {
            recorder.record(&mut self.model)?;
        }

        ResourcesGraphBuilder::new(self.resource_dirs.clone()).build(&mut self.model)?;

        PossibleResourceMarker::new().mark(&mut self.model);

        let analyzer = ReachabilityAnalyzer::new();
        let propagated = analyzer.propagate(&mut self.model.store);
        debug!("Closure marked {} more resources", propagated);
        let kept = analyzer.apply_keep(&mut self.model.store);
        let discarded = analyzer.apply_discard(&mut self.model.store);
        debug!("Keep directives marked {}, discard directives removed {}", kept, discarded);

        debug!("Resource model:\n{}", self.model.store.dump_resource_model());
        self.analyzed = true;

        info!(
            "Analysis complete: {} of {} resources unreachable ({:.2}s)",
            self.model.store.unreachable().len(),
            self.model.store.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    pub fn model(&self) -> &ShrinkerModel {
        &self.model
    }

    pub fn store(&self) -> &ResourceStore {
        &self.model.store
    }

    pub fn is_analyzed(&self) -> bool {
        self.analyzed
    }

    pub fn dump_resource_model(&self) -> String {
        self.model.store.dump_resource_model()
    }

    pub fn dump_config(&self) -> String {
        self.model.store.dump_config()
    }

    pub fn unused_resources(&self) -> Vec<UnusedResource> {
        unused_resources(&self.model.store)
    }

    pub fn rewrite_apk(
        &self,
        input: &Path,
        output: &Path,
        format: LinkedResourcesFormat,
    ) -> Result<RewriteStats> {
        self.rewriter()?.rewrite_apk(input, output, format)
    }

    /// `module_packages` maps bundle module names (`base`, `feature`) to package names
    pub fn rewrite_bundle(
        &self,
        input: &Path,
        output: &Path,
        module_packages: &HashMap<String, String>,
    ) -> Result<RewriteStats> {
        self.rewriter()?.rewrite_bundle(input, output, module_packages)
    }

    fn rewriter(&self) -> Result<ArchiveRewriter> {
        if !self.analyzed {
            return Err(ShrinkError::NotAnalyzed);
        }
        Ok(ArchiveRewriter::new(&self.model.store, self.precise_shrinking))
    }
}
