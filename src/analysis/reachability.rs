use crate::model::{ResourceId, ResourceStore};
use std::collections::HashSet;
use tracing::debug;

/// Reachability closure and the keep/discard override passes
pub struct ReachabilityAnalyzer;

impl ReachabilityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Propagate from every resource already marked reachable until fixpoint
    ///
    /// Returns the number of resources newly marked.
    pub fn propagate(&self, store: &mut ResourceStore) -> usize {
        let roots: Vec<ResourceId> = store.ids().filter(|id| store.is_reachable(*id)).collect();
        self.propagate_from(store, roots)
    }

    /// Mark the given roots reachable and everything they transitively reference
    pub fn propagate_from(
        &self,
        store: &mut ResourceStore,
        roots: impl IntoIterator<Item = ResourceId>,
    ) -> usize {
        // Worklist with an explicit visited set; reference graphs may be cyclic
        let mut visited = vec![false; store.len()];
        let mut worklist: Vec<ResourceId> = Vec::new();
        let mut newly = 0;

        for root in roots {
            if store.mark_reachable(root) {
                newly += 1;
            }
            worklist.push(root);
        }

        while let Some(id) = worklist.pop() {
            if std::mem::replace(&mut visited[id.index()], true) {
                continue;
            }
            let references: Vec<ResourceId> = store.get(id).references().collect();
            for reference in references {
                if store.mark_reachable(reference) {
                    newly += 1;
                }
                if !visited[reference.index()] {
                    worklist.push(reference);
                }
            }
        }
        newly
    }

    /// Force every kept resource reachable and propagate from it
    pub fn apply_keep(&self, store: &mut ResourceStore) -> usize {
        let kept = store.matching(store.keep_patterns());
        debug!("Keep directives match {} resources", kept.len());
        self.propagate_from(store, kept)
    }

    /// Force discarded resources unreachable without touching what they reference
    ///
    /// A resource matched by both a keep and a discard directive stays reachable.
    pub fn apply_discard(&self, store: &mut ResourceStore) -> usize {
        let discarded = store.matching(store.discard_patterns());
        let kept: HashSet<ResourceId> = store.matching(store.keep_patterns()).into_iter().collect();
        let mut count = 0;
        for id in discarded {
            if kept.contains(&id) {
                debug!("{} is both kept and discarded; keeping it", store.get(id).url(true));
                continue;
            }
            store.force_unreachable(id);
            count += 1;
        }
        count
    }
}

impl Default for ReachabilityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
