use crate::cache::ResourceCache;
use crate::config::{ConfigStore, SchemaRegistry};
use crate::metrics::ModMetrics;
use crate::paths::PathRoots;
use std::sync::Arc;

/// Handle to the process-wide mod services.
///
/// Construct once at startup and clone it into every component that needs
/// to resolve paths, read documents or load resources. Clones share the same
/// cache, schema registry and metrics.
#[derive(Debug, Clone)]
pub struct ModContext {
    pub roots: PathRoots,
    pub store: ConfigStore,
    pub cache: Arc<ResourceCache>,
    pub metrics: Arc<ModMetrics>,
}

impl ModContext {
    /// Context with the built-in document schemas.
    pub fn new(roots: PathRoots) -> Self {
        Self::with_registry(roots, SchemaRegistry::with_builtin())
    }

    /// Context decoding through a host-supplied registry.
    pub fn with_registry(roots: PathRoots, registry: SchemaRegistry) -> Self {
        let metrics = Arc::new(ModMetrics::new());
        Self {
            roots,
            store: ConfigStore::new(Arc::new(registry)).with_metrics(Arc::clone(&metrics)),
            cache: Arc::new(ResourceCache::with_metrics(Arc::clone(&metrics))),
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TextureKind;
    use camino::Utf8Path;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_clones_share_services() {
        let context = ModContext::new(PathRoots::single("/data"));
        let clone = context.clone();

        assert!(Arc::ptr_eq(&context.cache, &clone.cache));
        assert!(Arc::ptr_eq(&context.metrics, &clone.metrics));
        assert!(Arc::ptr_eq(context.store.metrics(), &context.metrics));
    }

    #[test]
    fn test_cache_reports_to_context_metrics() {
        let context = ModContext::new(PathRoots::default());
        context
            .cache
            .load(Utf8Path::new("/definitely/missing"), "a.png", true, TextureKind::Standard);

        assert_eq!(context.metrics.cache_misses.load(Ordering::Relaxed), 1);
    }
}
