//! A compiler front-end that keeps recently compiled expressions.
use crate::ast::PathExpr;
use crate::config::CompilerConfig;
use crate::engine::{Matches, evaluate};
use crate::error::PathError;
use crate::parser::parse_path_with;
use arbor_node::TreeNode;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Compiles path expressions, caching results by source text.
///
/// The cache is a least-recently-used map bounded by
/// [`CompilerConfig::cache_capacity`]; entries only leave it when a new one
/// needs room or on [`clear`](Self::clear). A capacity of 0 turns caching
/// off. Failed compilations are never cached. A `PathCompiler` can be shared
/// between threads.
#[derive(Debug)]
pub struct PathCompiler {
    config: CompilerConfig,
    // `None` when caching is disabled.
    cache: Option<Mutex<LruCache<String, Arc<PathExpr>>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl Default for PathCompiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl PathCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            cache: NonZeroUsize::new(config.cache_capacity)
                .map(|capacity| Mutex::new(LruCache::new(capacity))),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn compile(&self, source: &str) -> Result<Arc<PathExpr>, PathError> {
        if let Some(hit) = self.lookup(source) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::trace!("path cache hit for '{}'", source);
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("compiling path expression '{}'", source);

        let expr = Arc::new(parse_path_with(source, &self.config)?);
        self.store(source, Arc::clone(&expr));
        Ok(expr)
    }

    /// Compiles `source` (through the cache) and evaluates it over `root`.
    pub fn evaluate<'a, N: TreeNode<'a>>(
        &self,
        root: N,
        source: &str,
    ) -> Result<Vec<N>, PathError> {
        let expr = self.compile(source)?;
        let matches: Matches<'a, '_, N> = evaluate(root, &expr);
        Ok(matches.collect())
    }

    pub fn len(&self) -> usize {
        self.entries().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.config.cache_capacity
    }

    pub fn contains(&self, source: &str) -> bool {
        self.entries().is_some_and(|entries| entries.contains(source))
    }

    pub fn clear(&self) {
        if let Some(mut entries) = self.entries() {
            entries.clear();
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    // The cache holds no invariant a panicking holder could break, so a
    // poisoned lock is simply taken over.
    fn entries(&self) -> Option<MutexGuard<'_, LruCache<String, Arc<PathExpr>>>> {
        let cache = self.cache.as_ref()?;
        Some(cache.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn lookup(&self, source: &str) -> Option<Arc<PathExpr>> {
        self.entries()?.get(source).map(Arc::clone)
    }

    fn store(&self, source: &str, expr: Arc<PathExpr>) {
        let Some(mut entries) = self.entries() else {
            return;
        };
        // Another thread may have compiled the same source meanwhile.
        if entries.get(source).is_some() {
            return;
        }
        if let Some((evicted, _)) = entries.push(source.to_string(), expr) {
            log::trace!("evicting path expression '{}'", evicted);
        }
    }
}
