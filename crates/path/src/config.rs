#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompilerConfig {
    /// The maximum number of compiled expressions kept by a `PathCompiler`.
    /// When full, the least recently used entry is evicted.
    ///
    /// `0` disables caching. Defaults to `256`.
    pub cache_capacity: usize,

    /// Threshold used by `%name` segments that do not give one explicitly.
    ///
    /// Defaults to `0.8`.
    pub default_fuzzy_threshold: f64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
            default_fuzzy_threshold: 0.8,
        }
    }
}
