//! Dot-notation path expressions over immutable trees.
//!
//! # Syntax
//!
//! - `app.config` - names separated by unescaped dots; `\.` and `\\` escape
//! - `*` - exactly one level, any name
//! - `**` - zero or more levels (`a.**` matches `a` and everything below it)
//! - `conf*`, `*base` - glob on the name
//! - `~db\d+` - anchored regex on the name. The regex ends at the next
//!   unescaped dot, so write its wildcard dot as `\.` (`~con\.*`) and a
//!   literal dot as `[.]`
//! - `%confg:0.8` - fuzzy name match with a similarity threshold; `%confg:1.x`
//!   is a threshold of 1 followed by the segment `x`
//! - `[key=value]`, `[key]` - attribute equality / existence on the current node
//! - `[?(@.size > 10 and @.kind == 'disk')]` - attribute predicate
//!
//! # Example
//!
//! ```ignore
//! use arbor_path::{PathCompiler, evaluate};
//!
//! let compiler = PathCompiler::default();
//! let expr = compiler.compile("app.**[debug=true]")?;
//! for node in evaluate(tree.root(), &expr) {
//!     println!("{}", node.path());
//! }
//! ```

pub mod ast;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod matching;
mod parser;

// --- Public API ---
pub use ast::{CmpOp, Operand, PathExpr, Predicate, RegexPattern, Segment};
pub use compiler::PathCompiler;
pub use config::CompilerConfig;
pub use engine::{Matches, evaluate};
pub use error::PathError;
pub use matching::{glob_match, similarity};
pub use parser::{parse_path, parse_path_with};

impl PathExpr {
    /// Compiles `source` without going through a cache.
    pub fn parse(source: &str) -> Result<Self, PathError> {
        parse_path(source)
    }
}

impl std::str::FromStr for PathExpr {
    type Err = PathError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        parse_path(source)
    }
}

/// Compiles `source` with the default configuration, uncached.
pub fn compile(source: &str) -> Result<PathExpr, PathError> {
    parse_path(source)
}
