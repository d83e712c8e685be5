//! Pure transformations over immutable trees.
//!
//! A [`Transform`] maps a tree to a new tree; a [`Shaper`] maps a tree to a
//! JSON value and can only end a [`Pipeline`]. Built-in transforms rebuild the
//! nodes on the path to each change and reuse every other subtree.

pub mod builtins;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod shape;
pub mod stage;

pub use arbor_node::{Order, fold};
pub use builtins::{filter_nodes, map_nodes, map_selected, prune, rename, set_attr};
pub use config::{Observer, PipelineConfig, StageStats};
pub use error::TransformError;
pub use pipeline::{Output, Pipeline};
pub use stage::{Shaper, Stage, Transform, or_else, then};
