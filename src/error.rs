use arbor_node::TreeError;
use arbor_path::PathError;
use arbor_transform::TransformError;
use thiserror::Error;

/// Any error raised by the arbor crates.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid path expression: {0}")]
    Path(#[from] PathError),

    #[error("Structural violation: {0}")]
    Tree(#[from] TreeError),

    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
