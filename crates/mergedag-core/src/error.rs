use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("lowest fringe requested over an empty fringe set")]
    EmptyFringe,

    #[error("dependency cycle detected at {0}")]
    DependencyCycle(String),
}

pub type Result<T> = std::result::Result<T, MergeError>;
