use thiserror::Error;

use crate::models::Role;
use crate::tracker::TrackerError;

/// Why a document could not be turned into features.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("document is empty")]
    Empty,

    #[error("document contains no 'Feature:' blocks")]
    NoFeatures,
}

/// An abstract role has no matching issue type in the project.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no issue type for {role} (configured as '{configured}'); available types: {}", available.join(", "))]
    TypeNotFound {
        role: Role,
        configured: String,
        available: Vec<String>,
    },
}

/// Errors that abort a run before anything is created.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("the {0} shape needs a parent issue key to create issues under")]
    MissingParentKey(&'static str),

    #[error("project key is required")]
    MissingProject,

    #[error("'{0}' is not a valid project key")]
    InvalidProjectKey(String),

    #[error("tracker request failed: {0}")]
    Tracker(#[from] TrackerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
