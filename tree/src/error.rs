//! Error types for tree construction, value access and mutation.

use inspector_core::CoercionError;
use thiserror::Error;

use crate::node::NodeId;

/// Errors raised by [`TreeObject`](crate::TreeObject) operations.
///
/// None of these leave the tree in an inconsistent state: a failed get,
/// set or mutation can simply be retried by the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error(transparent)]
    Coercion(#[from] CoercionError),
    #[error("Node {0:?} does not exist in this generation of the tree")]
    StaleNode(NodeId),
    #[error("No node registered at path '{0}'")]
    PathNotFound(String),
    #[error("Parent object of '{0}' is missing")]
    MissingParent(String),
    #[error("'{0}' is not an array or list")]
    NotArray(String),
    #[error("'{0}' is not an array element")]
    NotElement(String),
    #[error("'{0}' does not hold an object")]
    NotAnObject(String),
    #[error("Container at '{0}' was never initialized")]
    Uninitialized(String),
    #[error("Index {index} out of range for '{path}' (len {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
    #[error("Elements of '{0}' have no default value to grow with")]
    NoDefaultElement(String),
    #[error("Property '{0}' has no setter")]
    ReadOnly(String),
    #[error("'{0}' cannot be assigned")]
    NotAssignable(String),
    #[error("'{0}' is not a method")]
    NotInvocable(String),
    #[error("Invalid settings: {0}")]
    Settings(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

pub type TreeResult<T> = Result<T, TreeError>;
