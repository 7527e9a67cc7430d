//! Error types for context resolution

use std::any::TypeId;
use thiserror::Error;

/// Errors that can occur while registering or resolving through a [`Context`](crate::Context)
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// No provider for the type anywhere in the context chain
    #[error("No provider registered for: {type_name}")]
    NotFound {
        type_name: &'static str,
        type_id: TypeId,
    },

    /// A provider was re-entered while it was still constructing
    #[error("Circular dependency detected while resolving {type_name} (path: {})", .path.join(" -> "))]
    CircularDependency {
        type_name: &'static str,
        path: Vec<&'static str>,
    },

    /// A provider produced a value of a different type than the one it was keyed under
    #[error("Provider registered for {type_name} produced a value of another type")]
    TypeMismatch { type_name: &'static str },

    /// A constructor reported a failure
    #[error("Failed to create {type_name}: {reason}")]
    CreationFailed {
        type_name: &'static str,
        reason: String,
    },

    /// A `ContextRef` outlived the context it points to
    #[error("Context has been dropped")]
    ContextDropped,
}

impl DiError {
    /// Create a NotFound error for a type
    #[inline]
    pub fn not_found<T: ?Sized + 'static>() -> Self {
        Self::NotFound {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed<T: ?Sized + 'static>(reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// Create a TypeMismatch error
    #[inline]
    pub fn type_mismatch<T: ?Sized + 'static>() -> Self {
        Self::TypeMismatch {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// True for `NotFound`
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for context operations
pub type Result<T> = std::result::Result<T, DiError>;
