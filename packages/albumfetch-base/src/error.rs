//! Error model shared by every engine component
//!
//! Internally there is exactly one error type carrying a kind and the
//! hierarchy scope it failed in. The externally raised representation is a
//! registry-held adapter function applied at the public boundary, so a single
//! substitution changes the concrete type produced by every raise site.

use std::fmt;
use std::sync::Arc;

/// Kinds of engine failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Remote entity absent
    NotFound,
    /// Unregistered or malformed extension-point key or option value
    Configuration,
    /// Wrapped network/transport failure
    Transport,
    /// Retry bound exhausted under the abort policy
    RetryExhausted,
    /// Run cancelled before completion
    Cancelled,
}

/// Hierarchy level an error is attributable to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    Album(String),
    Photo(String),
    Image {
        id: String,
        index: usize,
    },
    Run,
    #[default]
    None,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Album(id) => write!(f, "album {}", id),
            Scope::Photo(id) => write!(f, "photo {}", id),
            Scope::Image { id, index } => write!(f, "image {} (index {})", id, index),
            Scope::Run => write!(f, "run"),
            Scope::None => Ok(()),
        }
    }
}

/// The engine's internal error type.
#[derive(Debug, Clone)]
pub struct EngineError {
    pub kind: ErrorKind,
    pub message: String,
    pub scope: Scope,
}

impl EngineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            scope: Scope::None,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn retry_exhausted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RetryExhausted, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope == Scope::None {
            write!(f, "{:?}: {}", self.kind, self.message)
        } else {
            write!(f, "{:?}: {} ({})", self.kind, self.message, self.scope)
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type used throughout the engine crates.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Boxed error type produced at the public boundary.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Translation function from the internal error to the registered external
/// representation.
pub type ErrorAdapter = Arc<dyn Fn(EngineError) -> BoxedError + Send + Sync>;

/// Default adapter: surface the engine error unchanged.
pub fn default_adapter() -> ErrorAdapter {
    Arc::new(|err| Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_scope_and_id() {
        let err = EngineError::not_found("no album with id 999999")
            .with_scope(Scope::Album("999999".into()));
        let text = err.to_string();
        assert!(text.contains("NotFound"));
        assert!(text.contains("999999"));
        assert!(text.contains("album"));
    }

    #[test]
    fn test_default_adapter_preserves_engine_error() {
        let boxed = default_adapter()(EngineError::configuration("bad key"));
        let engine = boxed.downcast_ref::<EngineError>().unwrap();
        assert_eq!(engine.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_custom_adapter_changes_raised_type() {
        #[derive(Debug)]
        struct MyError(String);

        impl std::fmt::Display for MyError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "my error: {}", self.0)
            }
        }

        impl std::error::Error for MyError {}

        let adapter: ErrorAdapter = Arc::new(|err| Box::new(MyError(err.to_string())));
        let boxed = adapter(EngineError::transport("connection reset"));
        assert!(boxed.downcast_ref::<MyError>().is_some());
        assert!(boxed.to_string().contains("connection reset"));
    }
}
