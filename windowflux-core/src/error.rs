// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for the windowflux reactive-streams operator.
//!
//! Mirrors the shape of a typical Rx-style error hierarchy: a handful of
//! well-known protocol violations plus an escape hatch for user code.

/// Root error type for all windowflux operations.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    /// The upstream source terminated with an error.
    #[error("upstream error: {context}")]
    StreamError {
        /// Description of what went wrong upstream.
        context: String,
    },

    /// A predicate or other user-supplied callback panicked or returned an error.
    #[error("user callback error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A subscriber issued `request(n)` with `n <= 0`.
    #[error("invalid request: {requested} (must be positive)")]
    InvalidRequest {
        /// The offending requested amount.
        requested: i64,
    },

    /// A second subscriber tried to subscribe to an already-subscribed `WindowFlux`.
    #[error("this window has already been subscribed to")]
    AlreadySubscribed,
}

impl WindowError {
    /// Create a stream error with the given context.
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamError {
            context: context.into(),
        }
    }

    /// Wrap a user error (e.g. a predicate's `Err` or a caught panic payload).
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Build a `WindowError` from a caught `catch_unwind` panic payload.
    #[must_use]
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let context = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "predicate panicked".to_string()
        };
        Self::StreamError {
            context: format!("predicate panicked: {context}"),
        }
    }
}

impl Clone for WindowError {
    fn clone(&self) -> Self {
        match self {
            Self::StreamError { context } => Self::StreamError {
                context: context.clone(),
            },
            // Boxed user errors can't be cloned; preserve their message instead.
            Self::UserError(e) => Self::StreamError {
                context: format!("user error: {e}"),
            },
            Self::InvalidRequest { requested } => Self::InvalidRequest {
                requested: *requested,
            },
            Self::AlreadySubscribed => Self::AlreadySubscribed,
        }
    }
}

/// Specialized `Result` type for windowflux operations.
pub type Result<T> = std::result::Result<T, WindowError>;
