//! Error taxonomy shared by every pipeline component.
//!
//! Each variant maps onto a stable kind the transport layer can translate:
//! caller mistakes ([`PipelineError::Validation`], [`PipelineError::EmptySource`]),
//! missing references ([`PipelineError::NotFound`]) and internal failures
//! ([`PipelineError::Storage`], [`PipelineError::Build`]). Internal failures are
//! logged with full detail but reported generically to end users via
//! [`PipelineError::public_message`].

use std::io;

use thiserror::Error;

/// Crate-wide error type for the regeneration pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad or missing caller input; retrying without fixing the input will not help.
    #[error("{0}")]
    Validation(String),

    /// A referenced icon does not exist in the store.
    #[error("icon '{0}' not found")]
    NotFound(String),

    /// File-system failure reading or writing the icon store or output directory.
    #[error("storage failure while {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Font rebuild attempted with zero icons in the store.
    #[error("icon store is empty, nothing to compile")]
    EmptySource,

    /// Sprite serialization or glyph compilation failed; wraps the underlying cause.
    #[error("bundle build failed: {0}")]
    Build(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PipelineError {
    pub fn storage(context: impl Into<String>, source: io::Error) -> Self {
        PipelineError::Storage {
            context: context.into(),
            source,
        }
    }

    pub fn build(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        PipelineError::Build(cause.into())
    }

    /// Suggested HTTP-equivalent severity for transport adapters.
    pub fn http_status(&self) -> u16 {
        match self {
            PipelineError::Validation(_) | PipelineError::EmptySource => 400,
            PipelineError::NotFound(_) => 404,
            PipelineError::Storage { .. } | PipelineError::Build(_) => 500,
        }
    }

    /// Message safe to show verbatim to end users.
    ///
    /// Internal failures are reduced to a generic message; operators get the
    /// full detail from the error log.
    pub fn public_message(&self) -> String {
        match self {
            PipelineError::Storage { .. } | PipelineError::Build(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}
