/// Crate-wide result type for content-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed content-store errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The declared content type is not in the allow-list.
    #[error("unsupported content type: {content_type}")]
    UnsupportedType { content_type: String },

    /// The bytes do not look like the declared content type.
    #[error("content does not match declared type {declared}")]
    TypeMismatch { declared: String },

    /// Rejected payloads: empty or over the size cap.
    #[error("{message}")]
    InvalidContent { message: String },

    /// A reference that could escape the store directory or is malformed.
    #[error("invalid content reference: {reference}")]
    InvalidReference { reference: String },

    /// No stored content under this reference.
    #[error("no such content: {reference}")]
    NotFound { reference: String },

    /// Filesystem failure.
    #[error("content store io: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    #[must_use]
    pub fn unsupported_type(content_type: impl std::fmt::Display) -> Self {
        Self::UnsupportedType {
            content_type: content_type.to_string(),
        }
    }

    #[must_use]
    pub fn type_mismatch(declared: impl std::fmt::Display) -> Self {
        Self::TypeMismatch {
            declared: declared.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_content(message: impl std::fmt::Display) -> Self {
        Self::InvalidContent {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_reference(reference: impl std::fmt::Display) -> Self {
        Self::InvalidReference {
            reference: reference.to_string(),
        }
    }

    #[must_use]
    pub fn not_found(reference: impl std::fmt::Display) -> Self {
        Self::NotFound {
            reference: reference.to_string(),
        }
    }

    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error is the caller's fault (rejected input) rather than
    /// a store failure.
    #[must_use]
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType { .. }
                | Self::TypeMismatch { .. }
                | Self::InvalidContent { .. }
                | Self::InvalidReference { .. }
        )
    }
}
