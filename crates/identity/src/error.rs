use std::error::Error as StdError;

/// Crate-wide result type for identity operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed identity errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller could not be authenticated (bad credentials, bad token,
    /// expired token, deactivated account).
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// A referenced subject id does not exist in the directory.
    #[error("unknown subject: {subject_id}")]
    UnknownSubject { subject_id: String },

    /// Registration attempted with an email that is already taken.
    #[error("email already registered: {email}")]
    EmailTaken { email: String },

    /// Input payload or parameter is invalid.
    #[error("invalid subject input: {message}")]
    InvalidInput { message: String },

    /// Wrapped source error from storage or a crypto primitive.
    #[error("identity operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn unauthorized(message: impl std::fmt::Display) -> Self {
        Self::Unauthorized {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unknown_subject(subject_id: impl std::fmt::Display) -> Self {
        Self::UnknownSubject {
            subject_id: subject_id.to_string(),
        }
    }

    #[must_use]
    pub fn email_taken(email: impl std::fmt::Display) -> Self {
        Self::EmailTaken {
            email: email.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a storage-layer failure.
    #[must_use]
    pub fn store(context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::External {
            context: context.into(),
            source: source.into(),
        }
    }
}
