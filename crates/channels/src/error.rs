use std::error::Error as StdError;

/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed channel errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input payload or parameter is invalid.
    #[error("invalid channel input: {message}")]
    InvalidInput { message: String },

    /// A requested channel id does not exist.
    #[error("unknown channel: {channel_id}")]
    UnknownChannel { channel_id: String },

    /// A referenced subject id does not exist in the directory.
    #[error("unknown subject: {subject_id}")]
    UnknownSubject { subject_id: String },

    /// Wrapped source error from storage or the content store.
    #[error("channel operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unknown_channel(channel_id: impl std::fmt::Display) -> Self {
        Self::UnknownChannel {
            channel_id: channel_id.to_string(),
        }
    }

    #[must_use]
    pub fn unknown_subject(subject_id: impl std::fmt::Display) -> Self {
        Self::UnknownSubject {
            subject_id: subject_id.to_string(),
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

impl From<wheelhouse_media::Error> for Error {
    /// Content rejections surface as invalid input; store failures stay
    /// internal.
    fn from(e: wheelhouse_media::Error) -> Self {
        if e.is_rejected_input() {
            Self::invalid_input(e)
        } else {
            Self::external("content store", e)
        }
    }
}
