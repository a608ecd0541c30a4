use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),
}

impl Error {
    /// True for failures that callers may retry later without changing the request.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Fetch(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_and_fetch_failures_are_transient() {
        assert!(Error::Storage("pool closed".into()).is_transient());
        assert!(Error::Fetch("timed out".into()).is_transient());
        assert!(!Error::Validation("event_type is required".into()).is_transient());
        assert!(!Error::Config("bad offset".into()).is_transient());
    }
}
