use std::{fmt, sync::Arc};

use crate::PaddockError;

/// What a view sees of one query.
#[derive(Debug)]
pub struct FetchState<T> {
    pub data: Option<Arc<T>>,
    /// While true, `data` and `error` still describe the last completed fetch.
    pub loading: bool,
    pub error: Option<FetchFailure>,
}

impl<T> Clone for FetchState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    pub(crate) fn success(data: T) -> Self {
        Self {
            data: Some(Arc::new(data)),
            loading: false,
            error: None,
        }
    }

    pub(crate) fn failure(error: &PaddockError) -> Self {
        Self {
            data: None,
            loading: false,
            error: Some(FetchFailure::from(error)),
        }
    }

    pub fn is_success(&self) -> bool {
        !self.loading && self.error.is_none() && self.data.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The server answered with a failure status.
    Http { status: u16 },
    /// The request never got an answer.
    Transport,
    /// The answer could not be decoded.
    Decode,
    Other,
}

/// Display-ready description of a failed fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
    pub kind: FailureKind,
}

impl From<&PaddockError> for FetchFailure {
    fn from(error: &PaddockError) -> Self {
        let kind = match error {
            PaddockError::HttpStatus { status, .. } => FailureKind::Http { status: *status },
            PaddockError::Transport { .. } => FailureKind::Transport,
            PaddockError::Decode { .. } => FailureKind::Decode,
            _ => FailureKind::Other,
        };
        Self {
            message: error.to_string(),
            kind,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_loading_without_data() {
        let state = FetchState::<u32>::default();
        assert!(state.loading);
        assert!(state.data.is_none());
        assert!(state.error.is_none());
        assert!(!state.is_success());
    }

    #[test]
    fn test_failure_keeps_http_status() {
        let state = FetchState::<u32>::failure(&PaddockError::HttpStatus {
            url: "u".to_string(),
            status: 503,
        });
        let failure = state.error.unwrap();
        assert_eq!(failure.kind, FailureKind::Http { status: 503 });
        assert_eq!(failure.to_string(), "HTTP error! status: 503");
        assert!(state.data.is_none());
        assert!(!state.loading);
    }
}
