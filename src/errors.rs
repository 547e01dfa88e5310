// Error types for paddock

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PaddockError {
    // Errors for the remote data client
    #[snafu(display("Network error while requesting {url}: {source}"))]
    Transport { url: String, source: reqwest::Error },
    #[snafu(display("HTTP error! status: {status}"))]
    HttpStatus { url: String, status: u16 },
    #[snafu(display("Could not decode response from {url}: {source}"))]
    Decode {
        url: String,
        source: serde_json::Error,
    },
    #[snafu(display("Could not create HTTP client"))]
    ClientBuild { source: reqwest::Error },

    // Errors for the fetch lifecycle controller
    #[snafu(display("Request was cancelled"))]
    Cancelled,
    #[snafu(display("No async runtime available to run fetches"))]
    NoRuntime,
    #[snafu(display("{message}"))]
    FetchFailed { message: String },

    // Errors for the CLI output and JSON lines export
    #[snafu(display("Error writing export file"))]
    WriterError { source: io::Error },
    #[snafu(display("Error serializing output"))]
    OutputSerializeError { source: serde_json::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },
}

impl PaddockError {
    /// Cancellation is a supersession signal, never something to show a user.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PaddockError::Cancelled)
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            PaddockError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message_carries_code() {
        let err = PaddockError::HttpStatus {
            url: "https://example.test/2024/races".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP error! status: 404");
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_cancellation());
    }

    #[test]
    fn test_cancelled_is_cancellation() {
        assert!(PaddockError::Cancelled.is_cancellation());
        assert_eq!(PaddockError::Cancelled.status(), None);
    }
}
