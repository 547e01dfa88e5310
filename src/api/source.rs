use std::{future::Future, time::Duration};

use log::{debug, warn};
use reqwest::StatusCode;
use serde_json::Value;
use snafu::ResultExt;

use crate::errors::{ClientBuildSnafu, DecodeSnafu, HttpStatusSnafu, PaddockError, TransportSnafu};

/// User agent string for API requests.
const USER_AGENT_VALUE: &str = concat!("paddock/", env!("CARGO_PKG_VERSION"));

/// Anything that can answer a GET with a JSON body.
pub trait JsonSource: Send + Sync + 'static {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value, PaddockError>> + Send;
}

/// reqwest-backed source talking to the real upstream API.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// `timeout` of `None` lets a request pend until it completes or is
    /// superseded.
    pub fn new(timeout: Option<Duration>) -> Result<Self, PaddockError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT_VALUE);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context(ClientBuildSnafu)?;
        Ok(Self { client })
    }
}

impl JsonSource for HttpSource {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value, PaddockError>> + Send {
        let request = self.client.get(url);
        let url = url.to_string();
        async move {
            debug!("GET {}", url);
            let response = request.send().await.context(TransportSnafu { url: &url })?;
            check_status(&url, response.status())?;
            let body = response
                .bytes()
                .await
                .context(TransportSnafu { url: &url })?;
            serde_json::from_slice(&body).context(DecodeSnafu { url })
        }
    }
}

/// Fails with the status code when the server did not answer with success.
pub fn check_status(url: &str, status: StatusCode) -> Result<(), PaddockError> {
    if status.is_success() {
        return Ok(());
    }
    warn!("{} answered with status {}", url, status);
    HttpStatusSnafu {
        url,
        status: status.as_u16(),
    }
    .fail()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status_passes() {
        assert!(check_status("u", StatusCode::OK).is_ok());
        assert!(check_status("u", StatusCode::NO_CONTENT).is_ok());
    }

    #[test]
    fn test_failure_status_carries_code() {
        for code in [StatusCode::NOT_FOUND, StatusCode::INTERNAL_SERVER_ERROR] {
            let err = check_status("u", code).unwrap_err();
            assert_eq!(err.status(), Some(code.as_u16()));
        }
    }

    #[test]
    fn test_client_builds_with_and_without_timeout() {
        assert!(HttpSource::new(None).is_ok());
        assert!(HttpSource::new(Some(Duration::from_secs(5))).is_ok());
    }
}
