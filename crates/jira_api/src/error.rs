//! Error model used by Jira API client operations.

use std::io;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JiraError>;

/// Represents failure modes of Jira REST calls: HTTP errors carrying the
/// server's `errorMessages`, authentication rejections, timeouts, transport
/// failures and payload decode problems.
#[derive(Debug, Error)]
pub enum JiraError {
    #[error("http {status}: {message}")]
    Http {
        status: StatusCode,
        messages: Vec<String>,
        message: String,
    },
    #[error("authentication error: {0}")]
    Authentication(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected error: {0}")]
    Other(String),
}

impl JiraError {
    /// Constructs an HTTP error variant with the messages Jira reported.
    pub fn http(status: StatusCode, messages: Vec<String>, message: impl Into<String>) -> Self {
        JiraError::Http {
            status,
            messages,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for JiraError {
    /// Converts reqwest errors into semantic JiraError variants.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            JiraError::Timeout(err.to_string())
        } else if err.is_status() {
            let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            JiraError::Http {
                status,
                messages: Vec::new(),
                message: err.to_string(),
            }
        } else if err.is_connect() {
            JiraError::Network(err.to_string())
        } else {
            JiraError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for JiraError {
    fn from(err: serde_json::Error) -> Self {
        JiraError::Serialization(err.to_string())
    }
}
