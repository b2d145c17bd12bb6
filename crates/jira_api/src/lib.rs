//! Typed Jira REST API client crate used by the autolog engine.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod throttle;

pub use client::{format_started, JiraClient};
pub use config::{AuthScheme, JiraConfig};
pub use error::{JiraError, Result};
pub use models::{
    CurrentUser, Issue, IssueFields, IssueStatus, SearchPage, Worklog, WorklogAuthor, WorklogPage,
};
