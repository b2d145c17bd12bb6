use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeZone};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{AuthScheme, JiraConfig};
use crate::error::{JiraError, Result};
use crate::models::{CurrentUser, Issue, SearchPage, Worklog, WorklogPage};
use crate::throttle::Throttle;

/// Timestamp layout Jira expects in worklog `started` fields.
const STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Fields requested with every issue search. Keeps responses small.
const ISSUE_SUMMARY_FIELDS: &str = "summary,status";

#[derive(Clone)]
pub struct JiraClient {
    http: HttpClient,
    config: JiraConfig,
    throttle: Throttle,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        let throttle = Throttle::new(config.cooldown);
        Ok(Self {
            http,
            config,
            throttle,
        })
    }

    pub fn new_with_throttle(config: JiraConfig, throttle: Throttle) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self {
            http,
            config,
            throttle,
        })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.get_with_query(path, None).await
    }

    async fn get_with_query<T>(&self, path: &str, query: Option<&[(&str, String)]>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.throttle.wait().await;
        let mut request = self.http.get(self.url_for(path));
        if let Some(params) = query {
            request = request.query(params);
        }
        let response = request.send().await?;
        Self::parse_json(response).await
    }

    async fn send_expect_success<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.throttle.wait().await;
        let mut request = self.http.request(method, self.url_for(path));
        if let Some(payload) = body {
            request = request.json(payload);
        }
        let response = request.send().await?;
        Self::ensure_success(response).await
    }

    fn url_for(&self, path: &str) -> String {
        let mut base = self.config.api_root();
        base.push_str(path.trim_start_matches('/'));
        base
    }

    async fn parse_json<T>(response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            response.json::<T>().await.map_err(JiraError::from)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            Err(JiraError::Authentication(format!(
                "Access denied ({}) - {}",
                status, body
            )))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(build_http_error(status, &body))
        }
    }

    async fn ensure_success(response: Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            Err(JiraError::Authentication(format!(
                "Access denied ({}) - {}",
                status, body
            )))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(build_http_error(status, &body))
        }
    }

    /// Profile of the authenticated user.
    pub async fn get_myself(&self) -> Result<CurrentUser> {
        self.get("myself").await
    }

    /// Issues matching a JQL query, up to `max_results`.
    pub async fn search_issues(&self, jql: &str, max_results: u32) -> Result<Vec<Issue>> {
        debug!(jql, max_results, "searching issues");
        let params = [
            ("jql", jql.to_string()),
            ("maxResults", max_results.to_string()),
            ("fields", ISSUE_SUMMARY_FIELDS.to_string()),
        ];
        let page: SearchPage = self.get_with_query("search", Some(&params)).await?;
        debug!(total = page.total, returned = page.issues.len(), "search finished");
        Ok(page.issues)
    }

    /// All worklog entries recorded on an issue.
    pub async fn get_issue_worklogs(&self, issue_key: &str) -> Result<Vec<Worklog>> {
        let path = format!("issue/{}/worklog", issue_key);
        let page: WorklogPage = self.get(&path).await?;
        Ok(page.worklogs)
    }

    /// Creates a worklog entry on an issue.
    pub async fn add_worklog(
        &self,
        issue_key: &str,
        started: &str,
        seconds: u64,
        comment: Option<&str>,
    ) -> Result<()> {
        debug!(issue_key, seconds, "adding worklog");
        let path = format!("issue/{}/worklog", issue_key);
        let payload = WorklogCreateRequest {
            started,
            time_spent_seconds: seconds,
            comment,
        };
        self.send_expect_success(Method::POST, &path, Some(&payload))
            .await
    }
}

/// Formats a timestamp the way Jira worklog `started` fields expect it.
pub fn format_started<Tz>(when: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    when.format(STARTED_FORMAT).to_string()
}

fn build_http_client(config: &JiraConfig) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    let credential = match config.auth_scheme {
        AuthScheme::Basic => {
            let raw = format!("{}:{}", config.username, config.secret);
            format!("Basic {}", BASE64_STANDARD.encode(raw))
        }
        AuthScheme::Bearer => format!("Bearer {}", config.secret),
    };
    let mut auth_value = header_value(credential)?;
    auth_value.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth_value);
    headers.insert(USER_AGENT, header_value(config.user_agent.clone())?);

    HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|err| JiraError::Other(err.to_string()))
}

fn header_value(value: String) -> Result<HeaderValue> {
    HeaderValue::from_str(&value).map_err(|err| JiraError::Other(err.to_string()))
}

fn build_http_error(status: StatusCode, body: &str) -> JiraError {
    let messages = extract_error_messages(body);
    let message = if messages.is_empty() {
        body.to_string()
    } else {
        messages.join("; ")
    };
    JiraError::http(status, messages, message)
}

/// Pulls human-readable messages out of a Jira error body, which carries an
/// `errorMessages` array and an `errors` object keyed by field name.
fn extract_error_messages(body: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };

    let mut messages = Vec::new();
    if let Some(items) = value.get("errorMessages").and_then(Value::as_array) {
        for item in items {
            if let Some(text) = item.as_str() {
                messages.push(text.to_string());
            }
        }
    }
    if let Some(fields) = value.get("errors").and_then(Value::as_object) {
        for (field, detail) in fields {
            if let Some(text) = detail.as_str() {
                messages.push(format!("{}: {}", field, text));
            }
        }
    }
    messages
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorklogCreateRequest<'a> {
    started: &'a str,
    time_spent_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}
