use std::time::Duration;

pub const DEFAULT_API_VERSION: &str = "2";
pub const DEFAULT_USER_AGENT: &str = "jira-autolog";
pub const DEFAULT_COOLDOWN_MS: u64 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// How credentials are presented to the server. Jira Server/DC instances
/// commonly take `Basic user:token`, personal access tokens go as `Bearer`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthScheme {
    Basic,
    Bearer,
}

#[derive(Clone, Debug)]
pub struct JiraConfig {
    pub base_url: String,
    pub api_version: String,
    pub username: String,
    pub secret: String,
    pub user_agent: String,
    pub cooldown: Duration,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub auth_scheme: AuthScheme,
}

impl JiraConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            username: username.into(),
            secret: secret.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            auth_scheme: AuthScheme::Basic,
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn with_cooldown(mut self, duration: Duration) -> Self {
        self.cooldown = duration;
        self
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    pub fn with_connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    pub fn with_auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = scheme;
        self
    }

    pub fn api_root(&self) -> String {
        format!(
            "{}/rest/api/{}/",
            self.base_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::JiraConfig;

    #[test]
    fn api_root_normalizes_slashes() {
        let config = JiraConfig::new("https://jira.example.com/", "user", "secret");
        assert_eq!(config.api_root(), "https://jira.example.com/rest/api/2/");
    }

    #[test]
    fn api_root_honors_version_override() {
        let config =
            JiraConfig::new("https://jira.example.com", "user", "secret").with_api_version("latest");
        assert_eq!(
            config.api_root(),
            "https://jira.example.com/rest/api/latest/"
        );
    }
}
