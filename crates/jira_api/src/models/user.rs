//! User model returned by the Jira identity endpoint.

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub name: Option<String>,
    pub key: Option<String>,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
    pub active: Option<bool>,
}

impl CurrentUser {
    /// Login identifier, preferring `name` over the legacy `key`.
    pub fn login(&self) -> Option<&str> {
        self.name.as_deref().or(self.key.as_deref())
    }
}
