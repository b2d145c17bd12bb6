use serde::Deserialize;

/// Envelope of `GET issue/{key}/worklog`.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorklogPage {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub worklogs: Vec<Worklog>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Worklog {
    pub id: Option<String>,
    pub author: Option<WorklogAuthor>,
    pub started: Option<String>,
    pub time_spent_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorklogAuthor {
    pub name: Option<String>,
    pub key: Option<String>,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
}

impl Worklog {
    /// Calendar date (`YYYY-MM-DD`) the entry was started on, taken from the
    /// date part of the `started` timestamp.
    pub fn started_date(&self) -> Option<&str> {
        self.started
            .as_deref()
            .and_then(|value| value.split('T').next())
            .filter(|value| !value.is_empty())
    }
}

impl WorklogAuthor {
    /// True when any of the author identifiers equals the given login.
    pub fn matches_login(&self, login: &str) -> bool {
        [
            self.name.as_deref(),
            self.key.as_deref(),
            self.email_address.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|value| value.eq_ignore_ascii_case(login))
    }
}
