use serde::Deserialize;

/// Issue as returned by search and detail endpoints. Only the fields the
/// autolog flow reads are modelled; everything else is ignored.
#[derive(Debug, Deserialize, Clone)]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IssueFields {
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IssueStatus {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Issue {
    /// Status name when the server sent one.
    pub fn status_name(&self) -> Option<&str> {
        self.fields
            .status
            .as_ref()
            .and_then(|status| status.name.as_deref())
    }
}
