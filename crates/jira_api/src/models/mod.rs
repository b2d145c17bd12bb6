mod issue;
mod search;
mod user;
mod worklog;

pub use issue::{Issue, IssueFields, IssueStatus};
pub use search::SearchPage;
pub use user::CurrentUser;
pub use worklog::{Worklog, WorklogAuthor, WorklogPage};
