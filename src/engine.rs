//! Sequential autolog procedure and its progress reporting.
//!
//! The engine walks the working dates of a range in order. For each date it
//! reads the seconds already logged, computes the deficit against the daily
//! target, ranks candidate tasks and creates worklogs until the deficit is
//! covered. It is designed to run as a spawned task; progress reaches the
//! caller as [`Event`] messages over an unbounded channel.

use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use log::debug;
use tokio::sync::mpsc::UnboundedSender;

use jira_api::{format_started, JiraClient, JiraError};

use crate::calendar::work_dates;
use crate::duration;
use crate::planner::{allocate, RankedTasks};
use crate::settings::Settings;

/// Issue search page size, large enough that paging never matters here.
const MAX_SEARCH_RESULTS: u32 = 1000;

/// Progress messages marshalled from the engine task to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Info(String),
    Warn(String),
    Error(String),
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub dates_processed: usize,
    pub worklogs_created: usize,
    pub seconds_logged: u64,
    pub failures: usize,
}

struct Reporter {
    events: UnboundedSender<Event>,
}

impl Reporter {
    fn info(&self, message: impl Into<String>) {
        let _ = self.events.send(Event::Info(message.into()));
    }

    fn warn(&self, message: impl Into<String>) {
        let _ = self.events.send(Event::Warn(message.into()));
    }

    fn error(&self, message: impl Into<String>) {
        let _ = self.events.send(Event::Error(message.into()));
    }
}

pub struct AutologEngine {
    client: JiraClient,
    settings: Settings,
    reporter: Reporter,
    dry_run: bool,
}

impl AutologEngine {
    pub fn new(client: JiraClient, settings: Settings, events: UnboundedSender<Event>) -> Self {
        Self {
            client,
            settings,
            reporter: Reporter { events },
            dry_run: false,
        }
    }

    /// In dry-run mode allocations are reported but no worklog is created.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Processes every working date in the inclusive range. Per-date tracker
    /// failures are reported and counted; the run continues with the next
    /// date unless authentication itself is rejected.
    pub async fn run(&self, from: NaiveDate, to: NaiveDate) -> RunSummary {
        let mut summary = RunSummary::default();

        match self.client.get_myself().await {
            Ok(user) => {
                let login = user.login().unwrap_or(&self.settings.jira_user).to_string();
                self.reporter
                    .info(format!("Connected to {} as {}", self.settings.jira_host, login));
            }
            Err(err) => {
                self.reporter.error(format!("Connection check failed: {err}"));
                summary.failures += 1;
                return summary;
            }
        }

        let dates = work_dates(from, to, &self.settings.work_days);
        if dates.is_empty() {
            self.reporter
                .warn(format!("No working dates between {from} and {to}"));
            return summary;
        }
        self.reporter.info(format!(
            "Autologging started: {} working date(s) between {from} and {to}",
            dates.len()
        ));

        for date in dates {
            match self.process_date(date, &mut summary).await {
                Ok(()) => summary.dates_processed += 1,
                Err(err) => {
                    summary.failures += 1;
                    self.reporter.error(format!("{date}: {err}"));
                    if matches!(err, JiraError::Authentication(_)) {
                        self.reporter.error("Authentication rejected, aborting the run");
                        break;
                    }
                }
            }
        }

        summary
    }

    async fn process_date(
        &self,
        date: NaiveDate,
        summary: &mut RunSummary,
    ) -> jira_api::Result<()> {
        let target = self.settings.target_seconds();
        let logged = self.logged_seconds_for_date(date).await?;
        if logged >= target {
            self.reporter.info(format!(
                "{date}: {} already logged",
                duration::format_seconds(logged)
            ));
            return Ok(());
        }

        let deficit = target - logged;
        debug!("{date}: {logged}s logged, {deficit}s missing");

        let tasks = self.ranked_tasks_for_date(date).await?;
        if tasks.is_empty() {
            self.reporter.warn(format!(
                "{date}: no candidate tasks for the remaining {}",
                duration::format_seconds(deficit)
            ));
            return Ok(());
        }

        let plan = allocate(deficit, &tasks);
        if plan.shortfall > 0 {
            self.reporter.warn(format!(
                "{date}: {} cannot be placed, no in-progress or review issues",
                duration::format_seconds(plan.shortfall)
            ));
        }

        if self.dry_run {
            for entry in &plan.entries {
                self.reporter.info(format!(
                    "{date}: would log {} on {}",
                    duration::format_seconds(entry.seconds),
                    entry.issue_key
                ));
            }
            return Ok(());
        }

        let started = self.started_timestamp(date);
        for entry in &plan.entries {
            self.client
                .add_worklog(&entry.issue_key, &started, entry.seconds, None)
                .await?;
            summary.worklogs_created += 1;
            summary.seconds_logged += entry.seconds;
            self.reporter.info(format!(
                "{date}: logged {} on {}",
                duration::format_seconds(entry.seconds),
                entry.issue_key
            ));
        }

        // Re-read and report, mirroring what ended up on the server.
        let now_logged = self.logged_seconds_for_date(date).await?;
        if now_logged == target {
            self.reporter.info(format!(
                "{date}: work log completed with {} as required",
                duration::format_seconds(target)
            ));
        } else if now_logged < target {
            self.reporter.warn(format!(
                "{date}: work log still requires {}",
                duration::format_seconds(target - now_logged)
            ));
        } else {
            self.reporter.warn(format!(
                "{date}: work log overlogged by {}",
                duration::format_seconds(now_logged - target)
            ));
        }
        Ok(())
    }

    /// Seconds the configured user already logged on the date, summed over
    /// every issue that carries one of their worklogs for that day.
    async fn logged_seconds_for_date(&self, date: NaiveDate) -> jira_api::Result<u64> {
        let date_key = date.format("%Y-%m-%d").to_string();
        let jql = format!("worklogAuthor = currentUser() AND worklogDate = \"{date_key}\"");
        let issues = self.client.search_issues(&jql, MAX_SEARCH_RESULTS).await?;

        let mut total = 0u64;
        for issue in issues {
            let worklogs = self.client.get_issue_worklogs(&issue.key).await?;
            for worklog in worklogs {
                if worklog.started_date() != Some(date_key.as_str()) {
                    continue;
                }
                let by_user = worklog
                    .author
                    .as_ref()
                    .is_some_and(|author| author.matches_login(&self.settings.jira_user));
                if !by_user {
                    continue;
                }
                total += worklog.time_spent_seconds.unwrap_or(0);
            }
        }
        Ok(total)
    }

    async fn ranked_tasks_for_date(&self, date: NaiveDate) -> jira_api::Result<RankedTasks> {
        let workday_hours = self.settings.workday_hours();
        let mut high = Vec::new();
        for task in &self.settings.daily_tasks {
            match duration::parse_seconds(&task.time, workday_hours) {
                Some(seconds) => high.push((task.key.clone(), seconds)),
                None => self.reporter.warn(format!(
                    "Skipping daily task {} with invalid time {:?}",
                    task.key, task.time
                )),
            }
        }

        let medium = self
            .issues_with_status_on(&self.settings.in_progress_statuses, date)
            .await?;
        let low = self
            .issues_with_status_on(&self.settings.review_statuses, date)
            .await?;

        Ok(RankedTasks::new(high, medium, low))
    }

    async fn issues_with_status_on(
        &self,
        statuses: &[String],
        date: NaiveDate,
    ) -> jira_api::Result<Vec<String>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let jql = status_was_on_jql(statuses, date);
        let issues = self.client.search_issues(&jql, MAX_SEARCH_RESULTS).await?;
        Ok(issues.into_iter().map(|issue| issue.key).collect())
    }

    /// Worklog start timestamp: the configured start-of-day time on the date,
    /// in the local timezone.
    fn started_timestamp(&self, date: NaiveDate) -> String {
        let time = self.settings.start_time().unwrap_or(NaiveTime::MIN);
        let naive = date.and_time(time);
        match Local.from_local_datetime(&naive).earliest() {
            Some(local) => format_started(&local),
            // Start-of-day falls into a DST gap; log in UTC instead.
            None => format_started(&naive.and_utc()),
        }
    }
}

/// JQL for issues assigned to the current user whose status was one of the
/// given names on the date.
fn status_was_on_jql(statuses: &[String], date: NaiveDate) -> String {
    let date_key = date.format("%Y-%m-%d");
    let filter = if statuses.len() == 1 {
        format!("Status was \"{}\"", statuses[0])
    } else {
        let quoted = statuses
            .iter()
            .map(|status| format!("\"{status}\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Status was IN ({quoted})")
    };
    format!("assignee = currentUser() AND {filter} ON \"{date_key}\"")
}
