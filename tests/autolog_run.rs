//! End-to-end engine runs against a mocked Jira server.

use std::time::Duration;

use chrono::NaiveDate;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;

use jira_api::{JiraClient, JiraConfig};
use jira_autolog::engine::{AutologEngine, Event, RunSummary};
use jira_autolog::settings::{DailyTask, Settings};

const DATE: &str = "2026-08-03"; // a Monday

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 3).expect("valid date")
}

fn settings(server: &ServerGuard) -> Settings {
    Settings {
        jira_host: server.url(),
        jira_user: "jdoe".to_string(),
        jira_pass: "hunter2".to_string(),
        ..Settings::default()
    }
}

fn client(server: &ServerGuard) -> JiraClient {
    let config = JiraConfig::new(server.url(), "jdoe", "hunter2")
        .with_cooldown(Duration::ZERO);
    JiraClient::new(config).expect("client should build")
}

async fn mock_myself(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/rest/api/2/myself")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name": "jdoe", "displayName": "John Doe"}"#)
        .create_async()
        .await
}

async fn mock_search_hits(
    server: &mut ServerGuard,
    jql: &str,
    issues: serde_json::Value,
    hits: usize,
) -> Mock {
    server
        .mock("GET", "/rest/api/2/search")
        .match_query(Matcher::UrlEncoded("jql".into(), jql.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"startAt": 0, "maxResults": 1000, "issues": issues}).to_string())
        .expect(hits)
        .create_async()
        .await
}

async fn mock_search(server: &mut ServerGuard, jql: &str, issues: serde_json::Value) -> Mock {
    mock_search_hits(server, jql, issues, 1).await
}

async fn mock_worklog_post_hits(
    server: &mut ServerGuard,
    issue_key: &str,
    seconds: u64,
    hits: usize,
) -> Mock {
    server
        .mock("POST", format!("/rest/api/2/issue/{issue_key}/worklog").as_str())
        .match_body(Matcher::PartialJson(json!({"timeSpentSeconds": seconds})))
        .with_status(201)
        .with_body("{}")
        .expect(hits)
        .create_async()
        .await
}

async fn mock_worklog_post(server: &mut ServerGuard, issue_key: &str, seconds: u64) -> Mock {
    mock_worklog_post_hits(server, issue_key, seconds, 1).await
}

fn worklog_author_jql() -> String {
    format!("worklogAuthor = currentUser() AND worklogDate = \"{DATE}\"")
}

fn status_jql(status: &str) -> String {
    format!("assignee = currentUser() AND Status was \"{status}\" ON \"{DATE}\"")
}

async fn run_engine(server: &ServerGuard, settings: Settings, dry_run: bool) -> (RunSummary, Vec<Event>) {
    let (events, receiver) = mpsc::unbounded_channel();
    let engine = AutologEngine::new(client(server), settings, events).dry_run(dry_run);
    let summary = engine.run(date(), date()).await;
    (summary, drain(receiver))
}

fn drain(mut receiver: UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

fn infos(events: &[Event]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Info(message) => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn fills_a_single_working_day_across_all_buckets() {
    let mut server = mockito::Server::new_async().await;

    let _myself = mock_myself(&mut server).await;
    // No prior worklogs; checked before and after the allocation.
    let logged_search = mock_search_hits(&mut server, &worklog_author_jql(), json!([]), 2).await;
    let _medium = mock_search(
        &mut server,
        &status_jql("In Progress"),
        json!([
            {"key": "PROJ-1", "fields": {"summary": "First"}},
            {"key": "PROJ-2", "fields": {"summary": "Second"}}
        ]),
    )
    .await;
    // PROJ-2 shows up in review as well and must stay in the medium bucket.
    let _low = mock_search(
        &mut server,
        &status_jql("In Review"),
        json!([
            {"key": "PROJ-2", "fields": {"summary": "Second"}},
            {"key": "REV-1", "fields": {"summary": "Review me"}}
        ]),
    )
    .await;

    // 8h deficit: 30m daily task, 3h per in-progress issue, 1.5h leftover
    // to the first review issue.
    let daily_post = mock_worklog_post(&mut server, "OPS-1", 1800).await;
    let med_post_1 = mock_worklog_post(&mut server, "PROJ-1", 10_800).await;
    let med_post_2 = mock_worklog_post(&mut server, "PROJ-2", 10_800).await;
    let low_post = mock_worklog_post(&mut server, "REV-1", 5400).await;

    let mut settings = settings(&server);
    settings.daily_tasks = vec![DailyTask {
        key: "OPS-1".to_string(),
        time: "30m".to_string(),
    }];

    let (summary, events) = run_engine(&server, settings, false).await;

    logged_search.assert_async().await;
    daily_post.assert_async().await;
    med_post_1.assert_async().await;
    med_post_2.assert_async().await;
    low_post.assert_async().await;

    assert_eq!(summary.failures, 0);
    assert_eq!(summary.dates_processed, 1);
    assert_eq!(summary.worklogs_created, 4);
    assert_eq!(summary.seconds_logged, 28_800);

    let infos = infos(&events);
    assert!(infos.iter().any(|m| m.contains("logged 30m on OPS-1")));
    assert!(infos.iter().any(|m| m.contains("logged 3h 00m on PROJ-1")));
    assert!(infos.iter().any(|m| m.contains("logged 1h 30m on REV-1")));
}

#[tokio::test]
async fn skips_a_day_already_at_target() {
    let mut server = mockito::Server::new_async().await;

    let _myself = mock_myself(&mut server).await;
    let _logged = mock_search(
        &mut server,
        &worklog_author_jql(),
        json!([{"key": "LOG-1", "fields": {"summary": "Logged"}}]),
    )
    .await;
    // Foreign-author and wrong-date entries must not count toward the total.
    let _worklogs = server
        .mock("GET", "/rest/api/2/issue/LOG-1/worklog")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "total": 3,
                "worklogs": [
                    {"author": {"name": "jdoe"}, "started": "2026-08-03T09:00:00.000+0000", "timeSpentSeconds": 28_800},
                    {"author": {"name": "someone-else"}, "started": "2026-08-03T10:00:00.000+0000", "timeSpentSeconds": 3600},
                    {"author": {"name": "jdoe"}, "started": "2026-08-02T09:00:00.000+0000", "timeSpentSeconds": 3600}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (summary, events) = run_engine(&server, settings(&server), false).await;

    assert_eq!(summary.failures, 0);
    assert_eq!(summary.dates_processed, 1);
    assert_eq!(summary.worklogs_created, 0);
    assert!(infos(&events)
        .iter()
        .any(|m| m.contains("8h 00m already logged")));
}

#[tokio::test]
async fn dry_run_plans_without_creating_worklogs() {
    let mut server = mockito::Server::new_async().await;

    let _myself = mock_myself(&mut server).await;
    let _logged = mock_search(&mut server, &worklog_author_jql(), json!([])).await;
    let _medium = mock_search(
        &mut server,
        &status_jql("In Progress"),
        json!([{"key": "PROJ-1", "fields": {"summary": "Only task"}}]),
    )
    .await;
    let _low = mock_search(&mut server, &status_jql("In Review"), json!([])).await;
    let post = mock_worklog_post_hits(&mut server, "PROJ-1", 28_800, 0).await;

    let (summary, events) = run_engine(&server, settings(&server), true).await;

    post.assert_async().await;
    assert_eq!(summary.failures, 0);
    assert_eq!(summary.worklogs_created, 0);
    assert!(infos(&events)
        .iter()
        .any(|m| m.contains("would log 8h 00m on PROJ-1")));
}

#[tokio::test]
async fn warns_when_no_candidate_tasks_exist() {
    let mut server = mockito::Server::new_async().await;

    let _myself = mock_myself(&mut server).await;
    let _logged = mock_search(&mut server, &worklog_author_jql(), json!([])).await;
    let _medium = mock_search(&mut server, &status_jql("In Progress"), json!([])).await;
    let _low = mock_search(&mut server, &status_jql("In Review"), json!([])).await;

    let (summary, events) = run_engine(&server, settings(&server), false).await;

    assert_eq!(summary.failures, 0);
    assert_eq!(summary.worklogs_created, 0);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::Warn(message) if message.contains("no candidate tasks")
    )));
}

#[tokio::test]
async fn authentication_failure_stops_the_run() {
    let mut server = mockito::Server::new_async().await;
    let _myself = server
        .mock("GET", "/rest/api/2/myself")
        .with_status(401)
        .with_body("Unauthorized")
        .create_async()
        .await;

    let (summary, events) = run_engine(&server, settings(&server), false).await;

    assert_eq!(summary.failures, 1);
    assert_eq!(summary.dates_processed, 0);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::Error(_))));
}
