//! In-memory tracker shared by the integration specs.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use gherkin_jira::tracker::{
    CreateIssuePayload, IssueRef, IssueSummary, IssueType, SearchOptions, TrackerClient,
    TrackerError,
};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

pub const PROJECT: &str = "TEST";

pub const LOGIN_FEATURE: &str = "Feature: Login\n  Scenario: Valid password\n    Given a user\n    When they log in\n    Then access is granted";

pub fn issue_type(id: &str, name: &str, subtask: bool) -> IssueType {
    IssueType {
        id: id.to_string(),
        name: name.to_string(),
        subtask,
        description: None,
    }
}

pub fn standard_issue_types() -> Vec<IssueType> {
    vec![
        issue_type("1", "Initiative", false),
        issue_type("2", "Epic", false),
        issue_type("3", "Feature", false),
        issue_type("4", "Story", false),
        issue_type("5", "Sub-task", true),
        issue_type("6", "Task", false),
    ]
}

/// Records every call and fails on demand.
pub struct FakeTracker {
    pub issue_types: Vec<IssueType>,
    pub created: Mutex<Vec<CreateIssuePayload>>,
    pub updates: Mutex<Vec<(String, Map<String, Value>)>>,
    pub links: Mutex<Vec<(String, String, String)>>,
    pub searches: Mutex<Vec<String>>,
    fail_summaries: HashSet<String>,
    slow_summaries: HashSet<String>,
    slow_for: Duration,
    fail_updates: bool,
    fail_links: bool,
    fail_first_search: bool,
    search_results: Vec<IssueSummary>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::with_types(standard_issue_types())
    }

    pub fn with_types(issue_types: Vec<IssueType>) -> Self {
        Self {
            issue_types,
            created: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            links: Mutex::new(Vec::new()),
            searches: Mutex::new(Vec::new()),
            fail_summaries: HashSet::new(),
            slow_summaries: HashSet::new(),
            slow_for: Duration::from_millis(500),
            fail_updates: false,
            fail_links: false,
            fail_first_search: false,
            search_results: Vec::new(),
            cancel_after: None,
        }
    }

    /// Reject create calls for issues with this summary.
    pub fn failing_on(mut self, summary: &str) -> Self {
        self.fail_summaries.insert(summary.to_string());
        self
    }

    /// Delay create calls for issues with this summary.
    pub fn slow_on(mut self, summary: &str) -> Self {
        self.slow_summaries.insert(summary.to_string());
        self
    }

    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn failing_links(mut self) -> Self {
        self.fail_links = true;
        self
    }

    pub fn failing_first_search(mut self) -> Self {
        self.fail_first_search = true;
        self
    }

    pub fn with_search_results(mut self, results: Vec<IssueSummary>) -> Self {
        self.search_results = results;
        self
    }

    /// Fire `token` once `count` issues have been created.
    pub fn cancelling_after(mut self, count: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((count, token));
        self
    }

    pub fn created(&self) -> Vec<CreateIssuePayload> {
        self.created.lock().unwrap().clone()
    }

    pub fn created_summaries(&self) -> Vec<String> {
        self.created().into_iter().map(|p| p.summary).collect()
    }
}

#[async_trait]
impl TrackerClient for FakeTracker {
    async fn get_project_issue_types(
        &self,
        _project_key: &str,
    ) -> Result<Vec<IssueType>, TrackerError> {
        Ok(self.issue_types.clone())
    }

    async fn create_issue(&self, payload: &CreateIssuePayload) -> Result<IssueRef, TrackerError> {
        if self.slow_summaries.contains(&payload.summary) {
            tokio::time::sleep(self.slow_for).await;
        }
        if self.fail_summaries.contains(&payload.summary) {
            return Err(TrackerError::BadRequest(format!(
                "cannot create {}",
                payload.summary
            )));
        }

        let mut created = self.created.lock().unwrap();
        created.push(payload.clone());
        let n = created.len();
        if let Some((count, token)) = &self.cancel_after {
            if n >= *count {
                token.cancel();
            }
        }
        Ok(IssueRef {
            id: (10000 + n).to_string(),
            key: format!("{}-{}", PROJECT, n),
        })
    }

    async fn update_issue(
        &self,
        key: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), TrackerError> {
        if self.fail_updates {
            return Err(TrackerError::Api {
                status: 500,
                message: "field update failed".to_string(),
            });
        }
        self.updates
            .lock()
            .unwrap()
            .push((key.to_string(), fields.clone()));
        Ok(())
    }

    async fn link_issues(
        &self,
        inward_key: &str,
        outward_key: &str,
        link_type: &str,
    ) -> Result<(), TrackerError> {
        if self.fail_links {
            return Err(TrackerError::NotFound(format!("link type {}", link_type)));
        }
        self.links.lock().unwrap().push((
            inward_key.to_string(),
            outward_key.to_string(),
            link_type.to_string(),
        ));
        Ok(())
    }

    async fn search_issues(
        &self,
        jql: &str,
        _options: &SearchOptions,
    ) -> Result<Vec<IssueSummary>, TrackerError> {
        let mut searches = self.searches.lock().unwrap();
        searches.push(jql.to_string());
        if self.fail_first_search && searches.len() == 1 {
            return Err(TrackerError::BadRequest(
                "The value 'Initiative' does not exist for the field 'issuetype'.".to_string(),
            ));
        }
        Ok(self.search_results.clone())
    }

    fn issue_url(&self, key: &str) -> String {
        format!("https://jira.test/browse/{}", key)
    }
}
