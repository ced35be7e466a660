//! Issue tracker access.
//!
//! The core only talks to [`TrackerClient`]; [`JiraClient`] is the Jira REST
//! implementation used by the CLI and the HTTP API.

mod client;
mod resolve;
mod types;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use client::{JiraClient, DEFAULT_TIMEOUT};
pub use resolve::*;
pub use types::*;

/// Tracker errors.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unauthorized: check the Jira username and API token")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Tracker error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl TrackerError {
    /// HTTP status behind the error, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Unauthorized => Some(401),
            Self::NotFound(_) => Some(404),
            Self::BadRequest(_) => Some(400),
            Self::Api { status, .. } => Some(*status),
            Self::Timeout(_) => None,
        }
    }
}

/// The operations the issue-creation core needs from a tracker.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Issue types available in a project.
    async fn get_project_issue_types(&self, project_key: &str)
        -> Result<Vec<IssueType>, TrackerError>;

    async fn create_issue(&self, payload: &CreateIssuePayload) -> Result<IssueRef, TrackerError>;

    async fn update_issue(&self, key: &str, fields: &Map<String, Value>)
        -> Result<(), TrackerError>;

    /// Create a non-hierarchical link between two issues.
    async fn link_issues(
        &self,
        inward_key: &str,
        outward_key: &str,
        link_type: &str,
    ) -> Result<(), TrackerError>;

    async fn search_issues(
        &self,
        jql: &str,
        options: &SearchOptions,
    ) -> Result<Vec<IssueSummary>, TrackerError>;

    /// Browser URL for an issue key.
    fn issue_url(&self, key: &str) -> String;
}
