//! HTTP client for the Jira REST API (v2).
//!
//! Authenticates with basic auth: the account e-mail or user name plus an API
//! token as the password. Settings come from `config::AppConfig`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{
    CreateIssuePayload, IssueRef, IssueSummary, IssueType, SearchOptions, TrackerClient,
    TrackerError, TrackerField, TrackerProject, TrackerUser,
};

const API_PREFIX: &str = "/rest/api/2";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for Jira.
#[derive(Debug, Clone)]
pub struct JiraClient {
    base_url: String,
    username: String,
    api_token: String,
    timeout: Duration,
    client: Client,
}

impl JiraClient {
    /// Create with explicit configuration. A base URL without a scheme is
    /// treated as https.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: normalize_base_url(&base_url.into()),
            username: username.into(),
            api_token: api_token.into(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an authenticated API request.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}{}", self.base_url, API_PREFIX, path);
        self.client
            .request(method, &url)
            .basic_auth(&self.username, Some(&self.api_token))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, TrackerError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                TrackerError::Timeout(self.timeout)
            } else {
                TrackerError::Http(e)
            }
        })
    }

    /// Handle response, converting HTTP errors to TrackerError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, TrackerError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_for_status(status, response.text().await.unwrap_or_default()))
        }
    }

    /// Handle response that may return empty body (201/204).
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), TrackerError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(error_for_status(status, response.text().await.unwrap_or_default()))
        }
    }

    // ============================================================
    // Connection and discovery
    // ============================================================

    /// The authenticated user. Used to check credentials.
    pub async fn current_user(&self) -> Result<TrackerUser, TrackerError> {
        let response = self.send(self.request(reqwest::Method::GET, "/myself")).await?;
        self.handle_response(response).await
    }

    pub async fn list_projects(&self) -> Result<Vec<TrackerProject>, TrackerError> {
        let response = self.send(self.request(reqwest::Method::GET, "/project")).await?;
        self.handle_response(response).await
    }

    /// Every issue type on the site, not just one project's.
    pub async fn list_issue_types(&self) -> Result<Vec<IssueType>, TrackerError> {
        let response = self
            .send(self.request(reqwest::Method::GET, "/issuetype"))
            .await?;
        self.handle_response(response).await
    }

    pub async fn list_fields(&self) -> Result<Vec<TrackerField>, TrackerError> {
        let response = self.send(self.request(reqwest::Method::GET, "/field")).await?;
        self.handle_response(response).await
    }
}

#[derive(Deserialize)]
struct ProjectIssueTypes {
    #[serde(rename = "issueTypes", default)]
    issue_types: Vec<IssueType>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    id: String,
    key: String,
    #[serde(default)]
    fields: Value,
}

#[async_trait]
impl TrackerClient for JiraClient {
    async fn get_project_issue_types(
        &self,
        project_key: &str,
    ) -> Result<Vec<IssueType>, TrackerError> {
        let response = self
            .send(self.request(reqwest::Method::GET, &format!("/project/{}", project_key)))
            .await?;
        let project: ProjectIssueTypes = self.handle_response(response).await?;
        Ok(project.issue_types)
    }

    async fn create_issue(&self, payload: &CreateIssuePayload) -> Result<IssueRef, TrackerError> {
        let response = self
            .send(
                self.request(reqwest::Method::POST, "/issue")
                    .json(&json!({ "fields": payload.fields() })),
            )
            .await?;
        self.handle_response(response).await
    }

    async fn update_issue(
        &self,
        key: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), TrackerError> {
        let response = self
            .send(
                self.request(reqwest::Method::PUT, &format!("/issue/{}", key))
                    .json(&json!({ "fields": fields })),
            )
            .await?;
        self.handle_empty_response(response).await
    }

    async fn link_issues(
        &self,
        inward_key: &str,
        outward_key: &str,
        link_type: &str,
    ) -> Result<(), TrackerError> {
        let response = self
            .send(self.request(reqwest::Method::POST, "/issueLink").json(&json!({
                "type": { "name": link_type },
                "inwardIssue": { "key": inward_key },
                "outwardIssue": { "key": outward_key }
            })))
            .await?;
        self.handle_empty_response(response).await
    }

    async fn search_issues(
        &self,
        jql: &str,
        options: &SearchOptions,
    ) -> Result<Vec<IssueSummary>, TrackerError> {
        let response = self
            .send(self.request(reqwest::Method::POST, "/search").json(&json!({
                "jql": jql,
                "maxResults": options.max_results,
                "fields": options.fields
            })))
            .await?;
        let result: SearchResponse = self.handle_response(response).await?;

        Ok(result
            .issues
            .into_iter()
            .map(|hit| IssueSummary {
                summary: hit.fields["summary"].as_str().unwrap_or_default().to_string(),
                issue_type: hit.fields["issuetype"]["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                id: hit.id,
                key: hit.key,
            })
            .collect())
    }

    fn issue_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.base_url, key)
    }
}

fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

fn error_for_status(status: StatusCode, body: String) -> TrackerError {
    let message = jira_error_message(&body);
    match status {
        StatusCode::UNAUTHORIZED => TrackerError::Unauthorized,
        StatusCode::NOT_FOUND => TrackerError::NotFound(message),
        StatusCode::BAD_REQUEST => TrackerError::BadRequest(message),
        _ => TrackerError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Flatten Jira's `{"errorMessages": [...], "errors": {field: msg}}` body into
/// one line. Falls back to the raw body.
fn jira_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    let mut parts: Vec<String> = value["errorMessages"]
        .as_array()
        .map(|messages| {
            messages
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if let Some(errors) = value["errors"].as_object() {
        parts.extend(
            errors
                .iter()
                .map(|(field, msg)| format!("{}: {}", field, msg.as_str().unwrap_or_default())),
        );
    }

    if parts.is_empty() {
        body.trim().to_string()
    } else {
        parts.join("; ")
    }
}
