use std::collections::BTreeMap;
use std::time::Duration;

use gherkin_jira::tracker::{
    CreateIssuePayload, JiraClient, ParentLink, SearchOptions, TrackerClient, TrackerError,
};
use serde_json::{json, Map, Value};
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> JiraClient {
    JiraClient::new(server.uri(), "qa@example.com", "secret", Duration::from_secs(5))
        .expect("Failed to build client")
}

fn story_payload() -> CreateIssuePayload {
    CreateIssuePayload {
        project_key: "TEST".to_string(),
        issue_type_id: "10001".to_string(),
        summary: "Valid password".to_string(),
        description: Some("*Scenario:*  Valid password".to_string()),
        parent: Some(ParentLink::Parent {
            key: "TEST-2".to_string(),
        }),
        custom_fields: BTreeMap::from([(
            "customfield_10500".to_string(),
            Value::String("copy".to_string()),
        )]),
    }
}

mod issues {
    use super::*;

    #[tokio::test]
    async fn create_issue_posts_fields_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue"))
            .and(header_regex("authorization", "^Basic "))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "10042",
                "key": "TEST-3",
                "self": "https://jira.test/rest/api/2/issue/10042"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let issue = client_for(&server)
            .create_issue(&story_payload())
            .await
            .expect("create failed");
        assert_eq!(issue.key, "TEST-3");
        assert_eq!(issue.id, "10042");

        let request = &server.received_requests().await.expect("recording disabled")[0];
        let body = request.body_json::<Value>().expect("body is not json");
        assert_eq!(
            body["fields"],
            json!({
                "project": { "key": "TEST" },
                "issuetype": { "id": "10001" },
                "summary": "Valid password",
                "description": "*Scenario:*  Valid password",
                "parent": { "key": "TEST-2" },
                "customfield_10500": "copy"
            })
        );
    }

    #[tokio::test]
    async fn rejected_create_carries_jira_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errorMessages": [],
                "errors": { "customfield_10500": "Field cannot be set" }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_issue(&story_payload())
            .await
            .expect_err("create should fail");
        match err {
            TrackerError::BadRequest(message) => {
                assert_eq!(message, "customfield_10500: Field cannot be set")
            }
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_issue_puts_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rest/api/2/issue/TEST-3"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut fields = Map::new();
        fields.insert("customfield_11201".into(), Value::String("Login".into()));
        client_for(&server)
            .update_issue("TEST-3", &fields)
            .await
            .expect("update failed");

        let request = &server.received_requests().await.expect("recording disabled")[0];
        let body = request.body_json::<Value>().expect("body is not json");
        assert_eq!(body, json!({ "fields": { "customfield_11201": "Login" } }));
    }

    #[tokio::test]
    async fn link_issues_names_both_ends() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issueLink"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .link_issues("TEST-3", "TEST-2", "Relates")
            .await
            .expect("link failed");

        let request = &server.received_requests().await.expect("recording disabled")[0];
        let body = request.body_json::<Value>().expect("body is not json");
        assert_eq!(body["type"]["name"], "Relates");
        assert_eq!(body["inwardIssue"]["key"], "TEST-3");
        assert_eq!(body["outwardIssue"]["key"], "TEST-2");
    }

    #[tokio::test]
    async fn issue_url_points_at_the_browse_page() {
        let client = JiraClient::new("acme.atlassian.net/", "u", "t", Duration::from_secs(1))
            .expect("Failed to build client");
        assert_eq!(client.issue_url("TEST-1"), "https://acme.atlassian.net/browse/TEST-1");
    }
}

mod discovery {
    use super::*;

    #[tokio::test]
    async fn project_issue_types_come_from_the_project() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/project/TEST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "TEST",
                "issueTypes": [
                    { "id": "10000", "name": "Epic", "subtask": false },
                    { "id": "10003", "name": "Sub-task", "subtask": true }
                ]
            })))
            .mount(&server)
            .await;

        let types = client_for(&server)
            .get_project_issue_types("TEST")
            .await
            .expect("lookup failed");
        assert_eq!(types.len(), 2);
        assert!(types[1].subtask);
    }

    #[tokio::test]
    async fn search_flattens_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 1,
                "issues": [{
                    "id": "10100",
                    "key": "TEST-7",
                    "fields": { "summary": "Q3 goals", "issuetype": { "name": "Initiative" } }
                }]
            })))
            .mount(&server)
            .await;

        let hits = client_for(&server)
            .search_issues("project = TEST", &SearchOptions::default())
            .await
            .expect("search failed");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "TEST-7");
        assert_eq!(hits[0].summary, "Q3 goals");
        assert_eq!(hits[0].issue_type, "Initiative");
    }

    #[tokio::test]
    async fn current_user_checks_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/myself"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accountId": "5b10a2844c20165700ede21g",
                "displayName": "QA Bot",
                "emailAddress": "qa@example.com"
            })))
            .mount(&server)
            .await;

        let user = client_for(&server).current_user().await.expect("lookup failed");
        assert_eq!(user.display_name, "QA Bot");
        assert_eq!(user.account_id.as_deref(), Some("5b10a2844c20165700ede21g"));
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/myself"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server).current_user().await.expect_err("should fail");
        assert!(matches!(err, TrackerError::Unauthorized));
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/project"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri(), "u", "t", Duration::from_millis(100))
            .expect("Failed to build client");
        let err = client.list_projects().await.expect_err("should time out");
        assert!(matches!(err, TrackerError::Timeout(_)));
    }
}
