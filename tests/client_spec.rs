//! HTTP client tests against mock GitHub and model servers.

use ai_labeler::context::Evidence;
use ai_labeler::decision::{decide, prompts, OpenAiModel};
use ai_labeler::github::{
    ClientError, CreateLabelInput, GitHubClient, ItemSource, LabelSource, Repository,
};
use ai_labeler::models::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repo() -> Repository {
    Repository::new("octo", "widgets")
}

async fn github(server: &MockServer) -> GitHubClient {
    GitHubClient::new(server.uri(), Some("test-token".to_string()))
        .expect("Failed to create client")
}

mod github_client {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn lists_labels_with_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/widgets/labels"))
            .and(header("Authorization", "Bearer test-token"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "bug", "description": "Something isn't working"},
                {"name": "question", "description": null},
                {"name": "wontfix", "description": ""}
            ])))
            .mount(&server)
            .await;

        let labels = github(&server).await.list_labels(&repo()).await.unwrap();

        assert_eq!(
            labels,
            vec![
                Label::new("bug").with_description("Something isn't working"),
                Label::new("question"),
                Label::new("wontfix"),
            ]
        );
    }

    #[tokio::test]
    async fn fetches_an_issue() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/widgets/issues/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "number": 7,
                "title": "Crash",
                "body": null,
                "user": {"login": "octocat"},
                "labels": []
            })))
            .mount(&server)
            .await;

        let item = github(&server).await.fetch_item(&repo(), 7).await.unwrap();

        assert_eq!(
            item,
            Item::Issue {
                number: 7,
                title: "Crash".to_string(),
                body: String::new(),
                author: "octocat".to_string(),
                linked_items: vec![],
            }
        );
    }

    #[tokio::test]
    async fn fetches_a_pull_request_with_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/widgets/issues/8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "number": 8,
                "title": "Bump pytest",
                "body": "Routine update",
                "user": {"login": "dependabot"},
                "labels": [],
                "pull_request": {"url": "https://api.github.com/repos/octo/widgets/pulls/8"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/widgets/pulls/8/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"filename": "requirements.txt", "patch": "-pytest==7.3\n+pytest==7.4"},
                {"filename": "logo.png"}
            ])))
            .mount(&server)
            .await;

        let item = github(&server).await.fetch_item(&repo(), 8).await.unwrap();

        let Item::PullRequest { files, author, .. } = item else {
            panic!("expected a pull request");
        };
        assert_eq!(author, "dependabot");
        assert_eq!(files["requirements.txt"], "-pytest==7.3\n+pytest==7.4");
        assert_eq!(files["logo.png"], "");
    }

    #[tokio::test]
    async fn fetches_a_linked_item_summary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/widgets/issues/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "number": 3,
                "title": "Original report",
                "body": "details",
                "labels": [{"name": "bug"}],
                "pull_request": {}
            })))
            .mount(&server)
            .await;

        let linked = github(&server)
            .await
            .fetch_linked_item(&repo(), 3)
            .await
            .unwrap();

        assert_eq!(linked.labels, vec!["bug"]);
        assert_eq!(linked.kind, ItemKind::PullRequest);
    }

    #[tokio::test]
    async fn creates_a_label() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/widgets/labels"))
            .and(body_json(json!({
                "name": "security",
                "description": "Security fixes",
                "color": "ededed"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        github(&server)
            .await
            .create_label(
                &repo(),
                &CreateLabelInput {
                    name: "security".to_string(),
                    description: "Security fixes".to_string(),
                    color: "ededed".to_string(),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reports_existing_label_as_already_exists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/widgets/labels"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Validation Failed",
                "errors": [{"resource": "Label", "code": "already_exists", "field": "name"}]
            })))
            .mount(&server)
            .await;

        let err = github(&server)
            .await
            .create_label(
                &repo(),
                &CreateLabelInput {
                    name: "bug".to_string(),
                    description: String::new(),
                    color: "ededed".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn adds_labels_in_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/widgets/issues/7/labels"))
            .and(body_json(json!({"labels": ["bug", "docs"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        github(&server)
            .await
            .add_labels(&repo(), 7, &["bug".to_string(), "docs".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn maps_missing_item_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/widgets/issues/404"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let err = github(&server)
            .await
            .fetch_item(&repo(), 404)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::NotFound(_)));
    }
}

mod openai_model {
    use super::*;
    use pretty_assertions::assert_eq;

    fn evidence() -> Evidence {
        Evidence::new(
            Item::Issue {
                number: 1,
                title: "Crash".to_string(),
                body: "Steps: 1. run".to_string(),
                author: "octocat".to_string(),
                linked_items: vec![],
            },
            vec![Label::new("bug"), Label::new("question")],
        )
    }

    #[tokio::test]
    async fn sends_schema_constrained_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer fake-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "{\"labels\": [{\"name\": \"bug\", \"reasoning\": \"has steps\"}]}"
                    }
                }]
            })))
            .mount(&server)
            .await;

        let model = OpenAiModel::new(Some("fake-key".to_string()), "openai/gpt-4o-mini")
            .with_base_url(server.uri());

        let decision = decide(&model, &evidence()).await.unwrap();
        assert_eq!(decision.labels, vec!["bug"]);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], prompts::SCHEMA_NAME);
        assert_eq!(
            body["response_format"]["json_schema"]["schema"]["properties"]["labels"]["items"]
                ["properties"]["name"]["enum"],
            json!(["bug", "question"])
        );
    }

    #[tokio::test]
    async fn api_error_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit reached", "type": "requests"}
            })))
            .mount(&server)
            .await;

        let model =
            OpenAiModel::new(Some("fake-key".to_string()), "gpt-4o").with_base_url(server.uri());

        let err = decide(&model, &evidence()).await.unwrap_err();
        assert!(err.to_string().contains("Rate limit reached"));
    }

    #[tokio::test]
    async fn refusal_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": null, "refusal": "I can't help with that"}}]
            })))
            .mount(&server)
            .await;

        let model =
            OpenAiModel::new(Some("fake-key".to_string()), "gpt-4o").with_base_url(server.uri());

        assert!(decide(&model, &evidence()).await.is_err());
    }
}
