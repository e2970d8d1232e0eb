use super::{project_endpoint, require};
use crate::{client::GitLabClient, error::Result, models::Reference};
use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

pub const DEFAULT_REF: &str = "HEAD";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateBranchParams {
    #[schemars(description = "Project ID or URL-encoded path")]
    pub project_id: String,
    #[schemars(description = "Name for the new branch")]
    pub branch: String,
    #[serde(rename = "ref")]
    #[schemars(description = "Source branch/commit for new branch")]
    pub source_ref: Option<String>,
}

#[derive(Serialize)]
struct NewBranch<'a> {
    branch: &'a str,
    #[serde(rename = "ref")]
    source_ref: &'a str,
}

/// Creates `branch` from `ref`, or from `HEAD` when no ref is given.
pub async fn create_branch(client: &GitLabClient, params: CreateBranchParams) -> Result<Reference> {
    require(&params.project_id, "Project ID is required")?;
    require(&params.branch, "Branch name is required")?;

    let source_ref = match params.source_ref.as_deref() {
        None | Some("") => DEFAULT_REF,
        Some(source_ref) => {
            require(source_ref, "Source reference is required")?;
            source_ref
        }
    };

    let endpoint = project_endpoint(&params.project_id, "/repository/branches");
    let body = NewBranch {
        branch: params.branch.trim(),
        source_ref,
    };
    client.post(&endpoint, Some(&body)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::testing::{assert_no_requests, test_client},
        error::GitLabError,
    };
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    fn params(branch: &str, source_ref: Option<&str>) -> CreateBranchParams {
        CreateBranchParams {
            project_id: "my-group/my-project".to_string(),
            branch: branch.to_string(),
            source_ref: source_ref.map(str::to_string),
        }
    }

    fn branch_response(name: &str) -> serde_json::Value {
        json!({
            "name": name,
            "commit": {"id": "abc123", "web_url": "https://gitlab.com/c/abc123"},
            "protected": false
        })
    }

    #[test]
    fn test_params_accept_ref_key() {
        let params: CreateBranchParams = serde_json::from_value(json!({
            "project_id": "1",
            "branch": "feature",
            "ref": "main"
        }))
        .unwrap();
        assert_eq!(params.source_ref.as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn test_create_branch_from_ref() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v4/projects/my-group%2Fmy-project/repository/branches"))
            .and(body_json(json!({"branch": "feature", "ref": "main"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(branch_response("feature")))
            .expect(1)
            .mount(&server)
            .await;

        let branch = create_branch(&test_client(&server), params("feature", Some("main")))
            .await
            .unwrap();
        assert_eq!(branch.name, "feature");
        assert_eq!(branch.commit.id, "abc123");
        assert_eq!(branch.extra["protected"], false);
    }

    #[tokio::test]
    async fn test_create_branch_defaults_to_head() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({"branch": "feature", "ref": "HEAD"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(branch_response("feature")))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server);
        create_branch(&client, params("feature", None)).await.unwrap();
        create_branch(&client, params("feature", Some(""))).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_branch_validation() {
        let server = MockServer::start().await;
        let client = test_client(&server);

        let mut missing_project = params("feature", None);
        missing_project.project_id = "".to_string();
        let err = create_branch(&client, missing_project).await.unwrap_err();
        assert_eq!(err.to_string(), "Project ID is required");

        let err = create_branch(&client, params("  ", None)).await.unwrap_err();
        assert_eq!(err.to_string(), "Branch name is required");

        let err = create_branch(&client, params("feature", Some("   ")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Source reference is required");

        assert_no_requests(&server).await;
    }

    #[tokio::test]
    async fn test_create_branch_surfaces_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "Branch already exists"})),
            )
            .mount(&server)
            .await;

        let err = create_branch(&test_client(&server), params("main", None))
            .await
            .unwrap_err();
        assert!(matches!(err, GitLabError::Api { .. }));
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(
            err.to_string(),
            "GitLab API error: 400 Bad Request: Branch already exists"
        );
    }

    #[tokio::test]
    async fn test_create_branch_rejects_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"name": "feature"})))
            .mount(&server)
            .await;

        let err = create_branch(&test_client(&server), params("feature", None))
            .await
            .unwrap_err();
        assert!(matches!(err, GitLabError::Parse { .. }));
    }
}
